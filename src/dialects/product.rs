use crate::dialects::base::{DialectConfig, DialectError};
use std::fmt;
use std::str::FromStr;

/// Identity of a backend, fixed once detection has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseProduct {
    Generic,
    MySql,
    /// Analytic engine speaking the MySQL protocol, told apart by a probe.
    Infobright,
    PostgreSql,
    Oracle,
    Sqlite,
}

impl DatabaseProduct {
    /// Every product, in detection order. `Generic` is the catch-all and comes last.
    pub const ALL: [DatabaseProduct; 6] = [
        DatabaseProduct::MySql,
        DatabaseProduct::Infobright,
        DatabaseProduct::PostgreSql,
        DatabaseProduct::Oracle,
        DatabaseProduct::Sqlite,
        DatabaseProduct::Generic,
    ];

    /// Capability table for this product.
    pub fn config(self) -> &'static DialectConfig {
        match self {
            DatabaseProduct::Generic => crate::dialects::generic::config(),
            DatabaseProduct::MySql => crate::dialects::mysql::config(),
            DatabaseProduct::Infobright => crate::dialects::infobright::config(),
            DatabaseProduct::PostgreSql => crate::dialects::postgres::config(),
            DatabaseProduct::Oracle => crate::dialects::oracle::config(),
            DatabaseProduct::Sqlite => crate::dialects::sqlite::config(),
        }
    }

    /// Canonical lower-case name, as used in configuration files.
    pub fn name(self) -> &'static str {
        &self.config().metadata.name
    }
}

impl fmt::Display for DatabaseProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatabaseProduct {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        DatabaseProduct::ALL
            .into_iter()
            .find(|product| {
                let metadata = &product.config().metadata;
                metadata.name == wanted || metadata.aliases.iter().any(|alias| *alias == wanted)
            })
            .ok_or_else(|| DialectError::NotFound(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        for product in DatabaseProduct::ALL {
            let parsed: DatabaseProduct = product.name().parse().unwrap();
            assert_eq!(parsed, product);
        }
    }

    #[test]
    fn test_parse_aliases_case_insensitive() {
        assert_eq!("MariaDB".parse::<DatabaseProduct>().unwrap(), DatabaseProduct::MySql);
        assert_eq!("postgresql".parse::<DatabaseProduct>().unwrap(), DatabaseProduct::PostgreSql);
        assert_eq!(" PG ".parse::<DatabaseProduct>().unwrap(), DatabaseProduct::PostgreSql);
    }

    #[test]
    fn test_parse_unknown_name() {
        let result = "db2".parse::<DatabaseProduct>();
        assert!(matches!(result, Err(DialectError::NotFound(name)) if name == "db2"));
    }

    #[test]
    fn test_generic_is_last() {
        assert_eq!(DatabaseProduct::ALL.last(), Some(&DatabaseProduct::Generic));
    }
}
