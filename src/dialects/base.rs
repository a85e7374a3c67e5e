use crate::executor::BackendError;
use serde::{Deserialize, Serialize};

/// Capability table for one database product, loaded from its `dialect.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DialectConfig {
    pub metadata: DialectMetadata,
    #[serde(default)]
    pub detection: DetectionConfig,
    pub features: FeatureConfig,
    #[serde(default)]
    pub version_gates: Vec<VersionGate>,
    pub sql: SqlConfig,
    #[serde(default)]
    pub statistics: StatisticsSqlConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DialectMetadata {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DetectionConfig {
    /// Regexes matched against the driver-reported product name.
    #[serde(default)]
    pub product_patterns: Vec<String>,

    /// Product whose driver this engine masquerades as.
    pub family: Option<String>,

    /// Query that returns at least one row only on this engine.
    pub probe: Option<String>,

    /// The probe only runs from this version of the family onward.
    pub probe_min_version: Option<String>,
}

/// Named boolean capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    RequiresAliasForDerivedTable,
    AllowsDerivedTableInFrom,
    AllowsCompoundCountDistinct,
    SupportsMultiValueIn,
    NullsSortLast,
    RequiresOrderByAlias,
    SupportsNullsOrderingSyntax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeatureConfig {
    pub requires_alias_for_derived_table: bool,
    pub allows_derived_table_in_from: bool,
    pub allows_compound_count_distinct: bool,
    pub supports_multi_value_in: bool,
    pub nulls_sort_last: bool,
    pub requires_order_by_alias: bool,
    #[serde(default)]
    pub supports_nulls_ordering_syntax: bool,
}

impl FeatureConfig {
    pub fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::RequiresAliasForDerivedTable => self.requires_alias_for_derived_table,
            Capability::AllowsDerivedTableInFrom => self.allows_derived_table_in_from,
            Capability::AllowsCompoundCountDistinct => self.allows_compound_count_distinct,
            Capability::SupportsMultiValueIn => self.supports_multi_value_in,
            Capability::NullsSortLast => self.nulls_sort_last,
            Capability::RequiresOrderByAlias => self.requires_order_by_alias,
            Capability::SupportsNullsOrderingSyntax => self.supports_nulls_ordering_syntax,
        }
    }

    pub fn set(&mut self, capability: Capability, value: bool) {
        let slot = match capability {
            Capability::RequiresAliasForDerivedTable => &mut self.requires_alias_for_derived_table,
            Capability::AllowsDerivedTableInFrom => &mut self.allows_derived_table_in_from,
            Capability::AllowsCompoundCountDistinct => &mut self.allows_compound_count_distinct,
            Capability::SupportsMultiValueIn => &mut self.supports_multi_value_in,
            Capability::NullsSortLast => &mut self.nulls_sort_last,
            Capability::RequiresOrderByAlias => &mut self.requires_order_by_alias,
            Capability::SupportsNullsOrderingSyntax => &mut self.supports_nulls_ordering_syntax,
        };
        *slot = value;
    }
}

/// Turns a capability off for versions below `min_version`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionGate {
    pub capability: Capability,
    pub min_version: String,
}

/// How a literal-values pseudo-table is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineTableStrategy {
    /// `select .. union all select ..`
    UnionAll,
    /// Like `UnionAll`, casting every value to its column type.
    UnionAllCast,
    /// Like `UnionAll`, each branch selecting `from dual`.
    UnionAllFromDual,
    /// `select * from (values (..), (..)) as t (cols)`
    Values,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqlConfig {
    /// Quote used when the driver reports none, or reports a wrong one.
    pub quote_identifier: String,
    /// Ignore the driver's report and always use `quote_identifier`.
    #[serde(default)]
    pub force_quote: bool,
    /// Expression that is 1 for NULL and 0 otherwise; `{expr}` is substituted.
    pub null_test: String,
    pub inline_table: InlineTableStrategy,
    /// Qualify tables with the catalog, which is the database on engines
    /// without schemas. Falls back to the schema when no catalog is given.
    #[serde(default)]
    pub catalog_is_database: bool,
    #[serde(default)]
    pub literals: LiteralConfig,
}

/// Typed literal templates for inline tables. `{value}` becomes the quoted
/// string literal.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiteralConfig {
    pub true_value: String,
    pub false_value: String,
    pub date: String,
    pub time: String,
    pub timestamp: String,
}

impl Default for LiteralConfig {
    fn default() -> Self {
        Self {
            true_value: "TRUE".to_string(),
            false_value: "FALSE".to_string(),
            date: "DATE {value}".to_string(),
            time: "TIME {value}".to_string(),
            timestamp: "TIMESTAMP {value}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatisticsSqlConfig {
    /// Catalog query emulating driver index metadata. Columns, in order: type
    /// code, non-unique flag, cardinality, index name, column name.
    /// `{catalog}`, `{schema}` and `{table}` become string literals or NULL.
    pub index_info_sql: Option<String>,
}

/// Error types for dialect operations
#[derive(Debug, thiserror::Error)]
pub enum DialectError {
    #[error("Dialect not found: {0}")]
    NotFound(String),

    #[error("Error {operation}: {source}")]
    Detection {
        operation: String,
        #[source]
        source: BackendError,
    },

    #[error("Invalid inline table: {0}")]
    InvalidInlineTable(String),
}

impl DialectError {
    pub fn detection(operation: impl Into<String>, source: BackendError) -> Self {
        DialectError::Detection {
            operation: operation.into(),
            source,
        }
    }
}
