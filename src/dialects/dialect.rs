use crate::dialects::base::{DialectConfig, DialectError, FeatureConfig, InlineTableStrategy, LiteralConfig};
use crate::dialects::inline::{self, ColumnType};
use crate::dialects::product::DatabaseProduct;
use crate::dialects::version::version_at_least;
use log::debug;
use serde::Serialize;

/// Capability and syntax profile of one backend.
///
/// Built once per physical connection by [`crate::dialects::detect_dialect`]
/// and never mutated afterwards, so one instance can be shared freely across
/// threads. Every method is a pure function of that state.
#[derive(Debug, Clone)]
pub struct Dialect {
    product: DatabaseProduct,
    version: String,
    quote: String,
    features: FeatureConfig,
    config: &'static DialectConfig,
}

/// Serializable summary of a dialect.
#[derive(Debug, Clone, Serialize)]
pub struct DialectReport {
    pub product: String,
    pub description: String,
    pub version: String,
    pub quote: String,
    pub inline_table: InlineTableStrategy,
    pub features: FeatureConfig,
}

impl Dialect {
    /// Resolve the capability set for `product` at `version`.
    ///
    /// `reported_quote` is whatever the driver claims; blank values, and any
    /// value for products whose drivers misreport it, are replaced by the
    /// product's known quote.
    pub fn new(product: DatabaseProduct, version: &str, reported_quote: Option<&str>) -> Self {
        let config = product.config();

        let quote = match reported_quote.map(str::trim) {
            Some(quote) if !quote.is_empty() && !config.sql.force_quote => quote.to_string(),
            _ => {
                debug!(
                    "Using known identifier quote for {}: {}",
                    product, config.sql.quote_identifier
                );
                config.sql.quote_identifier.clone()
            }
        };

        let mut features = config.features;
        if version.trim().is_empty() {
            debug!("No version reported for {}, assuming a current release", product);
        } else {
            for gate in &config.version_gates {
                if !version_at_least(version, &gate.min_version) {
                    debug!(
                        "{} {} is below {} required for {:?}",
                        product, version, gate.min_version, gate.capability
                    );
                    features.set(gate.capability, false);
                }
            }
        }

        Self {
            product,
            version: version.to_string(),
            quote,
            features,
            config,
        }
    }

    pub fn product(&self) -> DatabaseProduct {
        self.product
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn features(&self) -> &FeatureConfig {
        &self.features
    }

    /// Template for the catalog query emulating index metadata, if any.
    pub fn index_info_sql(&self) -> Option<&'static str> {
        self.config.statistics.index_info_sql.as_deref()
    }

    pub(crate) fn literals(&self) -> &LiteralConfig {
        &self.config.sql.literals
    }

    /// Whether a table's catalog names its database.
    pub fn catalog_is_database(&self) -> bool {
        self.config.sql.catalog_is_database
    }

    /// First character of the identifier quote.
    pub fn quote_char(&self) -> char {
        self.quote.chars().next().unwrap_or('"')
    }

    pub fn quote_identifier(&self, identifier: &str) -> String {
        let escaped = identifier.replace(&self.quote, &self.quote.repeat(2));
        format!("{}{}{}", self.quote, escaped, self.quote)
    }

    /// Dot-joined quoted path, skipping absent qualifiers.
    pub fn quote_identifier_path(&self, parts: &[Option<&str>]) -> String {
        parts
            .iter()
            .flatten()
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn quote_string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    pub fn requires_alias_for_derived_table(&self) -> bool {
        self.features.requires_alias_for_derived_table
    }

    pub fn allows_derived_table_in_from(&self) -> bool {
        self.features.allows_derived_table_in_from
    }

    pub fn allows_compound_count_distinct(&self) -> bool {
        self.features.allows_compound_count_distinct
    }

    pub fn supports_multi_value_in(&self) -> bool {
        self.features.supports_multi_value_in
    }

    /// Whether NULLs sort after non-NULLs in an ascending sort by default.
    pub fn nulls_sort_last(&self) -> bool {
        self.features.nulls_sort_last
    }

    pub fn requires_order_by_alias(&self) -> bool {
        self.features.requires_order_by_alias
    }

    pub fn supports_nulls_ordering_syntax(&self) -> bool {
        self.features.supports_nulls_ordering_syntax
    }

    /// Expression that is 1 when `expr` is NULL and 0 otherwise.
    pub fn null_test(&self, expr: &str) -> String {
        self.config.sql.null_test.replace("{expr}", expr)
    }

    /// Two-key sort fragment that puts NULL values of `expr` last.
    ///
    /// The null test is left ascending, so a direction appended by the caller
    /// applies to `expr` alone and NULLs stay last either way.
    pub fn rewrite_for_nulls_last(&self, expr: &str) -> String {
        format!("{}, {}", self.null_test(expr), expr)
    }

    /// One ORDER BY item with explicit null placement.
    pub fn generate_order_item(&self, expr: &str, ascending: bool, nulls_last: bool) -> String {
        let direction = if ascending { "ASC" } else { "DESC" };

        if self.supports_nulls_ordering_syntax() {
            let placement = if nulls_last { "LAST" } else { "FIRST" };
            return format!("{} {} NULLS {}", expr, direction, placement);
        }

        // a descending sort flips where the backend puts NULLs
        let natural_nulls_last = self.nulls_sort_last() == ascending;
        if natural_nulls_last == nulls_last {
            format!("{} {}", expr, direction)
        } else if nulls_last {
            format!("{} {}", self.rewrite_for_nulls_last(expr), direction)
        } else {
            format!("{} DESC, {} {}", self.null_test(expr), expr, direction)
        }
    }

    /// Literal-values pseudo-table usable in a FROM clause.
    pub fn generate_inline_table(
        &self,
        column_names: &[&str],
        column_types: &[ColumnType],
        rows: &[Vec<Option<String>>],
    ) -> Result<String, DialectError> {
        inline::generate(self, self.config.sql.inline_table, column_names, column_types, rows)
    }

    pub fn report(&self) -> DialectReport {
        DialectReport {
            product: self.product.name().to_string(),
            description: self.config.metadata.description.clone(),
            version: self.version.clone(),
            quote: self.quote.clone(),
            inline_table: self.config.sql.inline_table,
            features: self.features,
        }
    }
}
