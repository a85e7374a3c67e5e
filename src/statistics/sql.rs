use crate::dialects::Dialect;
use crate::executor::{DataSource, ExecutionContext};
use crate::statistics::{Estimate, StatisticsError, StatisticsProvider, TableRef};
use log::debug;

pub const NAME: &str = "sql-count";

/// Counts rows with `COUNT` queries.
///
/// Exact but expensive, so it belongs at the end of a chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlCountStatisticsProvider;

impl SqlCountStatisticsProvider {
    /// Qualified table name, resolving the same object as the dialect's
    /// index metadata query.
    fn from_clause(dialect: &Dialect, table: &TableRef<'_>) -> String {
        let qualifier = if dialect.catalog_is_database() {
            table.catalog.or(table.schema)
        } else {
            table.schema
        };
        dialect.quote_identifier_path(&[qualifier, Some(table.table)])
    }

    pub fn table_count_sql(dialect: &Dialect, table: &TableRef<'_>) -> String {
        format!("select count(*) from {}", Self::from_clause(dialect, table))
    }

    pub fn column_count_sql(dialect: &Dialect, table: &TableRef<'_>, column: &str) -> String {
        format!(
            "select count(distinct {}) from {}",
            dialect.quote_identifier(column),
            Self::from_clause(dialect, table)
        )
    }

    /// `None` when the dialect cannot select from a derived table.
    pub fn query_count_sql(dialect: &Dialect, sql: &str) -> Option<String> {
        if !dialect.allows_derived_table_in_from() {
            return None;
        }
        let alias = if dialect.requires_alias_for_derived_table() {
            format!(" as {}", dialect.quote_identifier("init"))
        } else {
            String::new()
        };
        Some(format!("select count(*) from ({}){}", sql, alias))
    }

    fn count(
        source: &dyn DataSource,
        sql: &str,
        operation: &str,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        ctx.check().map_err(|e| StatisticsError::backend(operation, e))?;
        let mut connection = source
            .connect()
            .map_err(|e| StatisticsError::backend(operation, e))?;

        debug!("Counting with: {}", sql);
        connection
            .query_count(sql, ctx)
            .map_err(|e| StatisticsError::backend(operation, e))
    }
}

impl StatisticsProvider for SqlCountStatisticsProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn table_cardinality(
        &self,
        dialect: &Dialect,
        source: &dyn DataSource,
        table: &TableRef<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        let sql = Self::table_count_sql(dialect, table);
        let operation = format!("while counting rows of table {}", table);
        Self::count(source, &sql, &operation, ctx)
    }

    fn column_cardinality(
        &self,
        dialect: &Dialect,
        source: &dyn DataSource,
        table: &TableRef<'_>,
        column: &str,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        let sql = Self::column_count_sql(dialect, table, column);
        let operation = format!("while counting distinct values of column {}.[{}]", table, column);
        Self::count(source, &sql, &operation, ctx)
    }

    fn query_cardinality(
        &self,
        dialect: &Dialect,
        source: &dyn DataSource,
        sql: &str,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        let Some(count_sql) = Self::query_count_sql(dialect, sql) else {
            debug!("{} cannot select from a derived table", dialect.product());
            return Ok(None);
        };
        let operation = format!("while counting rows of query [{}]", sql);
        Self::count(source, &count_sql, &operation, ctx)
    }
}
