//! Cardinality estimation.
//!
//! A [`StatisticsProvider`] is one stateless estimation strategy. Providers
//! answer `Ok(None)` when they have no estimate, which is a normal outcome and
//! lets a [`StatisticsChain`] fall through to the next provider. Only backend
//! failures and cancellation are errors.

pub mod chain;
pub mod metadata;
pub mod sql;

pub use chain::StatisticsChain;
pub use metadata::IndexMetadataStatisticsProvider;
pub use sql::SqlCountStatisticsProvider;

use crate::dialects::Dialect;
use crate::executor::{BackendError, DataSource, ExecutionContext};
use std::fmt;
use std::sync::Arc;

/// Estimated row or distinct-value count; `None` means no estimate.
pub type Estimate = Option<u64>;

/// Integer form of an unknown estimate, for callers that want a plain number.
pub const UNKNOWN_CARDINALITY: i64 = -1;

pub fn to_sentinel(estimate: Estimate) -> i64 {
    match estimate {
        Some(n) => i64::try_from(n).unwrap_or(i64::MAX),
        None => UNKNOWN_CARDINALITY,
    }
}

/// A table, optionally qualified by catalog and schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef<'a> {
    pub catalog: Option<&'a str>,
    pub schema: Option<&'a str>,
    pub table: &'a str,
}

impl<'a> TableRef<'a> {
    pub fn new(table: &'a str) -> Self {
        Self {
            catalog: None,
            schema: None,
            table,
        }
    }

    pub fn qualified(catalog: Option<&'a str>, schema: Option<&'a str>, table: &'a str) -> Self {
        Self { catalog, schema, table }
    }
}

impl fmt::Display for TableRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [self.catalog, self.schema, Some(self.table)]
            .into_iter()
            .flatten()
            .collect();
        write!(f, "[{}]", parts.join("."))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatisticsError {
    #[error("Error {operation}: {source}")]
    Backend {
        operation: String,
        #[source]
        source: BackendError,
    },

    #[error("Statistics request cancelled")]
    Cancelled,

    #[error("Unknown statistics provider: {0}")]
    UnknownProvider(String),
}

impl StatisticsError {
    /// Wrap a backend failure with the operation in progress. Cancellation
    /// keeps its own variant so callers never mistake it for a failure.
    pub fn backend(operation: impl Into<String>, source: BackendError) -> Self {
        match source {
            BackendError::Cancelled => StatisticsError::Cancelled,
            source => StatisticsError::Backend {
                operation: operation.into(),
                source,
            },
        }
    }
}

/// One cardinality estimation strategy. Implementations hold no per-call
/// state and never cache.
pub trait StatisticsProvider: Send + Sync {
    /// Name used in configuration files.
    fn name(&self) -> &str;

    fn table_cardinality(
        &self,
        dialect: &Dialect,
        source: &dyn DataSource,
        table: &TableRef<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError>;

    fn column_cardinality(
        &self,
        dialect: &Dialect,
        source: &dyn DataSource,
        table: &TableRef<'_>,
        column: &str,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError>;

    fn query_cardinality(
        &self,
        dialect: &Dialect,
        source: &dyn DataSource,
        sql: &str,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError>;
}

/// Built-in provider by configuration name.
pub fn provider_by_name(name: &str) -> Result<Arc<dyn StatisticsProvider>, StatisticsError> {
    match name.trim() {
        metadata::NAME => Ok(Arc::new(IndexMetadataStatisticsProvider)),
        sql::NAME => Ok(Arc::new(SqlCountStatisticsProvider)),
        other => Err(StatisticsError::UnknownProvider(other.to_string())),
    }
}
