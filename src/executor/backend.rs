//! Contract between this crate and a live database connection.
//!
//! Everything the dialect detector and the statistics providers need from a
//! backend goes through [`DataSource`] and [`BackendConnection`]. The ODBC
//! implementation lives in [`crate::executor::connection`]; tests plug in an
//! in-memory fake.
//!
//! Resources follow ownership: an [`IndexInfoCursor`] borrows its
//! connection, which borrows its data source, so they are released in reverse
//! acquisition order on every exit path.

use crate::executor::context::ExecutionContext;
use crate::statistics::TableRef;
use odbc_api::Error as OdbcError;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("ODBC error: {0}")]
    Odbc(#[from] OdbcError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Kind reported for an index metadata row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Pseudo-row whose cardinality is the table's row count.
    TableStatistic,
    Clustered,
    Hashed,
    Other,
}

impl IndexKind {
    /// Maps the numeric `TYPE` column of ODBC/JDBC index metadata.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => IndexKind::TableStatistic,
            1 => IndexKind::Clustered,
            2 => IndexKind::Hashed,
            _ => IndexKind::Other,
        }
    }
}

/// One row of index metadata for a table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfoRow {
    pub index_name: Option<String>,
    pub column_name: Option<String>,
    pub kind: IndexKind,
    pub non_unique: bool,
    pub cardinality: i64,
}

impl IndexInfoRow {
    pub fn table_statistic(cardinality: i64) -> Self {
        Self {
            index_name: None,
            column_name: None,
            kind: IndexKind::TableStatistic,
            non_unique: false,
            cardinality,
        }
    }

    pub fn index(name: &str, column: &str, non_unique: bool, cardinality: i64) -> Self {
        Self {
            index_name: Some(name.to_string()),
            column_name: Some(column.to_string()),
            kind: IndexKind::Other,
            non_unique,
            cardinality,
        }
    }
}

/// Forward-only cursor over index metadata rows.
pub trait IndexInfoCursor {
    fn next_row(&mut self) -> Result<Option<IndexInfoRow>, BackendError>;
}

/// Hands out connections. Dropping the returned box gives the connection back.
pub trait DataSource: Send + Sync {
    fn connect(&self) -> Result<Box<dyn BackendConnection + '_>, BackendError>;
}

/// A live connection. Not thread-safe; callers serialize use of one connection.
pub trait BackendConnection {
    /// Product name as reported by the driver.
    fn product_name(&mut self) -> Result<String, BackendError>;

    /// Product version string as reported by the backend.
    fn product_version(&mut self) -> Result<String, BackendError>;

    /// Identifier quote string reported by the driver. `None` when the driver
    /// does not report one.
    fn identifier_quote(&mut self) -> Result<Option<String>, BackendError>;

    /// Index metadata for a table.
    fn index_info<'c>(
        &'c mut self,
        table: &TableRef<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Box<dyn IndexInfoCursor + 'c>, BackendError>;

    /// Run a query returning a single integer. `None` when the query produced
    /// no row or a NULL value.
    fn query_count(&mut self, sql: &str, ctx: &ExecutionContext) -> Result<Option<u64>, BackendError>;

    /// Run a query and report whether it produced at least one row.
    fn probe(&mut self, sql: &str) -> Result<bool, BackendError>;
}

/// Cursor over rows already materialized in memory.
pub struct BufferedIndexCursor {
    rows: std::vec::IntoIter<IndexInfoRow>,
}

impl BufferedIndexCursor {
    pub fn new(rows: Vec<IndexInfoRow>) -> Self {
        Self { rows: rows.into_iter() }
    }
}

impl IndexInfoCursor for BufferedIndexCursor {
    fn next_row(&mut self) -> Result<Option<IndexInfoRow>, BackendError> {
        Ok(self.rows.next())
    }
}
