//! Dialect capability detection and cardinality estimation for relational
//! backends reached over ODBC.
//!
//! ```rust,ignore
//! let source = OdbcDataSource::new(conn_str)?;
//! let dialect = detect_dialect(source.connect()?.as_mut())?;
//! let source = source.with_dialect(&dialect);
//! let chain = StatisticsChain::from_names(Arc::new(dialect), &["index-metadata", "sql-count"])?;
//! let rows = chain.table_cardinality(&source, &TableRef::new("sales"), &ExecutionContext::new())?;
//! ```

pub mod cli;
pub mod dialects;
pub mod executor;
pub mod logger;
pub mod model;
pub mod statistics;

pub use dialects::{detect_dialect, get_dialect, DatabaseProduct, Dialect, DialectError};
pub use executor::{BackendConnection, BackendError, DataSource, ExecutionContext, OdbcDataSource};
pub use statistics::{Estimate, StatisticsChain, StatisticsError, StatisticsProvider, TableRef};
