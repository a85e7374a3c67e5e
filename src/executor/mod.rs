pub mod backend;
pub mod connection;
pub mod context;

pub use backend::{
    BackendConnection, BackendError, BufferedIndexCursor, DataSource, IndexInfoCursor, IndexInfoRow,
    IndexKind,
};
pub use connection::{ConnectionManager, OdbcConnection, OdbcDataSource};
pub use context::ExecutionContext;
