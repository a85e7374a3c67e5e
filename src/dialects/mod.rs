//! Database dialect system
//!
//! Each product's capability flags live in a TOML table under its own module;
//! detection maps a live connection onto one of them and resolves the
//! version-gated flags into an immutable [`Dialect`].

pub mod base;
pub mod dialect;
pub mod inline;
pub mod product;
pub mod registry;
pub mod version;

// Capability tables
pub mod generic;
pub mod infobright;
pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod sqlite;

// Re-export main types
pub use base::{Capability, DialectConfig, DialectError, FeatureConfig, InlineTableStrategy};
pub use dialect::{Dialect, DialectReport};
pub use inline::ColumnType;
pub use product::DatabaseProduct;
pub use registry::{get_registry, DialectRegistry};

use crate::executor::BackendConnection;

/// Detect the dialect of a live connection.
pub fn detect_dialect(connection: &mut dyn BackendConnection) -> Result<Dialect, DialectError> {
    get_registry().detect(connection)
}

/// Build a dialect by name without a connection.
pub fn get_dialect(name: &str, version: &str) -> Result<Dialect, DialectError> {
    let product = get_registry()
        .get(name)
        .ok_or_else(|| DialectError::NotFound(name.to_string()))?;
    Ok(Dialect::new(product, version, None))
}

/// List all available dialect names
pub fn list_dialects() -> Vec<String> {
    get_registry().list_dialects()
}
