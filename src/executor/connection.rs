use crate::dialects::{get_registry, DatabaseProduct, Dialect};
use crate::executor::backend::{
    BackendConnection, BackendError, BufferedIndexCursor, DataSource, IndexInfoCursor, IndexInfoRow,
    IndexKind,
};
use crate::executor::context::ExecutionContext;
use crate::statistics::TableRef;
use log::{debug, error, info, warn};
use odbc_api::{buffers::TextRowSet, Connection, ConnectionOptions, Cursor, Environment};
use std::sync::Arc;
use std::time::Duration;

const BATCH_SIZE: usize = 100;
const MAX_TEXT_LEN: usize = 4096;

pub struct ConnectionManager {
    environment: Arc<Environment>,
}

impl ConnectionManager {
    pub fn new() -> Result<Self, BackendError> {
        let environment = Environment::new()?;
        Ok(Self {
            environment: Arc::new(environment),
        })
    }

    pub fn connect(&self, connection_string: &str) -> Result<Connection<'_>, BackendError> {
        debug!(
            "Connecting to database with connection string length: {}",
            connection_string.len()
        );

        let connection = self
            .environment
            .connect_with_connection_string(connection_string, ConnectionOptions::default())
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                BackendError::ConnectionFailed(e.to_string())
            })?;

        info!("Successfully connected to database");
        Ok(connection)
    }
}

/// ODBC-backed [`DataSource`]. Each `connect` opens a fresh connection that is
/// closed when the returned handle is dropped.
pub struct OdbcDataSource {
    manager: ConnectionManager,
    connection_string: String,
    index_info_sql: Option<&'static str>,
}

impl OdbcDataSource {
    pub fn new(connection_string: &str) -> Result<Self, BackendError> {
        Ok(Self {
            manager: ConnectionManager::new()?,
            connection_string: connection_string.to_string(),
            index_info_sql: None,
        })
    }

    /// Use the detected dialect's catalog query for index metadata.
    pub fn with_dialect(mut self, dialect: &Dialect) -> Self {
        self.index_info_sql = dialect.index_info_sql();
        self
    }
}

impl DataSource for OdbcDataSource {
    fn connect(&self) -> Result<Box<dyn BackendConnection + '_>, BackendError> {
        let connection = self.manager.connect(&self.connection_string)?;
        Ok(Box::new(OdbcConnection {
            connection,
            index_info_sql: self.index_info_sql,
        }))
    }
}

pub struct OdbcConnection<'a> {
    connection: Connection<'a>,
    index_info_sql: Option<&'static str>,
}

impl<'a> OdbcConnection<'a> {
    pub fn new(connection: Connection<'a>) -> Self {
        Self {
            connection,
            index_info_sql: None,
        }
    }

    /// Run a query and collect its rows as text, checking for cancellation
    /// between fetched batches. The context's remaining time becomes the
    /// statement's query timeout. Dropping the cursor early closes the
    /// statement on the server.
    fn fetch_rows(
        &self,
        query: &str,
        ctx: &ExecutionContext,
        limit: Option<usize>,
    ) -> Result<Vec<Vec<Option<String>>>, BackendError> {
        ctx.check()?;
        debug!("Querying rows: {}", query);

        let mut statement = self.connection.preallocate()?;
        if let Some(remaining) = ctx.remaining() {
            let seconds = timeout_secs(remaining);
            debug!("Query timeout: {}s", seconds);
            if let Err(e) = statement.set_query_timeout_sec(seconds) {
                warn!("Driver rejected a query timeout of {}s: {}", seconds, e);
            }
        }

        let Some(mut cursor) = statement
            .execute(query, ())
            .map_err(|e| statement_error(ctx, e))?
        else {
            return Ok(Vec::new());
        };

        let batch_size = limit.map_or(BATCH_SIZE, |limit| limit.clamp(1, BATCH_SIZE));
        let mut buffer = TextRowSet::for_cursor(batch_size, &mut cursor, Some(MAX_TEXT_LEN))?;
        let mut row_set_cursor = cursor.bind_buffer(&mut buffer)?;
        let mut results = Vec::new();

        while let Some(row_set) = row_set_cursor.fetch().map_err(|e| statement_error(ctx, e))? {
            for row_index in 0..row_set.num_rows() {
                let row = (0..row_set.num_cols())
                    .map(|col_index| {
                        row_set
                            .at(col_index, row_index)
                            .map(|v| String::from_utf8_lossy(v).to_string())
                    })
                    .collect();
                results.push(row);

                if limit.is_some_and(|limit| results.len() >= limit) {
                    return Ok(results);
                }
            }
            ctx.check()?;
        }

        debug!("Query returned {} rows", results.len());
        Ok(results)
    }

    fn version_query(product: DatabaseProduct) -> Option<&'static str> {
        match product {
            DatabaseProduct::MySql | DatabaseProduct::Infobright | DatabaseProduct::PostgreSql => {
                Some("SELECT VERSION()")
            }
            DatabaseProduct::Sqlite => Some("SELECT sqlite_version()"),
            DatabaseProduct::Oracle => {
                Some("SELECT version FROM product_component_version WHERE product LIKE 'Oracle%'")
            }
            DatabaseProduct::Generic => None,
        }
    }
}

/// Whole seconds for an ODBC query timeout, rounded up. Zero would mean no
/// timeout at all.
fn timeout_secs(remaining: Duration) -> usize {
    let seconds = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    usize::try_from(seconds.max(1)).unwrap_or(usize::MAX)
}

/// A statement that fails once the context has expired was aborted by the
/// driver's query timeout.
fn statement_error(ctx: &ExecutionContext, error: impl std::fmt::Display) -> BackendError {
    if ctx.is_cancelled() {
        debug!("Statement aborted: {}", error);
        BackendError::Cancelled
    } else {
        BackendError::QueryFailed(error.to_string())
    }
}

/// Substitute `{catalog}`, `{schema}` and `{table}` with string literals, or
/// NULL for absent qualifiers.
pub fn render_index_info_sql(template: &str, table: &TableRef<'_>) -> String {
    let literal = |value: Option<&str>| match value {
        Some(value) => format!("'{}'", value.replace('\'', "''")),
        None => "NULL".to_string(),
    };
    template
        .replace("{catalog}", &literal(table.catalog))
        .replace("{schema}", &literal(table.schema))
        .replace("{table}", &literal(Some(table.table)))
}

fn parse_index_row(row: &[Option<String>]) -> IndexInfoRow {
    let text = |i: usize| row.get(i).and_then(|v| v.as_deref()).map(str::trim);
    let number = |i: usize| {
        text(i).and_then(|v| {
            v.parse::<i64>()
                .ok()
                .or_else(|| v.parse::<f64>().ok().map(|f| f as i64))
        })
    };

    IndexInfoRow {
        kind: number(0).map_or(IndexKind::Other, |code| IndexKind::from_code(code as i32)),
        non_unique: matches!(text(1), Some("1" | "t" | "true" | "TRUE")),
        cardinality: number(2).unwrap_or(-1),
        index_name: text(3).map(str::to_string),
        column_name: text(4).map(str::to_string),
    }
}

fn parse_count(value: &str) -> Result<u64, BackendError> {
    let value = value.trim();
    value
        .parse::<u64>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
        .ok_or_else(|| BackendError::QueryFailed(format!("Expected a count, got '{}'", value)))
}

impl BackendConnection for OdbcConnection<'_> {
    fn product_name(&mut self) -> Result<String, BackendError> {
        Ok(self.connection.database_management_system_name()?)
    }

    fn product_version(&mut self) -> Result<String, BackendError> {
        let product = get_registry().classify(&self.product_name()?);
        let Some(query) = Self::version_query(product) else {
            return Ok(String::new());
        };

        let rows = self.fetch_rows(query, &ExecutionContext::new(), Some(1))?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next().flatten())
            .unwrap_or_default())
    }

    fn identifier_quote(&mut self) -> Result<Option<String>, BackendError> {
        // Not surfaced through this driver layer; the dialect falls back to
        // the product's known quote.
        Ok(None)
    }

    fn index_info<'c>(
        &'c mut self,
        table: &TableRef<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Box<dyn IndexInfoCursor + 'c>, BackendError> {
        let Some(template) = self.index_info_sql else {
            debug!("No index metadata query for this backend");
            return Ok(Box::new(BufferedIndexCursor::new(Vec::new())));
        };

        let sql = render_index_info_sql(template, table);
        let rows = self
            .fetch_rows(&sql, ctx, None)?
            .iter()
            .map(|row| parse_index_row(row))
            .collect();
        Ok(Box::new(BufferedIndexCursor::new(rows)))
    }

    fn query_count(&mut self, sql: &str, ctx: &ExecutionContext) -> Result<Option<u64>, BackendError> {
        let rows = self.fetch_rows(sql, ctx, Some(1))?;
        match rows.into_iter().next().and_then(|row| row.into_iter().next().flatten()) {
            Some(value) => parse_count(&value).map(Some),
            None => Ok(None),
        }
    }

    fn probe(&mut self, sql: &str) -> Result<bool, BackendError> {
        let rows = self.fetch_rows(sql, &ExecutionContext::new(), Some(1))?;
        Ok(!rows.is_empty())
    }
}
