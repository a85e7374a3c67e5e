use crate::cli::args::{Cli, Commands, StatsTarget};
use crate::dialects::{self, ColumnType, Dialect, DialectError};
use crate::executor::{BackendError, DataSource, ExecutionContext, OdbcDataSource};
use crate::logger::setup_logger;
use crate::model::{Config, ConfigError};
use crate::statistics::{provider_by_name, Estimate, StatisticsChain, StatisticsError, TableRef};
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dialect(#[from] DialectError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Statistics(#[from] StatisticsError),

    #[error("Failed to render output: {0}")]
    Render(String),

    #[error("{0}")]
    Usage(String),
}

pub fn handle(cli: Cli) {
    let config = match Config::load(cli.config.as_deref(), cli.env.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            setup_logger(cli.verbose, "info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    setup_logger(cli.verbose, &config.logging.level);
    debug!("Loaded configuration: {:?}", config);

    let result = match cli.command {
        Commands::Detect { conn } => {
            info!("Running DETECT command");
            run_detect(conn, &config)
        }
        Commands::Stats { conn, timeout, target } => {
            info!("Running STATS command");
            run_stats(conn, timeout, target, &config)
        }
        Commands::Dialects => {
            for name in dialects::list_dialects() {
                println!("{}", name);
            }
            Ok(())
        }
        Commands::Show { dialect, version } => run_show(&dialect, &version),
        Commands::Inline {
            dialect,
            version,
            columns,
            rows,
        } => run_inline(&dialect, &version, &columns, &rows),
        Commands::Config { output } => run_config(&output, cli.env.as_deref()),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn connection_string(conn: Option<String>, config: &Config) -> Result<String, CommandError> {
    conn.or_else(|| config.database.connection_string.clone())
        .ok_or_else(|| {
            CommandError::Usage("No connection string provided via --conn flag or config file".to_string())
        })
}

fn print_report(dialect: &Dialect) -> Result<(), CommandError> {
    let rendered = toml::to_string_pretty(&dialect.report()).map_err(|e| CommandError::Render(e.to_string()))?;
    print!("{}", rendered);
    Ok(())
}

fn run_detect(conn: Option<String>, config: &Config) -> Result<(), CommandError> {
    let source = OdbcDataSource::new(&connection_string(conn, config)?)?;
    let mut connection = source.connect()?;
    let dialect = dialects::detect_dialect(connection.as_mut())?;
    print_report(&dialect)
}

/// Dialect named in the config, or detected from the connection.
fn resolve_dialect(source: &OdbcDataSource, config: &Config) -> Result<Dialect, CommandError> {
    if let Some(name) = &config.database.dialect {
        debug!("Using configured dialect {}", name);
        return Ok(dialects::get_dialect(name, "")?);
    }
    let mut connection = source.connect()?;
    Ok(dialects::detect_dialect(connection.as_mut())?)
}

/// Context for one command; `seconds == 0` waits forever. The deadline
/// belongs to the command, not to the statistics layer.
fn command_context(seconds: u32) -> ExecutionContext {
    if seconds == 0 {
        return ExecutionContext::new();
    }
    debug!("Requests time out after {}s", seconds);
    ExecutionContext::with_timeout(Duration::from_secs(u64::from(seconds)))
}

fn run_stats(
    conn: Option<String>,
    timeout: Option<u32>,
    target: StatsTarget,
    config: &Config,
) -> Result<(), CommandError> {
    let providers = config
        .statistics
        .providers
        .iter()
        .map(|name| provider_by_name(name))
        .collect::<Result<Vec<_>, _>>()?;

    let source = OdbcDataSource::new(&connection_string(conn, config)?)?;
    let dialect = resolve_dialect(&source, config)?;
    let source = source.with_dialect(&dialect);
    let chain = StatisticsChain::new(Arc::new(dialect), providers);
    debug!("Statistics chain: {:?}", chain);

    let ctx = command_context(timeout.unwrap_or(config.database.timeout));

    match estimate(&chain, &source, &target, &ctx)? {
        Some(n) => println!("{}", n),
        None => println!("unknown"),
    }
    Ok(())
}

fn estimate(
    chain: &StatisticsChain,
    source: &dyn DataSource,
    target: &StatsTarget,
    ctx: &ExecutionContext,
) -> Result<Estimate, StatisticsError> {
    match target {
        StatsTarget::Table { table, catalog, schema } => {
            let table = TableRef::qualified(catalog.as_deref(), schema.as_deref(), table);
            chain.table_cardinality(source, &table, ctx)
        }
        StatsTarget::Column {
            table,
            column,
            catalog,
            schema,
        } => {
            let table = TableRef::qualified(catalog.as_deref(), schema.as_deref(), table);
            chain.column_cardinality(source, &table, column, ctx)
        }
        StatsTarget::Query { sql } => chain.query_cardinality(source, sql, ctx),
    }
}

fn run_show(name: &str, version: &str) -> Result<(), CommandError> {
    let dialect = dialects::get_dialect(name, version)?;
    print_report(&dialect)
}

/// Parse `name:type` column definitions.
pub fn parse_columns(definitions: &[String]) -> Result<(Vec<&str>, Vec<ColumnType>), CommandError> {
    let mut names = Vec::with_capacity(definitions.len());
    let mut types = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let (name, column_type) = definition
            .split_once(':')
            .ok_or_else(|| CommandError::Usage(format!("Column '{}' is not in name:type form", definition)))?;
        names.push(name.trim());
        types.push(column_type.trim().parse::<ColumnType>()?);
    }
    Ok((names, types))
}

/// Split a comma-separated row; empty cells are NULL.
pub fn parse_row(row: &str) -> Vec<Option<String>> {
    row.split(',')
        .map(str::trim)
        .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
        .collect()
}

fn run_inline(name: &str, version: &str, columns: &[String], rows: &[String]) -> Result<(), CommandError> {
    let dialect = dialects::get_dialect(name, version)?;
    let (names, types) = parse_columns(columns)?;
    let rows: Vec<Vec<Option<String>>> = rows.iter().map(|row| parse_row(row)).collect();
    println!("{}", dialect.generate_inline_table(&names, &types, &rows)?);
    Ok(())
}

fn run_config(output: &str, env: Option<&str>) -> Result<(), CommandError> {
    Config::generate_default_config(output)?;
    info!("Generated default configuration file: {}", output);

    if let Some(env_name) = env {
        std::fs::create_dir_all("config")
            .map_err(|e| ConfigError::FileWrite("config".to_string(), e.to_string()))?;
        let env_path = format!("config/{}.toml", env_name);
        Config::generate_default_config(&env_path)?;
        info!("Generated environment configuration file: {}", env_path);
    }
    Ok(())
}
