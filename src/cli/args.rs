use clap::{Parser, Subcommand};

/// CLI entry point for cardinal
#[derive(Parser, Debug)]
#[command(
    name = "cardinal",
    version,
    about = "SQL dialect detection and cardinality estimation over ODBC"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Environment (loads config/{env}.toml)
    #[arg(long, global = true)]
    pub env: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the dialect of a live connection and print its capabilities
    Detect {
        /// ODBC connection string
        #[arg(long)]
        conn: Option<String>,
    },

    /// Estimate a cardinality through the statistics provider chain
    Stats {
        /// ODBC connection string
        #[arg(long, global = true)]
        conn: Option<String>,

        /// Seconds before the request is cancelled (0 waits forever)
        #[arg(long, global = true)]
        timeout: Option<u32>,

        #[command(subcommand)]
        target: StatsTarget,
    },

    /// List built-in dialects
    Dialects,

    /// Print the capabilities of a dialect without connecting
    Show {
        /// Dialect name or alias
        dialect: String,

        /// Backend version to resolve version-gated capabilities against;
        /// omitted means a current release
        #[arg(long = "server-version", default_value = "")]
        version: String,
    },

    /// Generate a literal-values table for a dialect
    Inline {
        /// Dialect name or alias
        #[arg(long)]
        dialect: String,

        /// Backend version
        #[arg(long = "server-version", default_value = "")]
        version: String,

        /// Column as name:type, repeatable
        #[arg(long = "column", required = true)]
        columns: Vec<String>,

        /// Comma-separated row values, repeatable; an empty cell is NULL
        #[arg(long = "row", required = true)]
        rows: Vec<String>,
    },

    /// Generate configuration file (also config/{env}.toml with --env)
    Config {
        /// Output path for config file
        #[arg(long, default_value = "config.toml")]
        output: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum StatsTarget {
    /// Row count of a table
    Table {
        table: String,
        #[arg(long)]
        catalog: Option<String>,
        #[arg(long)]
        schema: Option<String>,
    },

    /// Distinct values in a column
    Column {
        table: String,
        column: String,
        #[arg(long)]
        catalog: Option<String>,
        #[arg(long)]
        schema: Option<String>,
    },

    /// Result size of a query
    Query { sql: String },
}
