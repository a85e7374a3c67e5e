use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use std::env;
use std::io::Write;

/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn setup_logger(verbose: bool, configured_level: &str) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        configured_level.parse().unwrap_or(LevelFilter::Info)
    };

    let mut builder = Builder::new();
    builder.filter(None, level);
    builder.target(Target::Stderr);

    builder.format(|buf, record| {
        let prefix = match record.level() {
            Level::Error => "error: ",
            Level::Warn => "warning: ",
            Level::Info | Level::Debug | Level::Trace => "",
        };
        writeln!(buf, "{}{}", prefix, record.args())
    });

    if env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    }

    // a second call (tests, embedding) keeps the first logger
    let _ = builder.try_init();
}
