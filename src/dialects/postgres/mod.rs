use crate::dialects::base::DialectConfig;
use std::sync::OnceLock;

static CONFIG: OnceLock<DialectConfig> = OnceLock::new();

/// PostgreSQL capability table.
pub fn config() -> &'static DialectConfig {
    CONFIG.get_or_init(|| {
        let config_str = include_str!("dialect.toml");
        toml::from_str(config_str).expect("Failed to parse PostgreSQL dialect config")
    })
}
