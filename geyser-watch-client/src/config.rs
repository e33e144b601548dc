use anyhow::{Context, Result};
use geyser_watch_connector::config::ConnectorConfig;
use geyser_watch_logger::LogConfig;
use serde::Deserialize;

/// Prefix of the environment variables layered over the config file,
/// e.g. `GEYSER_WATCH__LOG__LEVEL=debug`.
pub const ENV_PREFIX: &str = "GEYSER_WATCH";

/// The top-level configuration of the `geyser-watch` binary.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Loads configuration from a TOML file, then environment variables.
pub fn load_config(path: &str) -> Result<AppConfig> {
    build(Some(path))
}

/// Defaults overlaid with environment variables only.
pub fn load_env_config() -> Result<AppConfig> {
    build(None)
}

fn build(path: Option<&str>) -> Result<AppConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path));
    }
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__"),
    );

    let settings: AppConfig = builder
        .build()
        .context(format!(
            "Failed to build configuration from '{}'",
            path.unwrap_or("<environment>")
        ))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok(settings)
}
