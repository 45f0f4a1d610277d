//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        // prefix_separator("_") makes PLANTWORKS_SERVER__PORT work with a
        // single underscore after the prefix.
        .add_source(
            Environment::with_prefix("PLANTWORKS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    config
        .coordinator
        .validate()
        .context("Invalid coordinator configuration")?;

    Ok(config.with_env_fallbacks())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.app_name, "plantworks");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.coordinator.name, "plantworks_main_agent");
        assert_eq!(config.coordinator.history_window, 6);
        assert_eq!(config.tools.timeout_ms, 10_000);
        assert!(config.llm.api_key.is_none());
        assert!(config.credentials.google_cse_id.is_none());
    }

    #[test]
    fn test_later_sources_override() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(
                "[tools]\nlive_enabled = false\n[coordinator]\nrouting_threshold = 0.7",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(!config.tools.live_enabled);
        assert_eq!(config.tools.timeout_ms, 10_000);
        assert_eq!(config.coordinator.routing_threshold, 0.7);
        assert_eq!(config.coordinator.model, "gemini-2.0-flash");
    }
}
