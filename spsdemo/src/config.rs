//! Application configuration management.
//!
//! Configuration is merged from default values, an optional TOML file and
//! environment variables, in that order of increasing precedence.

use crate::Cli;
use serde::{Deserialize, Serialize};

/// The main application configuration that composes all component configs
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Web server configuration (bind address, request limits)
    #[serde(default)]
    pub server: sps_axum::config::AxumConfig,

    /// The sandbox storefront the server prices against
    #[serde(default)]
    pub sandbox: sps_sandbox::config::SandboxConfig,

    /// Pacing, retries and caching of bulk pricing runs
    #[serde(default)]
    pub bulk: sps_bulk::BulkPricingOptions,
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file given by the CLI
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern:
    /// `APP_<SECTION>__<KEY>` maps to `<section>.<key>`
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Imitate the marketplace storefront
    /// export APP_SANDBOX__STOREFRONT="marketplace"
    ///
    /// # Set server bind address
    /// export APP_SERVER__BIND_ADDRESS="0.0.0.0:3000"
    ///
    /// # Keep fetched price tiers for ten minutes
    /// export APP_BULK__CACHE_TTL="10m"
    /// ```
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = &cli.config {
            if path.exists() {
                config = config.add_source(config::File::from(path.as_path()))
            } else {
                return Err(anyhow::anyhow!(
                    "Config file {} does not exist",
                    path.display()
                ));
            }
        }

        // APP_SERVER__BIND_ADDRESS maps to server.bind_address
        config = config.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let built_config = config.build()?;
        built_config.try_deserialize().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use sps_sandbox::config::SandboxConfig;
    use std::{path::PathBuf, time::Duration};

    fn cli(config: Option<PathBuf>) -> Cli {
        Cli {
            config,
            schema: None,
        }
    }

    #[rstest]
    fn defaults_survive_the_round_trip() {
        let config = AppConfig::load(&cli(None)).unwrap();
        let defaults = SandboxConfig::default();

        assert_eq!(config.server.max_territories, 200);
        assert_eq!(config.sandbox.storefront, defaults.storefront);
        assert_eq!(config.sandbox.tier_count, defaults.tier_count);
        assert_eq!(config.bulk.resolve.concurrency, 3);
        assert_eq!(
            config.bulk.delete.delay_between_batches,
            Duration::from_millis(500)
        );
    }

    #[rstest]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("spsdemo-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
[server]
bind_address = "127.0.0.1:3000"

[sandbox]
storefront = "marketplace"
latency = "25ms"

[bulk.resolve]
concurrency = 2
"#,
        )
        .unwrap();

        let config = AppConfig::load(&cli(Some(path.clone())));
        std::fs::remove_file(&path).unwrap();
        let config = config.unwrap();

        assert_eq!(config.server.bind_address.port(), 3000);
        assert_eq!(
            config.sandbox.storefront,
            sps_core::models::Storefront::Marketplace
        );
        assert_eq!(config.sandbox.latency, Duration::from_millis(25));
        assert_eq!(config.bulk.resolve.concurrency, 2);
        // untouched keys of a partially overridden section keep their defaults
        assert_eq!(
            config.bulk.resolve.delay_between_batches,
            Duration::from_millis(100)
        );
    }

    #[rstest]
    fn missing_files_are_an_error() {
        let path = PathBuf::from("/definitely/not/here.toml");
        assert!(AppConfig::load(&cli(Some(path))).is_err());
    }
}
