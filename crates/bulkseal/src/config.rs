//! Configuration loading and validation for the `bulkseal` binary.
//!
//! All values are read from `BULKSEAL_`-prefixed environment variables at
//! startup. The process exits with a clear error message if any required
//! variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::bulk::DEFAULT_CONCURRENCY_LIMIT;
use crate::service::SealerOptions;

/// Prefix shared by every environment variable this crate reads.
pub const ENV_PREFIX: &str = "BULKSEAL";

/// Validated `bulkseal` configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Secret the symmetric key is derived from (`BULKSEAL_SECRET`). **Required.**
    pub secret: String,

    /// Maximum number of concurrent cipher operations per batch.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_concurrency_limit() -> usize {
    DEFAULT_CONCURRENCY_LIMIT
}
fn default_log_level() -> String {
    "info".into()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret", &"[REDACTED]")
            .field("concurrency_limit", &self.concurrency_limit)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Sealer options derived from this configuration.
    pub fn sealer_options(&self) -> SealerOptions {
        SealerOptions {
            concurrency_limit: self.concurrency_limit,
            cancel: None,
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.secret.is_empty() {
            anyhow::bail!("{ENV_PREFIX}_SECRET is required and must not be empty");
        }
        if self.concurrency_limit == 0 {
            anyhow::bail!("{ENV_PREFIX}_CONCURRENCY_LIMIT must be > 0");
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("{ENV_PREFIX}_LOG_LEVEL must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn valid() -> Config {
        Config {
            secret: "secret-key".into(),
            concurrency_limit: default_concurrency_limit(),
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_concurrency_limit(), 10);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn loads_from_prefixed_variables() {
        let cfg = Config::load(env(&[
            ("BULKSEAL_SECRET", "s3cr3t"),
            ("BULKSEAL_CONCURRENCY_LIMIT", "4"),
        ]))
        .unwrap();
        assert_eq!(cfg.secret, "s3cr3t");
        assert_eq!(cfg.concurrency_limit, 4);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(Config::load(env(&[("BULKSEAL_LOG_LEVEL", "debug")])).is_err());
    }

    #[test]
    fn validate_rejects_empty_secret() {
        let cfg = Config {
            secret: "".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_limit() {
        let cfg = Config {
            concurrency_limit: 0,
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn debug_redacts_secret() {
        let dbg = format!("{:?}", valid());
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn sealer_options_carry_limit() {
        let cfg = Config {
            concurrency_limit: 3,
            ..valid()
        };
        let opts = cfg.sealer_options();
        assert_eq!(opts.concurrency_limit, 3);
        assert!(opts.cancel.is_none());
    }
}
