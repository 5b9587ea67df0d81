//! Log setup for the `bulkseal` binary.
//!
//! Every event is a JSON object on stderr, leaving stdout to the batch
//! records. Events carry counts and indices only: item text, envelopes and
//! key bytes are never logged.
//!
//! The level comes from `BULKSEAL_LOG_LEVEL`; a non-empty `RUST_LOG` wins
//! over it.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Install the JSON subscriber as the global default.
///
/// # Errors
///
/// Returns an error if the level directives do not parse or a global
/// subscriber is already installed.
pub fn init(log_level: &str) -> Result<()> {
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), log_level)?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("bulkseal logging already initialised: {e}"))
}

/// Pick the directives to filter on: `env_override` when it is set and
/// non-empty, else `log_level`.
fn build_filter(env_override: Option<String>, log_level: &str) -> Result<EnvFilter> {
    match env_override.filter(|d| !d.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid {} directives {directives:?}", EnvFilter::DEFAULT_ENV)),
        None => EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level {log_level:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_used_without_override() {
        let filter = build_filter(None, "debug").unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn override_wins_over_configured_level() {
        let filter = build_filter(Some("bulkseal=trace".into()), "info").unwrap();
        assert_eq!(filter.to_string(), "bulkseal=trace");
    }

    #[test]
    fn blank_override_is_ignored() {
        let filter = build_filter(Some("  ".into()), "warn").unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn malformed_level_is_rejected() {
        let err = build_filter(None, "bulkseal=loud").unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }
}
