//! Composer configuration.
//!
//! A config can come from a TOML document, from the environment, or both:
//!
//! ```toml
//! strategy = "error-on-conflict"
//! reserved_names = ["logCellActivity"]
//! ```
//!
//! `POLYMIX_MERGE_STRATEGY` overrides the file's strategy.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::strategy::MergeStrategy;

pub const STRATEGY_ENV_VAR: &str = "POLYMIX_MERGE_STRATEGY";

static GLOBAL_CONFIG: Lazy<ComposerConfig> = Lazy::new(|| {
    let mut config = ComposerConfig::default();
    if let Err(error) = config.apply_env() {
        warn!("ignoring {}: {}", STRATEGY_ENV_VAR, error);
    }
    debug!("global composer config: strategy={}", config.strategy);
    config
});

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposerConfig {
    pub strategy: MergeStrategy,
    /// Prototype names a [`Composer`](crate::strategy::Composer) never registers,
    /// on top of `constructor`.
    pub reserved_names: Vec<String>,
}

impl ComposerConfig {
    /// The process-wide default, read from the environment once.
    pub fn global() -> &'static ComposerConfig {
        &GLOBAL_CONFIG
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Applies `POLYMIX_MERGE_STRATEGY` when set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        match std::env::var(STRATEGY_ENV_VAR) {
            Ok(value) => self.apply_strategy_override(&value),
            Err(_) => Ok(()),
        }
    }

    pub fn apply_strategy_override(&mut self, value: &str) -> Result<(), ConfigError> {
        self.strategy = parse_strategy(value)?;
        Ok(())
    }
}

pub fn parse_strategy(value: &str) -> Result<MergeStrategy, ConfigError> {
    value
        .trim()
        .parse::<MergeStrategy>()
        .map_err(|_| ConfigError::UnknownStrategy(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = ComposerConfig::from_toml_str(
            r#"
            strategy = "error-on-conflict"
            reserved_names = ["logCellActivity", "gurgle"]
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy, MergeStrategy::ErrorOnConflict);
        assert_eq!(config.reserved_names, vec!["logCellActivity", "gurgle"]);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ComposerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ComposerConfig::default());
        assert_eq!(config.strategy, MergeStrategy::LastWins);
    }

    #[test]
    fn test_bad_config_is_rejected() {
        assert!(matches!(
            ComposerConfig::from_toml_str(r#"strategy = "sometimes-wins""#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(ComposerConfig::from_toml_str("colour = 1"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_strategy_override() {
        let mut config = ComposerConfig::default();
        config.apply_strategy_override(" namespaced-only ").unwrap();
        assert_eq!(config.strategy, MergeStrategy::NamespacedOnly);

        assert!(matches!(
            config.apply_strategy_override("nope"),
            Err(ConfigError::UnknownStrategy(value)) if value == "nope"
        ));
        assert_eq!(config.strategy, MergeStrategy::NamespacedOnly);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ComposerConfig::load("/nonexistent/polymix.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
