//! Injection pass configuration
//!
//! Loaded from `telegraft.toml` in the target project. Everything has a
//! default tuned for a reqwest-shaped client, so a config file is only
//! needed to customize patterns or declare build variants.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::{Result, TelegraftError};

fn default_include() -> Vec<String> {
    vec!["**/*.rs".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["target/**".to_string()]
}

fn default_builder_patterns() -> Vec<String> {
    vec![
        "reqwest::Client::builder".to_string(),
        "Client::builder".to_string(),
    ]
}

fn default_wrapper_path() -> String {
    "telegraft::instrument_builder".to_string()
}

/// Symbols available to one build variant. Injection into a variant is
/// valid only if the wrapper symbol is on its classpath.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantConfig {
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// Top-level configuration for the injection pass.
#[derive(Debug, Clone, Deserialize)]
pub struct InjectConfig {
    /// Glob patterns (relative to the target root) selecting artifacts.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns excluding artifacts after `include` matched.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Fully qualified builder-construction paths to detect, matched as
    /// zero-argument call expressions.
    #[serde(default = "default_builder_patterns")]
    pub builder_patterns: Vec<String>,

    /// Path of the registration call wrapped around each detected site.
    #[serde(default = "default_wrapper_path")]
    pub wrapper_path: String,

    /// Named build variants and their available symbols.
    #[serde(default)]
    pub variants: HashMap<String, VariantConfig>,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            builder_patterns: default_builder_patterns(),
            wrapper_path: default_wrapper_path(),
            variants: HashMap::new(),
        }
    }
}

impl InjectConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TelegraftError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.builder_patterns.is_empty() {
            return Err(TelegraftError::Config(
                "At least one builder pattern is required".to_string(),
            ));
        }
        if self.wrapper_path.trim().is_empty() {
            return Err(TelegraftError::Config(
                "Wrapper path must not be empty".to_string(),
            ));
        }
        if self.include.is_empty() {
            return Err(TelegraftError::Config(
                "At least one include pattern is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a named build variant.
    pub fn variant(&self, name: &str) -> Result<&VariantConfig> {
        self.variants
            .get(name)
            .ok_or_else(|| TelegraftError::UnknownVariant(name.to_string()))
    }

    /// Last path segment of the wrapper, as it appears at an instrumented
    /// site regardless of how the call is qualified.
    pub fn wrapper_name(&self) -> &str {
        self.wrapper_path
            .rsplit("::")
            .next()
            .unwrap_or(&self.wrapper_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_reqwest_shaped_clients() {
        let config = InjectConfig::default();
        assert!(config
            .builder_patterns
            .contains(&"reqwest::Client::builder".to_string()));
        assert_eq!(config.wrapper_path, "telegraft::instrument_builder");
        assert_eq!(config.wrapper_name(), "instrument_builder");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_variants_from_toml() {
        let config: InjectConfig = toml::from_str(
            r#"
            include = ["src/**/*.rs"]
            builder_patterns = ["http::Client::builder"]

            [variants.release]
            symbols = ["telegraft::instrument_builder"]

            [variants.minimal]
            symbols = []
            "#,
        )
        .unwrap();

        assert_eq!(config.include, vec!["src/**/*.rs"]);
        assert_eq!(
            config.variant("release").unwrap().symbols,
            vec!["telegraft::instrument_builder"]
        );
        assert!(config.variant("minimal").unwrap().symbols.is_empty());
        assert!(matches!(
            config.variant("missing").unwrap_err(),
            TelegraftError::UnknownVariant(name) if name == "missing"
        ));
    }

    #[test]
    fn empty_builder_patterns_fail_validation() {
        let config: InjectConfig = toml::from_str("builder_patterns = []").unwrap();
        assert!(config.validate().is_err());
    }
}
