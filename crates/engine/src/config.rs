//! Service configuration via TOML
//!
//! The configuration names additional loading contexts and factory
//! strategies. Both are stored as type names; loading contexts are built at
//! `initialize`, strategies lazily on first use.

use fabrica_core::{FactoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Reserved `object-factory` key for the catch-all strategy
pub const DEFAULT_FACTORY: &str = "default";

/// Configuration consumed by [`FactoryService::configure`](crate::FactoryService::configure).
///
/// # Example
///
/// ```toml
/// classloader = ["plugins::Loader"]
///
/// [object-factory]
/// default = "app::PooledFactory"
/// "app::Widget" = "app::WidgetFactory"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Context-provider type names, tried in order after the default context.
    #[serde(rename = "classloader", default, skip_serializing_if = "Vec::is_empty")]
    pub loaders: Vec<String>,
    /// Target type name (or `"default"`) to strategy type name.
    #[serde(rename = "object-factory", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub factories: BTreeMap<String, String>,
}

impl FactoryConfig {
    /// Empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an additional loading context
    pub fn with_loader(mut self, type_name: impl Into<String>) -> Self {
        self.loaders.push(type_name.into());
        self
    }

    /// Map a type name to a strategy type name
    pub fn with_factory(mut self, key: impl Into<String>, factory: impl Into<String>) -> Self {
        self.factories.insert(key.into(), factory.into());
        self
    }

    /// Set the catch-all strategy
    pub fn with_default_factory(self, factory: impl Into<String>) -> Self {
        self.with_factory(DEFAULT_FACTORY, factory)
    }

    /// Reject empty names
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Config` naming the first empty entry.
    pub fn validate(&self) -> Result<()> {
        if let Some(pos) = self.loaders.iter().position(|l| l.trim().is_empty()) {
            return Err(FactoryError::Config(format!(
                "classloader entry {} is empty",
                pos
            )));
        }
        for (key, factory) in &self.factories {
            if key.trim().is_empty() {
                return Err(FactoryError::Config(
                    "object-factory entry with an empty type name".to_string(),
                ));
            }
            if factory.trim().is_empty() {
                return Err(FactoryError::Config(format!(
                    "object-factory entry '{}' has an empty factory name",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this shape or
    /// contains empty names.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: FactoryConfig = toml::from_str(content)
            .map_err(|e| FactoryError::Config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| match e {
            FactoryError::Config(msg) => {
                FactoryError::Config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Serialize this config to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FactoryError::Config(format!("Failed to serialize configuration: {}", e)))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Fabrica factory service configuration
#
# Additional loading contexts, tried in order after the default context.
# Each entry names a type that builds a loading context without arguments.
# classloader = ["plugins::Loader"]

# Factory strategies, keyed by target type name. The "default" key applies
# to every type without its own entry. Strategies are built on first use.
[object-factory]
# default = "app::PooledFactory"
# "app::Widget" = "app::WidgetFactory"
"#
    }
}
