//! Agent configuration shared by the tracekit crates.
//!
//! The embedding agent loads an [`AgentConfig`] once at start-up and hands an
//! immutable copy to the plugin layer. Besides a handful of typed top-level
//! settings the configuration carries a flat property map, which plugins read
//! through [`AgentConfig::read_string`], [`AgentConfig::read_bool`] and
//! [`AgentConfig::read_int`]. Unparseable property values fall back to the
//! caller-supplied default so a typo in one plugin property never prevents
//! the agent from starting.

mod defaults;

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub use self::defaults::{
    DEFAULT_AGENT_ID, DEFAULT_APPLICATION_NAME, DEFAULT_PROFILE_ENABLED, default_agent_id,
    default_application_name, default_profile_enabled,
};

/// Tracing target used by configuration diagnostics.
const CONFIG_TARGET: &str = "tracekit_config";

/// Errors raised while loading an [`AgentConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The configuration document is not valid JSON for [`AgentConfig`].
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Immutable configuration supplied to the plugin layer.
///
/// # Example
///
/// ```
/// use tracekit_config::AgentConfig;
///
/// let config = AgentConfig::from_json_str(
///     r#"{ "application_name": "orders", "properties": { "profiler.jdbc.maxsqlbindvaluesize": "1024" } }"#,
/// ).expect("valid configuration");
/// assert_eq!(config.application_name, "orders");
/// assert_eq!(config.read_int("profiler.jdbc.maxsqlbindvaluesize", 0), 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Identifier of this agent instance.
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
    /// Name of the application the agent is attached to.
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// Master switch for profiling.
    #[serde(default = "default_profile_enabled")]
    pub profile_enabled: bool,
    /// Plugins that must not register any class editors.
    #[serde(default)]
    pub disabled_plugins: Vec<String>,
    /// Free-form plugin properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: default_agent_id(),
            application_name: default_application_name(),
            profile_enabled: DEFAULT_PROFILE_ENABLED,
            disabled_plugins: Vec::new(),
            properties: BTreeMap::new(),
        }
    }
}

impl AgentConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is malformed.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(document).map_err(|source| ConfigError::Parse { source })
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are malformed.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let document = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Self::from_json_str(&document)
    }

    /// Adds or replaces a property, returning the updated configuration.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns the raw property value, if present.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns the trimmed property value or `default` when it is missing.
    #[must_use]
    pub fn read_string(&self, key: &str, default: &str) -> String {
        self.property(key)
            .map_or_else(|| default.to_owned(), |value| value.trim().to_owned())
    }

    /// Reads a boolean property.
    ///
    /// Accepts `true` and `false` in any ASCII case. Anything else yields
    /// `default`.
    #[must_use]
    pub fn read_bool(&self, key: &str, default: bool) -> bool {
        let Some(raw) = self.property(key) else {
            return default;
        };
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            true
        } else if trimmed.eq_ignore_ascii_case("false") {
            false
        } else {
            warn!(
                target: CONFIG_TARGET,
                key,
                value = raw,
                "ignoring non-boolean property value"
            );
            default
        }
    }

    /// Reads an integer property, falling back to `default` when the value is
    /// missing or not a valid integer.
    #[must_use]
    pub fn read_int(&self, key: &str, default: i64) -> i64 {
        let Some(raw) = self.property(key) else {
            return default;
        };
        raw.trim().parse().unwrap_or_else(|_| {
            warn!(
                target: CONFIG_TARGET,
                key,
                value = raw,
                "ignoring non-integer property value"
            );
            default
        })
    }

    /// Returns `true` when the named plugin is listed in
    /// [`AgentConfig::disabled_plugins`].
    #[must_use]
    pub fn is_plugin_disabled(&self, plugin: &str) -> bool {
        self.disabled_plugins.iter().any(|name| name == plugin)
    }
}
