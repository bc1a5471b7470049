//! Operator settings persistence.
//!
//! Stores overrides in `<base-dir>/said/settings.json`.
//! Settings are resolved with env var > settings.json > default priority
//! (see [`crate::config::IdentityConfig::resolve`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::registration::{DEFAULT_CAPABILITIES, DEFAULT_MAX_ATTEMPTS};
use crate::identity::store::WALLET_SUBDIR;

/// Settings persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory API base URL. None = production default.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Base URL for public profile pages. None = production default.
    #[serde(default)]
    pub profile_url: Option<String>,

    /// Per-request timeout for registration calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Registration retry and payload settings.
    #[serde(default)]
    pub registration: RegistrationSettings,
}

/// Registration retry and payload configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSettings {
    /// Attempts per startup (including the first).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit in milliseconds: attempt n waits n × this.
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,

    /// Capabilities advertised to the directory.
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_step_ms() -> u64 {
    1000
}

fn default_capabilities() -> Vec<String> {
    DEFAULT_CAPABILITIES.iter().map(|c| c.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            profile_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            registration: RegistrationSettings::default(),
        }
    }
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
            capabilities: default_capabilities(),
        }
    }
}

impl Settings {
    /// Settings file path under a base directory.
    pub fn path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(WALLET_SUBDIR).join("settings.json")
    }

    /// Load settings from a specific path, returning default if not found.
    ///
    /// A malformed file is logged and ignored rather than blocking startup.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Write settings as pretty JSON, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get a setting value by dotted path (e.g., "registration.max_attempts").
    pub fn get(&self, path: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(display_value(current))
    }

    /// List all settings as sorted (path, value) pairs.
    pub fn list(&self) -> Vec<(String, String)> {
        let Ok(json) = serde_json::to_value(self) else {
            return Vec::new();
        };
        let mut results = Vec::new();
        collect_settings(&json, String::new(), &mut results);
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Recursively collect leaf paths and their display values.
fn collect_settings(value: &serde_json::Value, prefix: String, results: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect_settings(val, path, results);
            }
        }
        leaf => results.push((prefix, display_value(leaf))),
    }
}
