//! Resolved identity configuration.
//!
//! Built from [`Settings`] with environment overrides applied on top.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::identity::registration::RetryPolicy;
use crate::settings::Settings;

/// Production directory API.
pub const DEFAULT_API_URL: &str = "https://api.saidprotocol.com";

/// Production host for public profile pages.
pub const DEFAULT_PROFILE_URL: &str = "https://saidprotocol.com";

pub const ENV_API_URL: &str = "SAID_API_URL";
pub const ENV_PROFILE_URL: &str = "SAID_PROFILE_URL";
pub const ENV_HOME: &str = "SAID_HOME";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SAID_REQUEST_TIMEOUT_SECS";

/// Default base directory (`~/.elizaos`).
pub fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".elizaos")
}

/// Base directory from `SAID_HOME`, falling back to [`default_base_dir`].
pub fn base_dir_from_env() -> PathBuf {
    std::env::var_os(ENV_HOME)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_base_dir)
}

/// Everything the identity manager needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Root under which `said/<agentId>-wallet.json` lives.
    pub base_dir: PathBuf,
    pub api_url: String,
    pub profile_base_url: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub capabilities: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            base_dir: default_base_dir(),
            api_url: DEFAULT_API_URL.to_string(),
            profile_base_url: DEFAULT_PROFILE_URL.to_string(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            retry: RetryPolicy::default(),
            capabilities: settings.registration.capabilities,
        }
    }
}

impl IdentityConfig {
    /// Resolve from settings and the process environment.
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Self::resolve_with(settings, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with(
        settings: &Settings,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let base_dir = env(ENV_HOME)
            .map(PathBuf::from)
            .unwrap_or_else(default_base_dir);

        let api_url = env(ENV_API_URL)
            .or_else(|| settings.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = normalize_url(ENV_API_URL, &api_url)?;

        let profile_base_url = env(ENV_PROFILE_URL)
            .or_else(|| settings.profile_url.clone())
            .unwrap_or_else(|| DEFAULT_PROFILE_URL.to_string());
        let profile_base_url = normalize_url(ENV_PROFILE_URL, &profile_base_url)?;

        let timeout_secs = match env(ENV_REQUEST_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: ENV_REQUEST_TIMEOUT_SECS.to_string(),
                message: format!("'{raw}' is not a whole number of seconds ({e})"),
            })?,
            None => settings.request_timeout_secs,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            base_dir,
            api_url,
            profile_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy {
                max_attempts: settings.registration.max_attempts,
                backoff_step: Duration::from_millis(settings.registration.backoff_step_ms),
            },
            capabilities: settings.registration.capabilities.clone(),
        })
    }
}

/// Require an absolute http(s) URL and strip trailing slashes.
fn normalize_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };
    let parsed = url::Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    Ok(value.trim().trim_end_matches('/').to_string())
}
