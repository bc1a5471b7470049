//! Client side of the directory's pending-registration call.
//!
//! One `register` call makes up to `RetryPolicy::max_attempts` strictly
//! sequential POSTs with linear backoff between them. No error crosses this
//! boundary: the caller gets a [`RegistrationOutcome`] and decides how to
//! degrade.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RegistrationError;

/// Path of the registration endpoint relative to the API base URL.
pub const REGISTER_PATH: &str = "/api/register/pending";

/// Value of the `source` field in every registration request.
pub const REGISTRATION_SOURCE: &str = "elizaos-plugin";

/// Capabilities advertised when none are configured.
pub const DEFAULT_CAPABILITIES: &[&str] = &["conversation", "autonomous-tasks", "elizaos"];

/// Default number of attempts per `register` call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff unit; attempt `n` is followed by `n` of these.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(1000);

/// Bounded linear backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt `attempt` (1-based), or `None` if
    /// no further attempt follows it.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.attempts() {
            return None;
        }
        Some(self.backoff_step * attempt)
    }

    /// Total attempts, never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Sleep abstraction so retry timing can be observed without real delays.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Cooperative sleep on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Agent details sent alongside the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationMetadata {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

/// Request body for `POST /api/register/pending`.
#[derive(Debug, Serialize)]
pub struct RegistrationRequest<'a> {
    pub wallet: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub capabilities: &'a [String],
    pub source: &'static str,
}

/// Accepted shape of a successful response. Unknown fields are ignored;
/// known fields of the wrong type fail the attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

/// Result of a full registration sequence.
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// The directory confirmed the registration as verified.
    Verified,
    /// The directory accepted the registration without a verified flag.
    RegisteredUnverified,
    /// Every attempt failed.
    Failed {
        attempts: u32,
        last_error: RegistrationError,
    },
}

impl RegistrationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// HTTP client for the directory's registration endpoint.
#[derive(Clone)]
pub struct RegistrationClient {
    api_url: String,
    http: Client,
    policy: RetryPolicy,
    delay: Arc<dyn Delay>,
}

impl std::fmt::Debug for RegistrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationClient")
            .field("api_url", &self.api_url)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RegistrationClient {
    /// Create a client against `api_url` with a per-request timeout.
    pub fn new(
        api_url: impl Into<String>,
        policy: RetryPolicy,
        request_timeout: Duration,
    ) -> Result<Self, RegistrationError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            api_url: api_url.into(),
            http,
            policy,
            delay: Arc::new(TokioDelay),
        })
    }

    /// Replace the sleep used between attempts.
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Full URL of the registration endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), REGISTER_PATH)
    }

    /// Register `wallet` with the directory, retrying on any failure.
    pub async fn register(
        &self,
        wallet: &str,
        metadata: &RegistrationMetadata,
    ) -> RegistrationOutcome {
        let request = RegistrationRequest {
            wallet,
            name: &metadata.name,
            description: &metadata.description,
            capabilities: &metadata.capabilities,
            source: REGISTRATION_SOURCE,
        };
        let attempts = self.policy.attempts();

        let mut attempt = 1;
        loop {
            match self.attempt(&request).await {
                Ok(response) => {
                    if let Some(echoed) = response.wallet.as_deref()
                        && echoed != wallet
                    {
                        warn!(
                            wallet = %wallet,
                            echoed = %echoed,
                            "Directory echoed a different wallet"
                        );
                    }
                    let verified = response.is_verified.unwrap_or(false);
                    info!(wallet = %wallet, attempt, verified, "Registered with directory");
                    return if verified {
                        RegistrationOutcome::Verified
                    } else {
                        RegistrationOutcome::RegisteredUnverified
                    };
                }
                Err(e) => {
                    warn!(attempt, max_attempts = attempts, error = %e, "Registration attempt failed");
                    match self.policy.delay_after(attempt) {
                        Some(delay) => {
                            self.delay.sleep(delay).await;
                            attempt += 1;
                        }
                        None => {
                            return RegistrationOutcome::Failed {
                                attempts: attempt,
                                last_error: e,
                            };
                        }
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &RegistrationRequest<'_>,
    ) -> Result<RegistrationResponse, RegistrationError> {
        let url = self.endpoint();
        debug!(url = %url, "Sending registration request");

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistrationError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_backs_off_one_then_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_after(3), None);
        assert_eq!(policy.delay_after(0), None);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff_step: DEFAULT_BACKOFF_STEP,
        };
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.delay_after(1), None);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = RegistrationClient::new(
            "https://api.example.com/",
            RetryPolicy::default(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.example.com/api/register/pending"
        );
    }

    #[test]
    fn request_serializes_with_source_tag() {
        let caps = vec!["conversation".to_string()];
        let request = RegistrationRequest {
            wallet: "W",
            name: "Eliza",
            description: "ElizaOS agent",
            capabilities: &caps,
            source: REGISTRATION_SOURCE,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "wallet": "W",
                "name": "Eliza",
                "description": "ElizaOS agent",
                "capabilities": ["conversation"],
                "source": "elizaos-plugin",
            })
        );
    }

    #[test]
    fn response_schema() {
        let r: RegistrationResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(r, RegistrationResponse::default());

        let r: RegistrationResponse =
            serde_json::from_str(r#"{"wallet":"W","isVerified":true,"extra":1}"#).unwrap();
        assert_eq!(r.is_verified, Some(true));

        assert!(serde_json::from_str::<RegistrationResponse>(r#"{"isVerified":"yes"}"#).is_err());
        assert!(serde_json::from_str::<RegistrationResponse>("null").is_err());
        assert!(serde_json::from_str::<RegistrationResponse>("\"ok\"").is_err());
    }
}
