//! Agent identity management (SAID directory).
//!
//! Provides Ed25519 keypair generation, per-agent wallet persistence, and
//! registration with the SAID directory service. Registration is
//! best-effort: when the directory cannot be reached the agent still gets a
//! local-only identity marked unverified.
//!
//! # Architecture
//!
//! Each agent has:
//! - An Ed25519 keypair, persisted once at `<base-dir>/said/<agentId>-wallet.json`
//! - A wallet address (base58 public key) that identifies it in the directory
//! - A public profile page at `<profile-base>/agents/<wallet>`
//!
//! [`IdentityManager`] sequences the store and the registration client at
//! startup and holds the resulting [`Identity`] for the life of the process.

pub mod action;
pub mod base58;
pub mod keypair;
pub mod manager;
pub mod registration;
pub mod store;

use chrono::{DateTime, Utc};
use secrecy::SecretString;

pub use manager::{AgentMetadata, IdentityManager, KnowledgeSink, ManagerState};
pub use registration::{RegistrationClient, RegistrationOutcome, RetryPolicy};
pub use store::{WalletRecord, WalletStore};

/// The agent's identity for the current process.
#[derive(Debug)]
pub struct Identity {
    /// Base58 Ed25519 public key.
    pub wallet: String,

    /// Base58 of seed ‖ public key. Never logged.
    pub secret_key: SecretString,

    /// Public profile page for `wallet`.
    pub profile_url: String,

    /// When this identity was constructed.
    pub registered_at: DateTime<Utc>,

    /// Whether the directory confirmed the registration.
    pub verified: bool,
}

impl Identity {
    /// Build from a wallet record. `verified` comes from the registration outcome.
    pub fn from_record(record: &WalletRecord, profile_base_url: &str, verified: bool) -> Self {
        Self {
            wallet: record.public_key.clone(),
            secret_key: SecretString::from(record.secret_key.clone()),
            profile_url: profile_url(profile_base_url, &record.public_key),
            registered_at: Utc::now(),
            verified,
        }
    }
}

/// Public profile URL for a wallet.
pub fn profile_url(profile_base_url: &str, wallet: &str) -> String {
    format!("{}/agents/{}", profile_base_url.trim_end_matches('/'), wallet)
}
