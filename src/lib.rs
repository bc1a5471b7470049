//! Durable agent identity with SAID directory registration.
//!
//! A host agent framework calls [`IdentityManager::initialize`] once at
//! startup and queries [`IdentityManager::identity`] afterwards. The
//! identity survives restarts through a per-agent wallet file and falls back
//! to local-only (unverified) when the directory cannot be reached.

pub mod config;
pub mod error;
pub mod identity;
pub mod settings;

pub use config::IdentityConfig;
pub use error::{IdentityError, RegistrationError, StoreError};
pub use identity::{
    AgentMetadata, Identity, IdentityManager, KnowledgeSink, ManagerState, RegistrationOutcome,
    WalletRecord, WalletStore,
};
pub use settings::Settings;

/// Plugin name registered with the host.
pub const PLUGIN_NAME: &str = "said";

/// Service type under which the host looks up the manager.
pub const SERVICE_TYPE: &str = "said_identity";

pub const PLUGIN_DESCRIPTION: &str = "SAID Protocol: on-chain Solana identity for ElizaOS agents. \
     Auto-registers every agent with a free verifiable identity on first run.";

pub const CAPABILITY_DESCRIPTION: &str =
    "On-chain Solana identity for this agent via SAID Protocol";
