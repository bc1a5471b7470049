//! Startup orchestration: wallet → registration → cached identity.
//!
//! The manager moves through `Uninitialized → Loading → Registering → Ready`
//! exactly once. Reaching `Ready` never depends on the network; only wallet
//! storage and key generation can fail initialization.

use tracing::{debug, info, warn};

use super::registration::{RegistrationClient, RegistrationMetadata, RegistrationOutcome};
use super::store::WalletStore;
use super::Identity;
use crate::config::IdentityConfig;
use crate::error::{IdentityError, RegistrationError};

/// Description used when the host supplies no bio.
pub const DEFAULT_DESCRIPTION: &str = "ElizaOS agent";

/// Lifecycle of an [`IdentityManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Loading,
    Registering,
    /// Terminal for the process.
    Ready,
}

/// Host-supplied agent details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentMetadata {
    pub agent_id: String,
    pub name: Option<String>,
    pub bio: Vec<String>,
}

impl AgentMetadata {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_bio(mut self, line: impl Into<String>) -> Self {
        self.bio.push(line.into());
        self
    }

    /// Name sent to the directory: the character name, else the agent id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.agent_id)
    }

    /// First bio line, else [`DEFAULT_DESCRIPTION`].
    pub fn description(&self) -> &str {
        self.bio
            .first()
            .map(String::as_str)
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION)
    }
}

/// Host-owned knowledge collection that receives the identity fact.
pub trait KnowledgeSink: Send {
    fn add_knowledge(&mut self, fact: String);
}

impl KnowledgeSink for Vec<String> {
    fn add_knowledge(&mut self, fact: String) {
        self.push(fact);
    }
}

/// Sentence injected into the host's knowledge once the identity is ready.
pub fn knowledge_fact(identity: &Identity) -> String {
    format!(
        "My on-chain Solana identity is registered on SAID Protocol. Wallet: {}. Profile: {}",
        identity.wallet, identity.profile_url
    )
}

/// Owns the agent identity for the life of the process.
#[derive(Debug)]
pub struct IdentityManager {
    store: WalletStore,
    client: RegistrationClient,
    profile_base_url: String,
    capabilities: Vec<String>,
    state: ManagerState,
    identity: Option<Identity>,
}

impl IdentityManager {
    pub fn new(config: &IdentityConfig, store: WalletStore, client: RegistrationClient) -> Self {
        Self {
            store,
            client,
            profile_base_url: config.profile_base_url.clone(),
            capabilities: config.capabilities.clone(),
            state: ManagerState::Uninitialized,
            identity: None,
        }
    }

    /// Build the store and client described by `config`.
    pub fn from_config(config: &IdentityConfig) -> Result<Self, RegistrationError> {
        let store = WalletStore::new(&config.base_dir);
        let client =
            RegistrationClient::new(&config.api_url, config.retry, config.request_timeout)?;
        Ok(Self::new(config, store, client))
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// The current identity, or `None` until initialization completes.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Load or create the wallet, register it, and cache the identity.
    ///
    /// Once `Ready`, further calls return the cached identity without I/O.
    pub async fn initialize(
        &mut self,
        metadata: &AgentMetadata,
        knowledge: Option<&mut dyn KnowledgeSink>,
    ) -> Result<&Identity, IdentityError> {
        let identity = match self.identity.take() {
            Some(existing) => existing,
            None => self.provision(metadata, knowledge).await?,
        };
        self.state = ManagerState::Ready;
        Ok(self.identity.insert(identity))
    }

    async fn provision(
        &mut self,
        metadata: &AgentMetadata,
        knowledge: Option<&mut dyn KnowledgeSink>,
    ) -> Result<Identity, IdentityError> {
        self.state = ManagerState::Loading;
        let record = match self.store.load_or_create(&metadata.agent_id) {
            Ok(record) => record,
            Err(e) => {
                self.state = ManagerState::Uninitialized;
                return Err(e.into());
            }
        };

        self.state = ManagerState::Registering;
        let registration = RegistrationMetadata {
            name: metadata.display_name().to_string(),
            description: metadata.description().to_string(),
            capabilities: self.capabilities.clone(),
        };
        let outcome = self.client.register(&record.public_key, &registration).await;

        let verified = match &outcome {
            RegistrationOutcome::Verified => true,
            RegistrationOutcome::RegisteredUnverified => false,
            RegistrationOutcome::Failed {
                attempts,
                last_error,
            } => {
                warn!(
                    wallet = %record.public_key,
                    attempts,
                    error = %last_error,
                    "Registration failed; continuing with local-only identity"
                );
                false
            }
        };

        let identity = Identity::from_record(&record, &self.profile_base_url, verified);
        info!(
            wallet = %identity.wallet,
            profile = %identity.profile_url,
            verified = identity.verified,
            "Agent identity ready"
        );

        if let Some(sink) = knowledge {
            sink.add_knowledge(knowledge_fact(&identity));
        }
        Ok(identity)
    }

    /// Nothing to tear down: no background tasks outlive initialization.
    pub fn stop(&mut self) {
        debug!("Identity manager stopped");
    }
}
