//! Per-agent wallet persistence.
//!
//! Each agent owns one file at `<base-dir>/said/<agentId>-wallet.json`. Once
//! written, the record is the durable root of the agent's identity and is
//! never rewritten. Losing it means losing the identity.
//!
//! Creation is serialized across processes with an exclusive advisory lock
//! on a sibling `.lock` file, and the record is published with a hard link
//! that fails rather than replace an existing file, so two first runs for
//! the same agent cannot clobber each other.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs4::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base58;
use super::keypair::{Keypair, PUBLIC_KEY_LEN, SECRET_KEY_LEN};
use crate::error::StoreError;

/// Subdirectory of the base dir that holds wallet files.
pub const WALLET_SUBDIR: &str = "said";

/// Persisted wallet record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    /// Base58 Ed25519 public key.
    pub public_key: String,
    /// Base58 of seed ‖ public key (64 bytes).
    pub secret_key: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRecord")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl WalletRecord {
    fn from_keypair(keypair: &Keypair) -> Self {
        Self {
            public_key: keypair.public_key_base58(),
            secret_key: keypair.secret_key_base58(),
            created_at: Utc::now(),
        }
    }

    /// Check that both keys decode to the right lengths and that the secret
    /// key's seed derives the stored public key.
    pub fn validate(&self) -> Result<(), String> {
        let public = base58::decode(&self.public_key)
            .map_err(|e| format!("publicKey is not base58: {e}"))?;
        if public.len() != PUBLIC_KEY_LEN {
            return Err(format!(
                "publicKey decodes to {} bytes, expected {PUBLIC_KEY_LEN}",
                public.len()
            ));
        }

        let secret = base58::decode(&self.secret_key)
            .map_err(|_| "secretKey is not base58".to_string())?;
        let secret: [u8; SECRET_KEY_LEN] = secret.try_into().map_err(|v: Vec<u8>| {
            format!(
                "secretKey decodes to {} bytes, expected {SECRET_KEY_LEN}",
                v.len()
            )
        })?;

        let keypair = Keypair::from_secret_key_bytes(&secret)
            .map_err(|_| "secretKey does not derive its embedded public key".to_string())?;
        if keypair.public_key()[..] != public[..] {
            return Err("secretKey belongs to a different publicKey".to_string());
        }
        Ok(())
    }
}

/// Loads or creates per-agent wallet files under a base directory.
#[derive(Debug, Clone)]
pub struct WalletStore {
    base_dir: PathBuf,
}

impl WalletStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory holding the wallet files.
    pub fn wallet_dir(&self) -> PathBuf {
        self.base_dir.join(WALLET_SUBDIR)
    }

    /// Deterministic wallet path for an agent.
    pub fn wallet_path(&self, agent_id: &str) -> PathBuf {
        self.wallet_dir().join(format!("{agent_id}-wallet.json"))
    }

    fn lock_path(&self, agent_id: &str) -> PathBuf {
        self.wallet_dir().join(format!("{agent_id}-wallet.lock"))
    }

    /// Load the agent's wallet, creating and persisting a new one on first run.
    pub fn load_or_create(&self, agent_id: &str) -> Result<WalletRecord, StoreError> {
        validate_agent_id(agent_id)?;
        let path = self.wallet_path(agent_id);

        // Fast path: no lock needed once the record exists.
        if path.exists() {
            return read_record(&path);
        }

        let dir = self.wallet_dir();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let lock_path = self.lock_path(agent_id);
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| StoreError::Io {
                path: lock_path.clone(),
                source,
            })?;
        FileExt::lock_exclusive(&lock).map_err(|source| StoreError::Lock {
            path: lock_path.clone(),
            source,
        })?;

        // Another process may have created it while we waited for the lock.
        if path.exists() {
            debug!(path = %path.display(), "Wallet created concurrently, loading it");
            return read_record(&path);
        }

        let keypair = Keypair::generate()?;
        let record = WalletRecord::from_keypair(&keypair);
        write_record(&path, &record)?;

        info!(
            wallet = %record.public_key,
            path = %path.display(),
            "Created new agent wallet"
        );
        Ok(record)
    }
}

fn validate_agent_id(agent_id: &str) -> Result<(), StoreError> {
    let invalid = agent_id.is_empty()
        || agent_id == "."
        || agent_id.contains("..")
        || agent_id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StoreError::InvalidAgentId(agent_id.to_string()));
    }
    Ok(())
}

fn read_record(path: &Path) -> Result<WalletRecord, StoreError> {
    let data = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record: WalletRecord = serde_json::from_str(&data).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    record
        .validate()
        .map_err(|reason| StoreError::InvalidRecord {
            path: path.to_path_buf(),
            reason,
        })?;

    info!(wallet = %record.public_key, "Loaded existing agent wallet");
    Ok(record)
}

/// Write the record to a private temp file, then publish it with a hard
/// link. Linking never replaces an existing file, and readers that skip the
/// lock only ever see a complete record.
fn write_record(path: &Path, record: &WalletRecord) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(record).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| StoreError::Io { path, source }
    };

    // A stale temp file from a crashed run may carry wider permissions.
    let _ = fs::remove_file(&tmp);
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file: File = options.open(&tmp).map_err(io_err(&tmp))?;
    file.write_all(json.as_bytes()).map_err(io_err(&tmp))?;
    file.sync_all().map_err(io_err(&tmp))?;
    drop(file);

    let linked = fs::hard_link(&tmp, path);
    let _ = fs::remove_file(&tmp);
    match linked {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::InvalidRecord {
            path: path.to_path_buf(),
            reason: "wallet file was created by an unlocked writer; refusing to overwrite"
                .to_string(),
        }),
        Err(e) => Err(io_err(path)(e)),
    }
}
