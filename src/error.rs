//! Error types for identity provisioning.
//!
//! Only [`IdentityError`] can escape `IdentityManager::initialize`. Registration
//! failures stay attempt-local and are folded into `RegistrationOutcome`.

use std::path::PathBuf;

/// Base58 decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Base58Error {
    #[error("invalid base58 character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },
}

/// Key generation and key material errors.
#[derive(Debug, thiserror::Error)]
pub enum KeyGenError {
    #[error("entropy source unavailable: {0}")]
    Entropy(#[from] rand::Error),

    #[error("secret key does not match public key")]
    KeyMismatch,
}

/// Wallet store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid agent id '{0}': must be non-empty and contain no path separators")]
    InvalidAgentId(String),

    #[error("wallet file I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not lock wallet file {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wallet file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("wallet file {path} failed validation: {reason}")]
    InvalidRecord { path: PathBuf, reason: String },

    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] KeyGenError),
}

/// A single failed registration attempt.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directory returned status {0}")]
    Status(u16),

    #[error("malformed registration response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Fatal initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("key generation failed: {0}")]
    KeyGeneration(KeyGenError),

    #[error("wallet storage failed: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        // Keep key generation distinguishable from storage at the top level.
        match err {
            StoreError::KeyGeneration(e) => Self::KeyGeneration(e),
            other => Self::Storage(other),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {key}: {value} ({reason})")]
    InvalidUrl {
        key: String,
        value: String,
        reason: String,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("settings file I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
