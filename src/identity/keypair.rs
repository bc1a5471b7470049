//! Ed25519 keypair generation for agent identity.
//!
//! The exported secret key follows the Solana convention: the 32-byte seed
//! followed by the 32-byte public key, 64 bytes in total.

use ed25519_dalek::SigningKey;
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::zeroize::Zeroize;

use super::base58;
use crate::error::KeyGenError;

/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of the exported secret key (seed ‖ public key).
pub const SECRET_KEY_LEN: usize = 64;

/// An Ed25519 signing keypair.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new keypair from the OS CSPRNG.
    ///
    /// Entropy failure is returned, never retried.
    pub fn generate() -> Result<Self, KeyGenError> {
        let mut seed = [0u8; 32];
        OsRng.try_fill_bytes(&mut seed)?;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Ok(Self { signing_key })
    }

    /// Rebuild a keypair from a 64-byte exported secret key.
    ///
    /// The trailing public key must match the one derived from the seed.
    pub fn from_secret_key_bytes(bytes: &[u8; SECRET_KEY_LEN]) -> Result<Self, KeyGenError> {
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();

        if signing_key.verifying_key().as_bytes()[..] != bytes[32..] {
            return Err(KeyGenError::KeyMismatch);
        }
        Ok(Self { signing_key })
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Seed followed by public key.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LEN] {
        self.signing_key.to_keypair_bytes()
    }

    /// Base58 public key, i.e. the wallet address.
    pub fn public_key_base58(&self) -> String {
        base58::encode(&self.public_key())
    }

    pub fn secret_key_base58(&self) -> String {
        let mut bytes = self.secret_key_bytes();
        let encoded = base58::encode(&bytes);
        bytes.zeroize();
        encoded
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_base58())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_solana_shaped_keys() {
        let kp = Keypair::generate().unwrap();
        let secret = kp.secret_key_bytes();
        assert_eq!(&secret[32..], &kp.public_key()[..]);

        let wallet = kp.public_key_base58();
        assert_eq!(base58::decode(&wallet).unwrap().len(), PUBLIC_KEY_LEN);
        assert_eq!(
            base58::decode(&kp.secret_key_base58()).unwrap().len(),
            SECRET_KEY_LEN
        );
    }

    #[test]
    fn two_generated_keypairs_differ() {
        let a = Keypair::generate().unwrap();
        let b = Keypair::generate().unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn from_secret_key_bytes_round_trips() {
        let kp = Keypair::generate().unwrap();
        let restored = Keypair::from_secret_key_bytes(&kp.secret_key_bytes()).unwrap();
        assert_eq!(restored.public_key(), kp.public_key());
    }

    #[test]
    fn from_secret_key_bytes_rejects_mismatched_public_key() {
        let kp = Keypair::generate().unwrap();
        let mut bytes = kp.secret_key_bytes();
        bytes[40] ^= 0xff;
        assert!(matches!(
            Keypair::from_secret_key_bytes(&bytes),
            Err(KeyGenError::KeyMismatch)
        ));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::generate().unwrap();
        let debug = format!("{kp:?}");
        assert!(debug.contains(&kp.public_key_base58()));
        assert!(!debug.contains(&kp.secret_key_base58()));
    }
}
