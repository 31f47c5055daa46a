//! Cryptographic operations for attestations
//!
//! This module provides:
//! - Ed25519 key pair generation, signing, and verification
//! - The attestor registry mapping counterpart system IDs to verifying keys
//! - SHA-256 digests binding an attestation to a specific trade

use crate::{Error, Result};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Ed25519 key pair for signing attestations
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let signing_key = SigningKey::from_bytes(&rand::random::<[u8; 32]>());
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Get public key bytes
    pub fn public_key(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> crate::types::Signature {
        let signature = self.signing_key.sign(message);
        crate::types::Signature::from_bytes(signature.to_bytes())
    }

    /// Verify a signature
    pub fn verify(&self, message: &[u8], signature: &crate::types::Signature) -> Result<()> {
        let dalek_sig = DalekSignature::from_bytes(signature.as_bytes());
        self.verifying_key
            .verify(message, &dalek_sig)
            .map_err(|e| Error::Attestation(format!("Verification failed: {}", e)))
    }
}

/// Registry of attesting identities and their verifying keys
///
/// Maps a counterpart system ID (or party name) to the Ed25519 key expected
/// to have produced its attestations. Key distribution itself is out of
/// scope; the registry is populated at wiring time.
#[derive(Debug, Default)]
pub struct AttestorRegistry {
    keys: RwLock<HashMap<String, VerifyingKey>>,
}

impl AttestorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attestor's public key
    pub fn register(&self, attestor: impl Into<String>, public_key: [u8; 32]) -> Result<()> {
        let key = VerifyingKey::from_bytes(&public_key)
            .map_err(|e| Error::Attestation(format!("Invalid public key: {}", e)))?;
        self.keys.write().insert(attestor.into(), key);
        Ok(())
    }

    /// Check whether an attestor is registered
    pub fn contains(&self, attestor: &str) -> bool {
        self.keys.read().contains_key(attestor)
    }

    /// Verify a signature against the key registered for `attestor`
    pub fn verify(
        &self,
        attestor: &str,
        message: &[u8],
        signature: &crate::types::Signature,
    ) -> Result<()> {
        let keys = self.keys.read();
        let key = keys
            .get(attestor)
            .ok_or_else(|| Error::Attestation(format!("No registered attestor: {}", attestor)))?;

        let dalek_sig = DalekSignature::from_bytes(signature.as_bytes());
        key.verify(message, &dalek_sig).map_err(|_| {
            Error::Attestation(format!("Attestation from {} failed verification", attestor))
        })
    }
}

/// Digest bound to a specific trade and attestation payload
///
/// Attestations sign `SHA-256(trade_id || 0x00 || encoded_info)` so a proof
/// produced for one trade cannot be replayed against another.
pub fn attestation_digest(trade_id: &str, encoded_info: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(trade_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(encoded_info.as_bytes());
    hasher.finalize().into()
}

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let keypair = KeyPair::generate();
        assert_eq!(keypair.public_key().len(), 32);
    }

    #[test]
    fn test_keypair_from_seed() {
        let seed = [42u8; 32];
        let keypair1 = KeyPair::from_seed(&seed);
        let keypair2 = KeyPair::from_seed(&seed);

        // Same seed should produce same keys
        assert_eq!(keypair1.public_key(), keypair2.public_key());
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let message = b"test message";

        let signature = keypair.sign(message);
        assert!(keypair.verify(message, &signature).is_ok());

        let wrong_message = b"wrong message";
        assert!(keypair.verify(wrong_message, &signature).is_err());
    }

    #[test]
    fn test_registry_verify() {
        let keypair = KeyPair::generate();
        let registry = AttestorRegistry::new();
        registry.register("ledger-b", keypair.public_key()).unwrap();

        let digest = attestation_digest("trade-123", "settlement-leg-1");
        let signature = keypair.sign(&digest);

        assert!(registry.verify("ledger-b", &digest, &signature).is_ok());
        assert!(registry.verify("ledger-c", &digest, &signature).is_err());

        let other = attestation_digest("trade-999", "settlement-leg-1");
        assert!(registry.verify("ledger-b", &other, &signature).is_err());
    }

    #[test]
    fn test_attestation_digest_binds_trade() {
        let a = attestation_digest("trade-1", "info");
        let b = attestation_digest("trade-2", "info");
        let c = attestation_digest("trade-1", "info");

        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_hash_bytes() {
        let hash1 = hash_bytes(b"data");
        let hash2 = hash_bytes(b"data");
        let hash3 = hash_bytes(b"other");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }
}
