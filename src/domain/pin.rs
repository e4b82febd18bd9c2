//! Wallet PIN hashing.
//!
//! The PIN gates wallet access only; it is not a login credential. The
//! domain layer never stores or compares plaintext, it only talks to this
//! trait.

use sha2::{Digest, Sha256};

use crate::domain::models::transaction::generate_random_suffix;

pub trait PinHasher: Send + Sync {
    fn hash(&self, secret: &str) -> String;
    fn verify(&self, secret: &str, digest: &str) -> bool;
}

/// SHA-256 with a per-digest random salt, stored as `<salt>$<hex>`.
#[derive(Debug, Clone, Default)]
pub struct Sha256PinHasher;

impl Sha256PinHasher {
    fn digest(salt: &str, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl PinHasher for Sha256PinHasher {
    fn hash(&self, secret: &str) -> String {
        let salt = generate_random_suffix(8);
        format!("{}${}", salt, Self::digest(&salt, secret))
    }

    fn verify(&self, secret: &str, digest: &str) -> bool {
        match digest.split_once('$') {
            Some((salt, expected)) => Self::digest(salt, secret) == expected,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hasher = Sha256PinHasher;
        let digest = hasher.hash("4821");
        assert!(hasher.verify("4821", &digest));
        assert!(!hasher.verify("0000", &digest));
    }

    #[test]
    fn test_salting_makes_digests_differ() {
        let hasher = Sha256PinHasher;
        let first = hasher.hash("4821");
        let second = hasher.hash("4821");
        assert_ne!(first, second);
        assert!(hasher.verify("4821", &first));
        assert!(hasher.verify("4821", &second));
    }

    #[test]
    fn test_malformed_digest_never_verifies() {
        let hasher = Sha256PinHasher;
        assert!(!hasher.verify("4821", "no-separator-here"));
    }
}
