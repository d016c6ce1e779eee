//! Digest utilities for the SHA-IN / SHA-OUT parameter signatures.

use std::collections::BTreeMap;

use super::params;
use crate::{
    configs::HashAlgorithm,
    errors::{CryptoError, CustomResult},
};

/// Trait for generating a digest for SHA
pub trait GenerateDigest {
    /// takes a message and creates a digest for it
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, CryptoError>;
}

/// Secure Hash Algorithm 1, kept for merchants with legacy SHA-1 accounts
#[derive(Debug)]
pub struct Sha1;

/// Secure Hash Algorithm 256
#[derive(Debug)]
pub struct Sha256;

/// Secure Hash Algorithm 512
#[derive(Debug)]
pub struct Sha512;

impl GenerateDigest for Sha1 {
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        let digest = ring::digest::digest(&ring::digest::SHA1_FOR_LEGACY_USE_ONLY, message);
        Ok(digest.as_ref().to_vec())
    }
}

impl GenerateDigest for Sha256 {
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        let digest = ring::digest::digest(&ring::digest::SHA256, message);
        Ok(digest.as_ref().to_vec())
    }
}

impl GenerateDigest for Sha512 {
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        let digest = ring::digest::digest(&ring::digest::SHA512, message);
        Ok(digest.as_ref().to_vec())
    }
}

impl GenerateDigest for HashAlgorithm {
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        match self {
            Self::Sha1 => Sha1.generate_digest(message),
            Self::Sha256 => Sha256.generate_digest(message),
            Self::Sha512 => Sha512.generate_digest(message),
        }
    }
}

/// Compute the uppercase hex signature over a parameter set.
///
/// Parameters are taken in ascending key order; the signature parameter
/// itself and empty values never enter the digest. The passphrase follows
/// every single `KEY=value` pair, as the gateway specifies for both SHA-IN
/// and SHA-OUT.
pub fn hashed_signature(
    parameters: &BTreeMap<String, String>,
    passphrase: &str,
    algorithm: HashAlgorithm,
) -> CustomResult<String, CryptoError> {
    let payload = parameters
        .iter()
        .filter(|(key, value)| key.as_str() != params::SIGNATURE && !value.is_empty())
        .map(|(key, value)| format!("{key}={value}{passphrase}"))
        .collect::<String>();

    let digest = algorithm.generate_digest(payload.as_bytes())?;
    Ok(hex::encode(digest).to_uppercase())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn sha1_digest_matches_known_vector() {
        let digest = Sha1.generate_digest(b"abc").unwrap();
        assert_eq!(hex::encode(digest), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn sha256_digest_matches_known_vector() {
        let digest = Sha256.generate_digest(b"abc").unwrap();
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha512_digest_matches_known_vector() {
        let digest = Sha512.generate_digest(b"abc").unwrap();
        assert_eq!(
            hex::encode(digest),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    fn parameters() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("ORDERID".to_string(), "2467".to_string()),
            ("AMOUNT".to_string(), "2000".to_string()),
            ("CURRENCY".to_string(), "CHF".to_string()),
            ("PSPID".to_string(), "Gridonic_TEST".to_string()),
        ])
    }

    #[test]
    fn signature_is_uppercase_hex_of_the_configured_digest() {
        let signature = hashed_signature(&parameters(), "S3cr3t!", HashAlgorithm::Sha1).unwrap();
        assert_eq!(signature.len(), 40);
        assert_eq!(signature, signature.to_uppercase());
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

        let sha512 = hashed_signature(&parameters(), "S3cr3t!", HashAlgorithm::Sha512).unwrap();
        assert_eq!(sha512.len(), 128);
    }

    #[test]
    fn signature_is_deterministic_and_key_sensitive() {
        let base = hashed_signature(&parameters(), "S3cr3t!", HashAlgorithm::Sha256).unwrap();
        assert_eq!(
            base,
            hashed_signature(&parameters(), "S3cr3t!", HashAlgorithm::Sha256).unwrap()
        );

        let mut tampered = parameters();
        tampered.insert("AMOUNT".to_string(), "2001".to_string());
        assert_ne!(
            base,
            hashed_signature(&tampered, "S3cr3t!", HashAlgorithm::Sha256).unwrap()
        );

        assert_ne!(
            base,
            hashed_signature(&parameters(), "other-passphrase", HashAlgorithm::Sha256).unwrap()
        );
    }

    #[test]
    fn empty_values_and_the_signature_field_do_not_enter_the_digest() {
        let base = hashed_signature(&parameters(), "S3cr3t!", HashAlgorithm::Sha256).unwrap();

        let mut padded = parameters();
        padded.insert("BRAND".to_string(), String::new());
        padded.insert(params::SIGNATURE.to_string(), "ABCDEF".to_string());
        assert_eq!(
            base,
            hashed_signature(&padded, "S3cr3t!", HashAlgorithm::Sha256).unwrap()
        );
    }
}
