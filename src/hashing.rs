//! Salted hashing of generated secrets for storage, and verification against
//! a stored hash.
//!
//! Only [`HashAlgorithm::Pbkdf2`] is suitable for storing passwords; the
//! digest algorithms are single-pass and exist for interoperability.
use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use md5::Md5;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

pub const PBKDF2_ITERATIONS: u32 = 100_000;
/// Derived key length for PBKDF2, in bytes.
pub const PBKDF2_KEY_LEN: usize = 32;
/// Random bytes in a generated salt (hex-encoded to twice this length).
pub const SALT_BYTES: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Pbkdf2,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
        HashAlgorithm::Pbkdf2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Pbkdf2 => "pbkdf2",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = s.trim().to_ascii_lowercase();
        HashAlgorithm::ALL
            .into_iter()
            .find(|a| a.name() == folded)
            .ok_or_else(|| HashError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// A stored hash together with what is needed to verify it later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashInfo {
    pub algorithm: HashAlgorithm,
    pub salt: String,
    /// Hex for digest algorithms, base64 for PBKDF2.
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
}

pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash `password` with `salt`, generating a fresh salt when none (or an
/// empty one) is given.
pub fn hash_password(password: &str, algorithm: HashAlgorithm, salt: Option<&str>) -> HashInfo {
    let salt = match salt {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => generate_salt(),
    };
    let hash = compute(password, &salt, algorithm);
    log::debug!("hashed secret with {}", algorithm);
    HashInfo {
        algorithm,
        salt,
        hash,
        timestamp: Utc::now(),
        iterations: (algorithm == HashAlgorithm::Pbkdf2).then_some(PBKDF2_ITERATIONS),
    }
}

/// Recompute and compare in constant time. Any mismatch in encoding or
/// length is simply a failed verification.
pub fn verify_password(
    password: &str,
    expected: &str,
    salt: &str,
    algorithm: HashAlgorithm,
) -> bool {
    let actual = compute(password, salt, algorithm);
    actual.as_bytes().ct_eq(expected.trim().as_bytes()).into()
}

pub fn verify_hash_info(password: &str, info: &HashInfo) -> bool {
    verify_password(password, &info.hash, &info.salt, info.algorithm)
}

fn compute(password: &str, salt: &str, algorithm: HashAlgorithm) -> String {
    let mut salted = Vec::with_capacity(salt.len() + password.len());
    salted.extend_from_slice(salt.as_bytes());
    salted.extend_from_slice(password.as_bytes());
    match algorithm {
        HashAlgorithm::Md5 => hex::encode(Md5::digest(&salted)),
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(&salted)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(&salted)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(&salted)),
        HashAlgorithm::Pbkdf2 => {
            let mut key = [0u8; PBKDF2_KEY_LEN];
            pbkdf2::pbkdf2_hmac::<Sha256>(
                password.as_bytes(),
                salt.as_bytes(),
                PBKDF2_ITERATIONS,
                &mut key,
            );
            STANDARD.encode(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_algorithm_names() {
        assert_eq!("SHA256".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha256));
        assert_eq!(" pbkdf2 ".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Pbkdf2));
        assert_eq!(
            "bcrypt".parse::<HashAlgorithm>(),
            Err(HashError::UnsupportedAlgorithm("bcrypt".into()))
        );
    }

    #[test]
    fn digest_is_salt_then_password() {
        let info = hash_password("c", HashAlgorithm::Sha256, Some("ab"));
        assert_eq!(
            info.hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(info.iterations, None);
        let md5 = hash_password("bc", HashAlgorithm::Md5, Some("a"));
        assert_eq!(md5.hash, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn missing_salt_is_generated() {
        let a = hash_password("secret", HashAlgorithm::Sha1, None);
        let b = hash_password("secret", HashAlgorithm::Sha1, Some(""));
        assert_eq!(a.salt.len(), SALT_BYTES * 2);
        assert!(a.salt.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn pbkdf2_round_trips_through_verify() {
        let info = hash_password("Zq7#xvK2!mR9", HashAlgorithm::Pbkdf2, Some("pepper"));
        assert_eq!(info.iterations, Some(PBKDF2_ITERATIONS));
        assert!(STANDARD.decode(&info.hash).is_ok_and(|k| k.len() == PBKDF2_KEY_LEN));
        assert!(verify_hash_info("Zq7#xvK2!mR9", &info));
        assert!(!verify_hash_info("Zq7#xvK2!mR8", &info));
    }

    #[test]
    fn verification_fails_on_malformed_input() {
        assert!(!verify_password("x", "", "salt", HashAlgorithm::Sha512));
        assert!(!verify_password("x", "not hex at all", "salt", HashAlgorithm::Md5));
    }

    #[test]
    fn hash_info_serializes_lowercase_algorithm() {
        let info = hash_password("x", HashAlgorithm::Sha512, Some("s"));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["algorithm"], "sha512");
        assert!(json.get("iterations").is_none());
        let back: HashInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }
}
