//! Password hashing.
//!
//! Hashes are PBKDF2-HMAC-SHA256, stored as
//! `pbkdf2-sha256$<iterations>$<salt-hex>$<digest-hex>`. Verification
//! recomputes the digest with the stored parameters and compares in constant
//! time. Both directions are CPU-bound; async callers run them on the
//! blocking pool.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const DEFAULT_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
const SCHEME: &str = "pbkdf2-sha256";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("malformed password hash")]
    Malformed,

    #[error("unsupported password hash scheme: {0}")]
    UnsupportedScheme(String),
}

/// An encoded password hash. `Debug` never prints the digest.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `password` with a fresh random salt.
    pub fn generate(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self::with_params(password, &salt, DEFAULT_ITERATIONS)
    }

    pub fn with_params(password: &str, salt: &[u8], iterations: u32) -> Self {
        let digest = derive(password.as_bytes(), salt, iterations);
        Self(format!(
            "{SCHEME}${iterations}${}${}",
            to_hex(salt),
            to_hex(&digest)
        ))
    }

    /// Parse a stored encoding without checking any password against it.
    pub fn parse(encoded: &str) -> Result<Self, CredentialError> {
        decode(encoded)?;
        Ok(Self(encoded.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn verify(&self, password: &str) -> Result<bool, CredentialError> {
        let (iterations, salt, expected) = decode(&self.0)?;
        let actual = derive(password.as_bytes(), &salt, iterations);
        Ok(actual[..].ct_eq(&expected[..]).into())
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; DIGEST_LEN] {
    let mut digest = [0u8; DIGEST_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations.max(1), &mut digest);
    digest
}

fn decode(encoded: &str) -> Result<(u32, Vec<u8>, Vec<u8>), CredentialError> {
    let mut parts = encoded.split('$');
    let scheme = parts.next().ok_or(CredentialError::Malformed)?;
    if scheme != SCHEME {
        return Err(CredentialError::UnsupportedScheme(scheme.to_string()));
    }
    let iterations: u32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .ok_or(CredentialError::Malformed)?;
    let salt = parts.next().and_then(from_hex).ok_or(CredentialError::Malformed)?;
    let digest = parts
        .next()
        .and_then(from_hex)
        .filter(|d| d.len() == DIGEST_LEN)
        .ok_or(CredentialError::Malformed)?;
    if parts.next().is_some() {
        return Err(CredentialError::Malformed);
    }
    Ok((iterations, salt, digest))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}
