//! Encryption configurations (JWE)
//!
//! A configuration is bound to one key management algorithm (`alg`) and one
//! content encryption method (`enc`). Content encryption is authenticated in
//! every mode: AES-GCM natively, AES-CBC through the HMAC-SHA2 composite of
//! RFC 7518 section 5.2.

mod content;
mod key_wrap;
mod secret;

use std::fmt::{self, Debug};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_core::{AuthError, AuthResult};

use crate::jose::EncryptedToken;

pub use self::secret::SecretEncryptionConfiguration;

/// Key management algorithm (`alg` header of a JWE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyManagementAlgorithm {
    /// The shared secret is the content encryption key
    #[serde(rename = "dir")]
    Dir,
    /// AES-128 key wrap of a random content encryption key
    A128KW,
    /// AES-192 key wrap of a random content encryption key
    A192KW,
    /// AES-256 key wrap of a random content encryption key
    A256KW,
}

impl KeyManagementAlgorithm {
    /// Wire identifier
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dir => "dir",
            Self::A128KW => "A128KW",
            Self::A192KW => "A192KW",
            Self::A256KW => "A256KW",
        }
    }

    /// Key-encryption key length in bytes, `None` for direct encryption
    pub fn key_len(self) -> Option<usize> {
        match self {
            Self::Dir => None,
            Self::A128KW => Some(16),
            Self::A192KW => Some(24),
            Self::A256KW => Some(32),
        }
    }
}

impl fmt::Display for KeyManagementAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyManagementAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dir" => Ok(Self::Dir),
            "A128KW" => Ok(Self::A128KW),
            "A192KW" => Ok(Self::A192KW),
            "A256KW" => Ok(Self::A256KW),
            other => Err(AuthError::invalid_configuration(format!(
                "unsupported JWE key management algorithm: {other}"
            ))),
        }
    }
}

/// Content encryption method (`enc` header of a JWE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentEncryption {
    /// AES-128 in GCM mode
    #[serde(rename = "A128GCM")]
    A128Gcm,
    /// AES-192 in GCM mode
    #[serde(rename = "A192GCM")]
    A192Gcm,
    /// AES-256 in GCM mode
    #[serde(rename = "A256GCM")]
    A256Gcm,
    /// AES-128-CBC with HMAC-SHA-256
    #[serde(rename = "A128CBC-HS256")]
    A128CbcHs256,
    /// AES-192-CBC with HMAC-SHA-384
    #[serde(rename = "A192CBC-HS384")]
    A192CbcHs384,
    /// AES-256-CBC with HMAC-SHA-512
    #[serde(rename = "A256CBC-HS512")]
    A256CbcHs512,
}

impl ContentEncryption {
    /// Wire identifier
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
            Self::A128CbcHs256 => "A128CBC-HS256",
            Self::A192CbcHs384 => "A192CBC-HS384",
            Self::A256CbcHs512 => "A256CBC-HS512",
        }
    }

    /// Content encryption key length in bytes
    ///
    /// CBC-HS keys hold the MAC key followed by the encryption key.
    pub fn key_len(self) -> usize {
        match self {
            Self::A128Gcm => 16,
            Self::A192Gcm => 24,
            Self::A256Gcm => 32,
            Self::A128CbcHs256 => 32,
            Self::A192CbcHs384 => 48,
            Self::A256CbcHs512 => 64,
        }
    }

    /// Initialization vector length in bytes
    pub fn iv_len(self) -> usize {
        if self.is_gcm() { 12 } else { 16 }
    }

    /// AES-GCM family
    pub fn is_gcm(self) -> bool {
        matches!(self, Self::A128Gcm | Self::A192Gcm | Self::A256Gcm)
    }
}

impl fmt::Display for ContentEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentEncryption {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A128GCM" => Ok(Self::A128Gcm),
            "A192GCM" => Ok(Self::A192Gcm),
            "A256GCM" => Ok(Self::A256Gcm),
            "A128CBC-HS256" => Ok(Self::A128CbcHs256),
            "A192CBC-HS384" => Ok(Self::A192CbcHs384),
            "A256CBC-HS512" => Ok(Self::A256CbcHs512),
            other => Err(AuthError::invalid_configuration(format!(
                "unsupported JWE content encryption: {other}"
            ))),
        }
    }
}

/// Encrypter and decrypter bound to one (`alg`, `enc`) pair
///
/// Implementations are immutable once built and shared between threads.
pub trait EncryptionConfiguration: Send + Sync + Debug {
    /// Key management algorithm
    fn algorithm(&self) -> KeyManagementAlgorithm;

    /// Content encryption method
    fn method(&self) -> ContentEncryption;

    /// Whether this configuration handles tokens with the given header pair
    fn supports(&self, algorithm: &str, method: &str) -> bool {
        self.algorithm().as_str() == algorithm && self.method().as_str() == method
    }

    /// Encrypt `payload` into a compact JWE
    ///
    /// `content_type` becomes the `cty` header (`"JWT"` for nested tokens).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if encryption fails.
    fn encrypt(&self, payload: &[u8], content_type: Option<&str>) -> AuthResult<String>;

    /// Decrypt a parsed JWE and return its payload
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::VerificationFailed`] if the key does not fit or the
    /// authentication tag does not match, and [`AuthError::Malformed`] for
    /// segments of the wrong size.
    fn decrypt(&self, token: &EncryptedToken) -> AuthResult<Vec<u8>>;
}
