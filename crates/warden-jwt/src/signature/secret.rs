//! HMAC signature configuration

use std::fmt;

use jsonwebtoken::{DecodingKey, EncodingKey};
use secrecy::{ExposeSecret, SecretString};
use warden_core::{AuthError, AuthResult};

use super::{JwsAlgorithm, SignatureConfiguration, sign_with, verify_with};
use crate::claims::Claims;

/// Shared-secret (HMAC) signature configuration
///
/// The secret must be at least as long as the hash output:
/// 32 bytes for HS256, 48 for HS384 and 64 for HS512.
///
/// The secret is only held inside the `jsonwebtoken` key objects, which do
/// not zeroize their copy on drop.
pub struct SecretSignatureConfiguration {
    algorithm: JwsAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SecretSignatureConfiguration {
    /// HS256 configuration
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the secret is shorter than 32 bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> AuthResult<Self> {
        Self::with_algorithm(secret, JwsAlgorithm::HS256)
    }

    /// Configuration for any HMAC algorithm
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if `algorithm` is not an
    /// HMAC algorithm or the secret is too short for it.
    pub fn with_algorithm(secret: impl AsRef<[u8]>, algorithm: JwsAlgorithm) -> AuthResult<Self> {
        let secret = secret.as_ref();
        let minimum = min_secret_len(algorithm).ok_or_else(|| {
            AuthError::invalid_configuration(format!("{algorithm} is not an HMAC algorithm"))
        })?;
        if secret.len() < minimum {
            return Err(AuthError::invalid_configuration(format!(
                "{algorithm} requires a secret of at least {minimum} bytes, got {}",
                secret.len()
            )));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Configuration from a secret held in a [`SecretString`]
    ///
    /// # Errors
    ///
    /// Same as [`SecretSignatureConfiguration::with_algorithm`].
    pub fn from_secret_string(secret: &SecretString, algorithm: JwsAlgorithm) -> AuthResult<Self> {
        Self::with_algorithm(secret.expose_secret().as_bytes(), algorithm)
    }
}

fn min_secret_len(algorithm: JwsAlgorithm) -> Option<usize> {
    match algorithm {
        JwsAlgorithm::HS256 => Some(32),
        JwsAlgorithm::HS384 => Some(48),
        JwsAlgorithm::HS512 => Some(64),
        _ => None,
    }
}

impl SignatureConfiguration for SecretSignatureConfiguration {
    fn algorithm(&self) -> JwsAlgorithm {
        self.algorithm
    }

    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        sign_with(self.algorithm, &self.encoding_key, claims)
    }

    fn verify(&self, token: &str) -> AuthResult<Claims> {
        verify_with(self.algorithm, &self.decoding_key, token)
    }
}

impl fmt::Debug for SecretSignatureConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSignatureConfiguration")
            .field("algorithm", &self.algorithm)
            .field("secret", &"<redacted>")
            .finish()
    }
}
