//! Shared-secret encryption configuration

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use warden_core::{AuthError, AuthResult};
use zeroize::Zeroizing;

use super::{ContentEncryption, EncryptionConfiguration, KeyManagementAlgorithm, content, key_wrap};
use crate::jose::{EncryptedToken, JoseHeader, encode_segment};

/// JWE configuration keyed by a shared secret
///
/// With `dir` the secret is the content encryption key and must match the
/// method's key size (32 bytes for the default `A256GCM`, 64 for
/// `A256CBC-HS512`). With `A*KW` the secret is the key-encryption key and a
/// fresh content key is generated per token.
pub struct SecretEncryptionConfiguration {
    secret: Zeroizing<Vec<u8>>,
    algorithm: KeyManagementAlgorithm,
    method: ContentEncryption,
}

impl SecretEncryptionConfiguration {
    /// `dir` + `A256GCM` configuration
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] unless the secret is 32 bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> AuthResult<Self> {
        Self::with_parameters(secret, KeyManagementAlgorithm::Dir, ContentEncryption::A256Gcm)
    }

    /// Configuration for an explicit (`alg`, `enc`) pair
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the secret length does not
    /// fit the algorithm pair.
    pub fn with_parameters(
        secret: impl AsRef<[u8]>,
        algorithm: KeyManagementAlgorithm,
        method: ContentEncryption,
    ) -> AuthResult<Self> {
        let secret = secret.as_ref();
        let expected = algorithm.key_len().unwrap_or(method.key_len());
        if secret.len() != expected {
            return Err(AuthError::invalid_configuration(format!(
                "{algorithm} with {method} requires a {expected}-byte secret, got {}",
                secret.len()
            )));
        }
        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
            algorithm,
            method,
        })
    }

    /// Configuration from a secret held in a [`SecretString`]
    ///
    /// # Errors
    ///
    /// Same as [`SecretEncryptionConfiguration::with_parameters`].
    pub fn from_secret_string(
        secret: &SecretString,
        algorithm: KeyManagementAlgorithm,
        method: ContentEncryption,
    ) -> AuthResult<Self> {
        Self::with_parameters(secret.expose_secret().as_bytes(), algorithm, method)
    }

    fn content_key(&self, token: &EncryptedToken) -> AuthResult<Zeroizing<Vec<u8>>> {
        match self.algorithm {
            KeyManagementAlgorithm::Dir => {
                if !token.encrypted_key.is_empty() {
                    return Err(AuthError::malformed(
                        "direct encryption must not carry an encrypted key",
                    ));
                }
                Ok(self.secret.clone())
            }
            _ => key_wrap::unwrap(self.algorithm, &self.secret, &token.encrypted_key)
                .map(Zeroizing::new),
        }
    }
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

impl EncryptionConfiguration for SecretEncryptionConfiguration {
    fn algorithm(&self) -> KeyManagementAlgorithm {
        self.algorithm
    }

    fn method(&self) -> ContentEncryption {
        self.method
    }

    fn encrypt(&self, payload: &[u8], content_type: Option<&str>) -> AuthResult<String> {
        let mut header = JoseHeader::new(self.algorithm.as_str());
        header.enc = Some(self.method.as_str().to_string());
        header.cty = content_type.map(str::to_string);
        let protected = header.encode()?;

        let (cek, encrypted_key) = match self.algorithm {
            KeyManagementAlgorithm::Dir => (self.secret.clone(), Vec::new()),
            _ => {
                let cek = Zeroizing::new(random_bytes(self.method.key_len()));
                let wrapped = key_wrap::wrap(self.algorithm, &self.secret, &cek)?;
                (cek, wrapped)
            }
        };
        let iv = random_bytes(self.method.iv_len());
        let sealed = content::seal(self.method, &cek, &iv, protected.as_bytes(), payload)?;

        Ok(format!(
            "{protected}.{}.{}.{}.{}",
            encode_segment(&encrypted_key),
            encode_segment(&iv),
            encode_segment(&sealed.ciphertext),
            encode_segment(&sealed.tag)
        ))
    }

    fn decrypt(&self, token: &EncryptedToken) -> AuthResult<Vec<u8>> {
        let cek = self.content_key(token)?;
        let payload = content::open(
            self.method,
            &cek,
            &token.iv,
            token.protected.as_bytes(),
            &token.ciphertext,
            &token.tag,
        )?;
        debug!(
            algorithm = %self.algorithm,
            method = %self.method,
            payload_len = payload.len(),
            "JWE decrypted"
        );
        Ok(payload)
    }
}

impl fmt::Debug for SecretEncryptionConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretEncryptionConfiguration")
            .field("algorithm", &self.algorithm)
            .field("method", &self.method)
            .field("secret", &"<redacted>")
            .finish()
    }
}
