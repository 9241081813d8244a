//! Declarative configuration
//!
//! [`JwtConfig`] describes keys and algorithms in any serde format and builds
//! a matching [`JwtGenerator`] or [`JwtAuthenticator`]. Secrets are held in
//! [`SecretString`] and only exposed while the key objects are constructed.
//!
//! ```json
//! {
//!   "signatures": [
//!     { "type": "secret", "secret": "12345678901234567890123456789012", "algorithm": "HS256" }
//!   ],
//!   "encryptions": [
//!     { "type": "secret", "secret": "02ez4f7dsq==drrdz54z---++-6ef78=" }
//!   ],
//!   "issuer": "https://auth.example.com",
//!   "expires_in_secs": 3600
//! }
//! ```

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use warden_core::{AuthError, AuthResult};

use crate::authenticator::{JwtAuthenticator, JwtAuthenticatorBuilder};
use crate::encryption::{
    ContentEncryption, EncryptionConfiguration, KeyManagementAlgorithm,
    SecretEncryptionConfiguration,
};
use crate::generator::JwtGenerator;
use crate::signature::{
    EcSignatureConfiguration, JwsAlgorithm, RsaSignatureConfiguration,
    SecretSignatureConfiguration, SignatureConfiguration,
};

/// Complete JWT engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtConfig {
    /// Signature configurations in selection order; the first one signs
    #[serde(default)]
    pub signatures: Vec<SignatureConfig>,
    /// Encryption configurations in selection order; the first one encrypts
    #[serde(default)]
    pub encryptions: Vec<EncryptionConfig>,
    /// Reject unsigned tokens
    #[serde(default)]
    pub require_signature: bool,
    /// Profile type for subjects without a type prefix
    #[serde(default)]
    pub default_profile_type: Option<String>,
    /// Issuer written into generated tokens
    #[serde(default)]
    pub issuer: Option<String>,
    /// Lifetime of generated tokens in seconds
    #[serde(default)]
    pub expires_in_secs: Option<u64>,
}

/// One signature configuration entry
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignatureConfig {
    /// HMAC shared secret
    Secret {
        /// Shared secret (UTF-8 bytes are the key)
        #[serde(deserialize_with = "deserialize_secret")]
        secret: SecretString,
        /// HMAC algorithm
        #[serde(default = "default_hmac_algorithm")]
        algorithm: JwsAlgorithm,
    },
    /// ES256 key pair or public key
    Ec {
        /// PKCS#8 PEM private key; omit for verify-only
        #[serde(default, deserialize_with = "deserialize_optional_secret")]
        private_key_pem: Option<SecretString>,
        /// SPKI PEM public key
        public_key_pem: String,
    },
    /// RSA key pair or public key
    Rsa {
        /// RS* or PS* algorithm
        #[serde(default = "default_rsa_algorithm")]
        algorithm: JwsAlgorithm,
        /// PEM private key; omit for verify-only
        #[serde(default, deserialize_with = "deserialize_optional_secret")]
        private_key_pem: Option<SecretString>,
        /// PEM public key
        public_key_pem: String,
    },
}

/// One encryption configuration entry
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncryptionConfig {
    /// Shared secret
    Secret {
        /// Shared secret (UTF-8 bytes are the key)
        #[serde(deserialize_with = "deserialize_secret")]
        secret: SecretString,
        /// Key management algorithm
        #[serde(default = "default_key_management")]
        algorithm: KeyManagementAlgorithm,
        /// Content encryption method
        #[serde(default = "default_content_encryption")]
        method: ContentEncryption,
    },
}

fn default_hmac_algorithm() -> JwsAlgorithm {
    JwsAlgorithm::HS256
}

fn default_rsa_algorithm() -> JwsAlgorithm {
    JwsAlgorithm::RS256
}

fn default_key_management() -> KeyManagementAlgorithm {
    KeyManagementAlgorithm::Dir
}

fn default_content_encryption() -> ContentEncryption {
    ContentEncryption::A256Gcm
}

// Custom deserialization for SecretString
fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}

fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(s.map(SecretString::new))
}

impl SignatureConfig {
    /// Build the configuration object
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] for unusable keys.
    pub fn build(&self) -> AuthResult<Arc<dyn SignatureConfiguration>> {
        Ok(match self {
            Self::Secret { secret, algorithm } => Arc::new(
                SecretSignatureConfiguration::from_secret_string(secret, *algorithm)?,
            ),
            Self::Ec {
                private_key_pem: Some(private_key_pem),
                public_key_pem,
            } => Arc::new(EcSignatureConfiguration::from_pem(
                private_key_pem.expose_secret(),
                public_key_pem,
            )?),
            Self::Ec {
                private_key_pem: None,
                public_key_pem,
            } => Arc::new(EcSignatureConfiguration::from_public_pem(public_key_pem)?),
            Self::Rsa {
                algorithm,
                private_key_pem: Some(private_key_pem),
                public_key_pem,
            } => Arc::new(RsaSignatureConfiguration::from_pem(
                *algorithm,
                private_key_pem.expose_secret(),
                public_key_pem,
            )?),
            Self::Rsa {
                algorithm,
                private_key_pem: None,
                public_key_pem,
            } => Arc::new(RsaSignatureConfiguration::from_public_pem(
                *algorithm,
                public_key_pem,
            )?),
        })
    }
}

impl EncryptionConfig {
    /// Build the configuration object
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the secret does not fit
    /// the algorithm pair.
    pub fn build(&self) -> AuthResult<Arc<dyn EncryptionConfiguration>> {
        match self {
            Self::Secret {
                secret,
                algorithm,
                method,
            } => Ok(Arc::new(SecretEncryptionConfiguration::from_secret_string(
                secret, *algorithm, *method,
            )?)),
        }
    }
}

impl JwtConfig {
    /// Parse a JSON configuration document
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the document does not match.
    pub fn from_json(json: &str) -> AuthResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            AuthError::invalid_configuration(format!("invalid JWT configuration: {e}"))
        })
    }

    /// Build an authenticator holding every configured key
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] for unusable keys.
    pub fn build_authenticator(&self) -> AuthResult<JwtAuthenticator> {
        let mut builder: JwtAuthenticatorBuilder =
            JwtAuthenticator::builder().require_signature(self.require_signature);
        if let Some(profile_type) = &self.default_profile_type {
            builder = builder.default_profile_type(profile_type.as_str());
        }
        for signature in &self.signatures {
            builder = builder.signature_arc(signature.build()?);
        }
        for encryption in &self.encryptions {
            builder = builder.encryption_arc(encryption.build()?);
        }
        Ok(builder.build())
    }

    /// Build a generator using the first signature and encryption entries
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] for unusable keys.
    pub fn build_generator(&self) -> AuthResult<JwtGenerator> {
        let mut generator = JwtGenerator::new();
        if let Some(signature) = self.signatures.first() {
            generator = generator.with_signature_arc(signature.build()?);
        }
        if let Some(encryption) = self.encryptions.first() {
            generator = generator.with_encryption_arc(encryption.build()?);
        }
        if let Some(issuer) = &self.issuer {
            generator = generator.with_issuer(issuer.clone());
        }
        if let Some(seconds) = self.expires_in_secs {
            let seconds = i64::try_from(seconds).map_err(|_| {
                AuthError::invalid_configuration("expires_in_secs is out of range")
            })?;
            let ttl = chrono::Duration::try_seconds(seconds).ok_or_else(|| {
                AuthError::invalid_configuration("expires_in_secs is out of range")
            })?;
            generator = generator.expires_in(ttl);
        }
        Ok(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use warden_core::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = JwtConfig::from_json(
            r#"{
                "signatures": [{ "type": "secret", "secret": "12345678901234567890123456789012" }],
                "encryptions": [{ "type": "secret", "secret": "02ez4f7dsq==drrdz54z---++-6ef78=" }]
            }"#,
        )
        .unwrap();

        let authenticator = config.build_authenticator().unwrap();
        let signatures = authenticator.signature_configurations();
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[0].algorithm(), JwsAlgorithm::HS256);

        let encryptions = authenticator.encryption_configurations();
        assert_eq!(encryptions[0].algorithm(), KeyManagementAlgorithm::Dir);
        assert_eq!(encryptions[0].method(), ContentEncryption::A256Gcm);
    }

    #[test]
    fn test_explicit_algorithms() {
        let config = JwtConfig::from_json(
            r#"{
                "signatures": [{
                    "type": "secret",
                    "secret": "123456789012345678901234567890123456789012345678",
                    "algorithm": "HS384"
                }],
                "encryptions": [{
                    "type": "secret",
                    "secret": "0123456789abcdef",
                    "algorithm": "A128KW",
                    "method": "A128CBC-HS256"
                }],
                "require_signature": true
            }"#,
        )
        .unwrap();
        assert!(config.require_signature);

        let authenticator = config.build_authenticator().unwrap();
        assert_eq!(
            authenticator.signature_configurations()[0].algorithm(),
            JwsAlgorithm::HS384
        );
        assert!(authenticator.encryption_configurations()[0].supports("A128KW", "A128CBC-HS256"));
    }

    #[test]
    fn test_bad_secret_reported_at_build() {
        let config = JwtConfig::from_json(
            r#"{ "signatures": [{ "type": "secret", "secret": "short" }] }"#,
        )
        .unwrap();
        let error = config.build_authenticator().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_unknown_entry_type() {
        let error = JwtConfig::from_json(r#"{ "signatures": [{ "type": "hsm" }] }"#).unwrap_err();
        assert!(error.is_configuration_error());
    }

    #[test]
    fn test_secrets_not_in_debug_output() {
        let config = JwtConfig::from_json(
            r#"{ "signatures": [{ "type": "secret", "secret": "12345678901234567890123456789012" }] }"#,
        )
        .unwrap();
        assert!(!format!("{config:?}").contains("12345678901234567890123456789012"));
    }

    #[test]
    fn test_generator_settings() {
        let config =
            JwtConfig::from_json(r#"{ "issuer": "warden", "expires_in_secs": 60 }"#).unwrap();
        let generator = config.build_generator().unwrap();
        let authenticator = config.build_authenticator().unwrap();

        let claims = crate::claims::Claims::from_iter([("sub", "alice")]);
        let token = generator.generate_claims(claims).unwrap();
        let claims = authenticator.validate_token_and_get_claims(&token).unwrap();
        assert_eq!(claims.issuer(), Some("warden"));
        assert!(claims.expiration_time().unwrap().is_some());
    }
}
