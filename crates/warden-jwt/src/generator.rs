//! Token generation
//!
//! Output layout depends on what is configured:
//!
//! | signature | encryption | token |
//! |---|---|---|
//! | yes | yes | JWE nesting the JWS (`cty: JWT`) |
//! | yes | no | JWS |
//! | no | yes | JWE over the claims JSON |
//! | no | no | unsecured `alg: none` JWT |

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;
use warden_core::{AuthResult, UserProfile};

use crate::claims::Claims;
use crate::encryption::EncryptionConfiguration;
use crate::jose::{self, NESTED_CONTENT_TYPE};
use crate::profile::claims_from_profile;
use crate::signature::SignatureConfiguration;

/// Produces compact tokens from profiles or raw claims
///
/// # Example
///
/// ```rust
/// use warden_core::UserProfile;
/// use warden_jwt::{JwtGenerator, SecretSignatureConfiguration};
///
/// let generator = JwtGenerator::new()
///     .with_signature(SecretSignatureConfiguration::new("12345678901234567890123456789012")?);
///
/// let profile = UserProfile::new("GitHubProfile", "1234");
/// let token = generator.generate(&profile)?;
/// assert_eq!(token.split('.').count(), 3);
/// # Ok::<(), warden_core::AuthError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct JwtGenerator {
    signature: Option<Arc<dyn SignatureConfiguration>>,
    encryption: Option<Arc<dyn EncryptionConfiguration>>,
    issuer: Option<String>,
    expires_in: Option<Duration>,
}

impl JwtGenerator {
    /// Generator producing unsecured tokens until configured otherwise
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign tokens with `configuration`
    pub fn with_signature(self, configuration: impl SignatureConfiguration + 'static) -> Self {
        self.with_signature_arc(Arc::new(configuration))
    }

    /// Sign tokens with a shared configuration
    pub fn with_signature_arc(mut self, configuration: Arc<dyn SignatureConfiguration>) -> Self {
        self.signature = Some(configuration);
        self
    }

    /// Encrypt tokens with `configuration`
    pub fn with_encryption(self, configuration: impl EncryptionConfiguration + 'static) -> Self {
        self.with_encryption_arc(Arc::new(configuration))
    }

    /// Encrypt tokens with a shared configuration
    pub fn with_encryption_arc(mut self, configuration: Arc<dyn EncryptionConfiguration>) -> Self {
        self.encryption = Some(configuration);
        self
    }

    /// Set `iss` on tokens that do not carry one
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set `exp` to issue time plus `ttl` on tokens that do not carry one
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.expires_in = Some(ttl);
        self
    }

    /// Generate a token for `profile`
    ///
    /// # Errors
    ///
    /// Returns [`warden_core::AuthError::ReservedClaimCollision`] before any
    /// cryptography happens if an attribute uses a reserved claim name,
    /// [`warden_core::AuthError::InvalidConfiguration`] if the profile's typed
    /// id cannot be restored from `sub`, and signing or encryption errors
    /// otherwise.
    pub fn generate(&self, profile: &UserProfile) -> AuthResult<String> {
        let claims = claims_from_profile(profile, Utc::now())?;
        self.generate_claims(claims)
    }

    /// Generate a token from a raw claim set
    ///
    /// Registered claims supplied by the caller are kept as they are; `iat`
    /// and the configured issuer and expiration only fill gaps.
    ///
    /// # Errors
    ///
    /// Returns signing or encryption errors.
    pub fn generate_claims(&self, mut claims: Claims) -> AuthResult<String> {
        let now = Utc::now();
        if !claims.contains(crate::claims::ISSUED_AT) {
            claims.set_issued_at(now);
        }
        if !claims.contains(crate::claims::ISSUER) {
            if let Some(issuer) = &self.issuer {
                claims.set_issuer(issuer.clone());
            }
        }
        if !claims.contains(crate::claims::EXPIRATION_TIME) {
            if let Some(ttl) = self.expires_in {
                claims.set_expiration_time(now + ttl);
            }
        }
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> AuthResult<String> {
        match (&self.signature, &self.encryption) {
            (Some(signature), Some(encryption)) => {
                let signed = signature.sign(claims)?;
                debug!(
                    alg = %signature.algorithm(),
                    key_alg = %encryption.algorithm(),
                    enc = %encryption.method(),
                    "Generating signed and encrypted JWT"
                );
                encryption.encrypt(signed.as_bytes(), Some(NESTED_CONTENT_TYPE))
            }
            (Some(signature), None) => {
                debug!(alg = %signature.algorithm(), "Generating signed JWT");
                signature.sign(claims)
            }
            (None, Some(encryption)) => {
                debug!(
                    key_alg = %encryption.algorithm(),
                    enc = %encryption.method(),
                    "Generating encrypted JWT"
                );
                encryption.encrypt(&claims.to_json()?, None)
            }
            (None, None) => {
                debug!("Generating unsecured JWT");
                jose::encode_unsecured(claims)
            }
        }
    }
}
