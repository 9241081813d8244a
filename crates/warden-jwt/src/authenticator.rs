//! Token authentication
//!
//! [`JwtAuthenticator`] detects the token structure, decrypts and verifies it
//! against its registries, enforces expiration and builds a profile.
//!
//! Configuration selection tries every registered configuration that supports
//! the header's algorithm, in registration order, and keeps the first that
//! succeeds. A token signed with the second of two HMAC keys is therefore
//! accepted; a token whose algorithm nobody supports is reported differently
//! from one whose signature nobody can verify.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use tracing::{debug, info, warn};
use warden_core::{
    AuthError, AuthResult, Authenticator, Credentials, ProfileType, RequestContext, UserProfile,
};

use crate::claims::Claims;
use crate::encryption::EncryptionConfiguration;
use crate::jose::{CompactToken, EncryptedToken, SignedToken};
use crate::profile::{DEFAULT_PROFILE_TYPE, profile_from_claims};
use crate::signature::SignatureConfiguration;

/// Validates compact tokens and resolves them into profiles
///
/// Registries are fixed at [`JwtAuthenticatorBuilder::build`]; to change keys
/// at runtime swap the whole authenticator through [`ReloadableAuthenticator`].
///
/// # Example
///
/// ```rust
/// use warden_core::{Authenticator, Credentials, EmptyContext, UserProfile};
/// use warden_jwt::{JwtAuthenticator, JwtGenerator, SecretSignatureConfiguration};
///
/// const SECRET: &str = "12345678901234567890123456789012";
///
/// let generator = JwtGenerator::new().with_signature(SecretSignatureConfiguration::new(SECRET)?);
/// let token = generator.generate(&UserProfile::new("GitHubProfile", "1234"))?;
///
/// let authenticator = JwtAuthenticator::builder()
///     .signature(SecretSignatureConfiguration::new(SECRET)?)
///     .build();
///
/// let mut credentials = Credentials::new(token, "HeaderClient");
/// authenticator.validate(&mut credentials, &EmptyContext)?;
/// assert_eq!(credentials.profile().unwrap().typed_id(), "GitHubProfile:1234");
/// # Ok::<(), warden_core::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuthenticator {
    signatures: Vec<Arc<dyn SignatureConfiguration>>,
    encryptions: Vec<Arc<dyn EncryptionConfiguration>>,
    require_signature: bool,
    default_profile_type: ProfileType,
}

impl Default for JwtAuthenticator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl JwtAuthenticator {
    /// Start configuring an authenticator
    pub fn builder() -> JwtAuthenticatorBuilder {
        JwtAuthenticatorBuilder::default()
    }

    /// Registered signature configurations, in selection order
    pub fn signature_configurations(&self) -> &[Arc<dyn SignatureConfiguration>] {
        &self.signatures
    }

    /// Registered encryption configurations, in selection order
    pub fn encryption_configurations(&self) -> &[Arc<dyn EncryptionConfiguration>] {
        &self.encryptions
    }

    /// Validate `token` and build the profile it describes
    ///
    /// # Errors
    ///
    /// Any [`AuthError`] of the token taxonomy; see
    /// [`JwtAuthenticator::validate_token_and_get_claims`].
    pub fn validate_token(&self, token: &str) -> AuthResult<UserProfile> {
        let claims = self.validate_token_and_get_claims(token)?;
        let profile = profile_from_claims(&claims, &self.default_profile_type)?;
        debug!(typed_id = %profile.typed_id(), "JWT authenticated");
        Ok(profile)
    }

    /// Validate `token` and return its claims without building a profile
    ///
    /// # Errors
    ///
    /// - [`AuthError::Malformed`] for unparseable tokens
    /// - [`AuthError::NoMatchingEncryptionAlgorithm`] if no configuration decrypts a JWE
    /// - [`AuthError::NoMatchingSignatureAlgorithm`] if no configuration handles the JWS `alg`
    /// - [`AuthError::VerificationFailed`] if no matching configuration verifies the signature
    /// - [`AuthError::SignatureRequired`] for unsigned tokens when signatures are required
    /// - [`AuthError::Expired`] if `exp` is at or before now
    pub fn validate_token_and_get_claims(&self, token: &str) -> AuthResult<Claims> {
        let claims = match CompactToken::parse(token)? {
            CompactToken::Unsecured(claims) => self.accept_unsigned(claims)?,
            CompactToken::Signed(jws) => self.verify(&jws)?,
            CompactToken::Encrypted(jwe) => {
                let payload = self.decrypt(&jwe)?;
                self.open_payload(&jwe, &payload)?
            }
        };
        check_expiration(&claims)?;
        Ok(claims)
    }

    fn open_payload(&self, jwe: &EncryptedToken, payload: &[u8]) -> AuthResult<Claims> {
        let looks_like_json = payload
            .iter()
            .find(|byte| !byte.is_ascii_whitespace())
            .is_some_and(|byte| *byte == b'{');
        if looks_like_json && !jwe.header.is_nested() {
            return self.accept_unsigned(Claims::from_json(payload)?);
        }

        let inner = std::str::from_utf8(payload)
            .map_err(|_| AuthError::malformed("decrypted payload is neither JSON nor a JWT"))?;
        match CompactToken::parse(inner)? {
            CompactToken::Signed(jws) => self.verify(&jws),
            CompactToken::Unsecured(claims) => self.accept_unsigned(claims),
            CompactToken::Encrypted(_) => Err(AuthError::malformed(
                "nested encryption is not supported",
            )),
        }
    }

    fn accept_unsigned(&self, claims: Claims) -> AuthResult<Claims> {
        if self.require_signature {
            warn!("Rejecting JWT without signature");
            return Err(AuthError::SignatureRequired);
        }
        Ok(claims)
    }

    fn verify(&self, jws: &SignedToken<'_>) -> AuthResult<Claims> {
        let algorithm = jws.algorithm();
        let mut supported = false;

        for (index, configuration) in self.signatures.iter().enumerate() {
            if !configuration.supports(algorithm) {
                continue;
            }
            supported = true;
            match configuration.verify(jws.compact) {
                Ok(claims) => {
                    debug!(alg = %algorithm, index, "JWT signature verified");
                    return Ok(claims);
                }
                Err(AuthError::VerificationFailed { .. }) => {
                    debug!(
                        alg = %algorithm,
                        index,
                        "Signature configuration did not verify JWT, trying next"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        if supported {
            warn!(alg = %algorithm, "JWT signature verification failed");
            Err(AuthError::VerificationFailed {
                algorithm: algorithm.to_string(),
            })
        } else {
            warn!(alg = %algorithm, "No signature configuration for JWT algorithm");
            Err(AuthError::NoMatchingSignatureAlgorithm {
                algorithm: algorithm.to_string(),
            })
        }
    }

    fn decrypt(&self, jwe: &EncryptedToken) -> AuthResult<Vec<u8>> {
        let (algorithm, method) = (jwe.algorithm(), jwe.method());

        for (index, configuration) in self.encryptions.iter().enumerate() {
            if !configuration.supports(algorithm, method) {
                continue;
            }
            match configuration.decrypt(jwe) {
                Ok(payload) => return Ok(payload),
                Err(error) => {
                    debug!(
                        alg = %algorithm,
                        enc = %method,
                        index,
                        error = %error,
                        "Encryption configuration did not decrypt JWT, trying next"
                    );
                }
            }
        }

        warn!(alg = %algorithm, enc = %method, "No encryption configuration decrypted JWT");
        Err(AuthError::NoMatchingEncryptionAlgorithm {
            algorithm: algorithm.to_string(),
            method: method.to_string(),
        })
    }
}

fn check_expiration(claims: &Claims) -> AuthResult<()> {
    if let Some(expires_at) = claims.expiration_time()? {
        if expires_at <= Utc::now() {
            warn!(exp = %expires_at, "Rejecting expired JWT");
            return Err(AuthError::Expired { expires_at });
        }
    }
    Ok(())
}

impl Authenticator for JwtAuthenticator {
    fn validate(
        &self,
        credentials: &mut Credentials,
        _context: &dyn RequestContext,
    ) -> AuthResult<()> {
        let mut profile = self.validate_token(credentials.token())?;
        profile.set_client_name(credentials.client_name());
        credentials.set_profile(profile);
        Ok(())
    }
}

/// Builder for [`JwtAuthenticator`]
#[derive(Debug, Clone)]
pub struct JwtAuthenticatorBuilder {
    signatures: Vec<Arc<dyn SignatureConfiguration>>,
    encryptions: Vec<Arc<dyn EncryptionConfiguration>>,
    require_signature: bool,
    default_profile_type: ProfileType,
}

impl Default for JwtAuthenticatorBuilder {
    fn default() -> Self {
        Self {
            signatures: Vec::new(),
            encryptions: Vec::new(),
            require_signature: false,
            default_profile_type: ProfileType::new(DEFAULT_PROFILE_TYPE),
        }
    }
}

impl JwtAuthenticatorBuilder {
    /// Register a signature configuration after those already registered
    pub fn signature(self, configuration: impl SignatureConfiguration + 'static) -> Self {
        self.signature_arc(Arc::new(configuration))
    }

    /// Register a shared signature configuration
    pub fn signature_arc(mut self, configuration: Arc<dyn SignatureConfiguration>) -> Self {
        self.signatures.push(configuration);
        self
    }

    /// Register an encryption configuration after those already registered
    pub fn encryption(self, configuration: impl EncryptionConfiguration + 'static) -> Self {
        self.encryption_arc(Arc::new(configuration))
    }

    /// Register a shared encryption configuration
    pub fn encryption_arc(mut self, configuration: Arc<dyn EncryptionConfiguration>) -> Self {
        self.encryptions.push(configuration);
        self
    }

    /// Reject tokens that carry no signature (default: accept them)
    pub fn require_signature(mut self, required: bool) -> Self {
        self.require_signature = required;
        self
    }

    /// Profile type for subjects without a type prefix (default: `JwtProfile`)
    pub fn default_profile_type(mut self, profile_type: impl Into<ProfileType>) -> Self {
        self.default_profile_type = profile_type.into();
        self
    }

    /// Freeze the registries
    pub fn build(self) -> JwtAuthenticator {
        debug!(
            signatures = self.signatures.len(),
            encryptions = self.encryptions.len(),
            require_signature = self.require_signature,
            "JWT authenticator configured"
        );
        JwtAuthenticator {
            signatures: self.signatures,
            encryptions: self.encryptions,
            require_signature: self.require_signature,
            default_profile_type: self.default_profile_type,
        }
    }
}

/// Authenticator whose configuration can be replaced while in use
///
/// Each validation runs against one consistent snapshot; a reload swaps the
/// whole authenticator atomically and never mutates the one in use.
#[derive(Debug)]
pub struct ReloadableAuthenticator {
    current: ArcSwap<JwtAuthenticator>,
}

impl ReloadableAuthenticator {
    /// Wrap an initial authenticator
    pub fn new(authenticator: JwtAuthenticator) -> Self {
        Self {
            current: ArcSwap::from_pointee(authenticator),
        }
    }

    /// Snapshot of the authenticator currently in use
    pub fn current(&self) -> Arc<JwtAuthenticator> {
        self.current.load_full()
    }

    /// Replace the authenticator used by subsequent validations
    pub fn reload(&self, authenticator: JwtAuthenticator) {
        info!(
            signatures = authenticator.signatures.len(),
            encryptions = authenticator.encryptions.len(),
            "Reloading JWT authenticator configuration"
        );
        self.current.store(Arc::new(authenticator));
    }
}

impl Authenticator for ReloadableAuthenticator {
    fn validate(
        &self,
        credentials: &mut Credentials,
        context: &dyn RequestContext,
    ) -> AuthResult<()> {
        self.current.load().validate(credentials, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jose::{JoseHeader, encode_segment};
    use crate::signature::SecretSignatureConfiguration;
    use warden_core::{EmptyContext, ErrorKind};

    const MAC_SECRET: &str = "12345678901234567890123456789012";

    fn plain_token(json: &str) -> String {
        let header = JoseHeader::new("none").encode().unwrap();
        format!("{header}.{}.", encode_segment(json))
    }

    #[test]
    fn test_unknown_algorithm_is_named() {
        let header = JoseHeader::new("ES512").encode().unwrap();
        let token = format!("{header}.{}.c2ln", encode_segment(r#"{"sub":"x"}"#));
        let authenticator = JwtAuthenticator::builder()
            .signature(SecretSignatureConfiguration::new(MAC_SECRET).unwrap())
            .build();

        let error = authenticator.validate_token(&token).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NoMatchingSignatureAlgorithm);
        assert!(error.to_string().contains("ES512"));
    }

    #[test]
    fn test_plain_token_accepted_by_default() {
        let authenticator = JwtAuthenticator::default();
        let profile = authenticator
            .validate_token(&plain_token(r#"{"sub":"alice"}"#))
            .unwrap();
        assert_eq!(profile.typed_id(), "JwtProfile:alice");
    }

    #[test]
    fn test_require_signature() {
        let authenticator = JwtAuthenticator::builder().require_signature(true).build();
        let error = authenticator
            .validate_token(&plain_token(r#"{"sub":"alice"}"#))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SignatureRequired);
    }

    #[test]
    fn test_expired_exactly_now_or_before() {
        let authenticator = JwtAuthenticator::default();
        let token = plain_token(r#"{"sub":"alice","exp":1000}"#);
        match authenticator.validate_token(&token).unwrap_err() {
            AuthError::Expired { expires_at } => assert_eq!(expires_at.timestamp(), 1000),
            other => panic!("expected Expired, got {other}"),
        }
    }

    #[test]
    fn test_default_profile_type_is_configurable() {
        let authenticator = JwtAuthenticator::builder()
            .default_profile_type("ApiProfile")
            .build();
        let profile = authenticator
            .validate_token(&plain_token(r#"{"sub":"svc-7"}"#))
            .unwrap();
        assert_eq!(profile.typed_id(), "ApiProfile:svc-7");
    }

    #[test]
    fn test_validate_stamps_client_name() {
        let authenticator = JwtAuthenticator::default();
        let mut credentials = Credentials::new(plain_token(r#"{"sub":"alice"}"#), "CookieClient");
        authenticator
            .validate(&mut credentials, &EmptyContext)
            .unwrap();
        assert_eq!(
            credentials.profile().and_then(UserProfile::client_name),
            Some("CookieClient")
        );
    }

    #[test]
    fn test_reload_swaps_configuration() {
        let reloadable = ReloadableAuthenticator::new(JwtAuthenticator::default());
        let token = plain_token(r#"{"sub":"alice"}"#);

        let mut credentials = Credentials::new(token.clone(), "client");
        reloadable.validate(&mut credentials, &EmptyContext).unwrap();

        reloadable.reload(JwtAuthenticator::builder().require_signature(true).build());
        let mut credentials = Credentials::new(token, "client");
        let error = reloadable
            .validate(&mut credentials, &EmptyContext)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SignatureRequired);
        assert!(credentials.profile().is_none());
    }
}
