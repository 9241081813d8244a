//! Signature configurations (JWS)
//!
//! Each configuration signs with exactly one [`JwsAlgorithm`] and verifies
//! tokens whose header names that algorithm. Key handling is delegated to
//! `jsonwebtoken`; this module only chooses keys and maps its errors onto the
//! Warden taxonomy.

mod ec;
mod rsa;
mod secret;

use std::fmt::{self, Debug};
use std::str::FromStr;

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_core::{AuthError, AuthResult};

use crate::claims::Claims;

pub use self::ec::EcSignatureConfiguration;
pub use self::rsa::RsaSignatureConfiguration;
pub use self::secret::SecretSignatureConfiguration;

/// JWS algorithms a configuration can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JwsAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
    /// ECDSA using P-256 and SHA-256
    ES256,
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
    /// RSASSA-PSS using SHA-256
    PS256,
    /// RSASSA-PSS using SHA-384
    PS384,
    /// RSASSA-PSS using SHA-512
    PS512,
}

impl JwsAlgorithm {
    /// Wire identifier, as found in the `alg` header
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::ES256 => "ES256",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
        }
    }

    /// HMAC family
    pub fn is_hmac(self) -> bool {
        matches!(self, Self::HS256 | Self::HS384 | Self::HS512)
    }

    /// RSA family (PKCS#1 v1.5 and PSS)
    pub fn is_rsa(self) -> bool {
        matches!(
            self,
            Self::RS256 | Self::RS384 | Self::RS512 | Self::PS256 | Self::PS384 | Self::PS512
        )
    }

    /// Equivalent `jsonwebtoken` algorithm
    pub fn to_jwt(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
            Self::ES256 => Algorithm::ES256,
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::RS512 => Algorithm::RS512,
            Self::PS256 => Algorithm::PS256,
            Self::PS384 => Algorithm::PS384,
            Self::PS512 => Algorithm::PS512,
        }
    }
}

impl fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JwsAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            "ES256" => Ok(Self::ES256),
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            "PS256" => Ok(Self::PS256),
            "PS384" => Ok(Self::PS384),
            "PS512" => Ok(Self::PS512),
            other => Err(AuthError::invalid_configuration(format!(
                "unsupported JWS algorithm: {other}"
            ))),
        }
    }
}

/// Signer and verifier bound to one JWS algorithm
///
/// Implementations are immutable once built and shared between threads.
pub trait SignatureConfiguration: Send + Sync + Debug {
    /// Algorithm used to sign and accepted when verifying
    fn algorithm(&self) -> JwsAlgorithm;

    /// Whether this configuration handles tokens whose header names `algorithm`
    fn supports(&self, algorithm: &str) -> bool {
        self.algorithm().as_str() == algorithm
    }

    /// Sign `claims` into a compact JWS
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the configuration cannot
    /// sign (verify-only keys) and [`AuthError::Crypto`] if signing fails.
    fn sign(&self, claims: &Claims) -> AuthResult<String>;

    /// Verify a compact JWS and return its claims
    ///
    /// Temporal claims are not checked here.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::VerificationFailed`] if the signature does not match
    /// and [`AuthError::Malformed`] if the token cannot be decoded.
    fn verify(&self, token: &str) -> AuthResult<Claims>;
}

pub(crate) fn sign_with(
    algorithm: JwsAlgorithm,
    key: &EncodingKey,
    claims: &Claims,
) -> AuthResult<String> {
    encode(&Header::new(algorithm.to_jwt()), claims, key).map_err(|e| {
        debug!(algorithm = %algorithm, error = %e, "JWS signing failed");
        AuthError::Crypto(format!("cannot sign JWT with {algorithm}: {e}"))
    })
}

pub(crate) fn verify_with(
    algorithm: JwsAlgorithm,
    key: &DecodingKey,
    token: &str,
) -> AuthResult<Claims> {
    let mut validation = Validation::new(algorithm.to_jwt());
    // Expiration is enforced by the authenticator, strictly and without leeway
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(algorithm = %algorithm, error = %e, "JWS verification failed");
            match e.kind() {
                JwtErrorKind::InvalidToken
                | JwtErrorKind::Base64(_)
                | JwtErrorKind::Json(_)
                | JwtErrorKind::Utf8(_) => {
                    AuthError::malformed(format!("cannot decode signed JWT: {e}"))
                }
                _ => AuthError::VerificationFailed {
                    algorithm: algorithm.to_string(),
                },
            }
        })
}
