//! Authentication error taxonomy
//!
//! Every failure raised by a Warden authenticator or generator maps to exactly
//! one [`AuthError`] variant. Callers match on [`AuthError::kind`] (or on the
//! variant itself); the `Display` output of each variant starts with a fixed
//! prefix so log-based matching stays stable as well.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication and token-processing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token does not parse into a recognized compact structure, or its
    /// decoded content is not a usable claim set.
    #[error("Cannot decrypt / parse JWT: {reason}")]
    Malformed {
        /// What was wrong with the token
        reason: String,
    },

    /// No registered signature configuration handles the header's `alg`.
    #[error("No signature algorithm found for JWT: alg={algorithm}")]
    NoMatchingSignatureAlgorithm {
        /// Algorithm identifier taken from the token header
        algorithm: String,
    },

    /// No registered encryption configuration both supports the header's
    /// (`alg`, `enc`) pair and decrypts the token.
    #[error("No encryption algorithm found for JWT: alg={algorithm}, enc={method}")]
    NoMatchingEncryptionAlgorithm {
        /// Key management algorithm taken from the token header
        algorithm: String,
        /// Content encryption method taken from the token header
        method: String,
    },

    /// A configuration supports the algorithm but the signature does not verify.
    #[error("JWT verification failed: alg={algorithm}")]
    VerificationFailed {
        /// Algorithm identifier taken from the token header
        algorithm: String,
    },

    /// The expiration claim is at or before the verification instant.
    #[error("Token expired: exp={expires_at}")]
    Expired {
        /// Expiration time carried by the token
        expires_at: DateTime<Utc>,
    },

    /// A profile attribute uses a claim name managed by the token engine.
    #[error("Attribute not allowed: {claim}")]
    ReservedClaimCollision {
        /// The offending attribute key
        claim: String,
    },

    /// An unsigned token was presented to an authenticator that requires signatures.
    #[error("A non-signed JWT cannot be accepted: signatures are required")]
    SignatureRequired,

    /// Key material or algorithm settings are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A cryptographic primitive failed while producing a token.
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// Stable, copyable tag identifying the failure class of an [`AuthError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`AuthError::Malformed`]
    Malformed,
    /// See [`AuthError::NoMatchingSignatureAlgorithm`]
    NoMatchingSignatureAlgorithm,
    /// See [`AuthError::NoMatchingEncryptionAlgorithm`]
    NoMatchingEncryptionAlgorithm,
    /// See [`AuthError::VerificationFailed`]
    VerificationFailed,
    /// See [`AuthError::Expired`]
    Expired,
    /// See [`AuthError::ReservedClaimCollision`]
    ReservedClaimCollision,
    /// See [`AuthError::SignatureRequired`]
    SignatureRequired,
    /// See [`AuthError::InvalidConfiguration`]
    InvalidConfiguration,
    /// See [`AuthError::Crypto`]
    Crypto,
}

impl AuthError {
    /// Shorthand for [`AuthError::Malformed`]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`AuthError::InvalidConfiguration`]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Failure class tag for pattern matching
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::NoMatchingSignatureAlgorithm { .. } => ErrorKind::NoMatchingSignatureAlgorithm,
            Self::NoMatchingEncryptionAlgorithm { .. } => ErrorKind::NoMatchingEncryptionAlgorithm,
            Self::VerificationFailed { .. } => ErrorKind::VerificationFailed,
            Self::Expired { .. } => ErrorKind::Expired,
            Self::ReservedClaimCollision { .. } => ErrorKind::ReservedClaimCollision,
            Self::SignatureRequired => ErrorKind::SignatureRequired,
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::Crypto(_) => ErrorKind::Crypto,
        }
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Malformed => "malformed",
            ErrorKind::NoMatchingSignatureAlgorithm => "no_signature_algorithm",
            ErrorKind::NoMatchingEncryptionAlgorithm => "no_encryption_algorithm",
            ErrorKind::VerificationFailed => "verification_failed",
            ErrorKind::Expired => "expired",
            ErrorKind::ReservedClaimCollision => "reserved_claim_collision",
            ErrorKind::SignatureRequired => "signature_required",
            ErrorKind::InvalidConfiguration => "invalid_configuration",
            ErrorKind::Crypto => "crypto",
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Always `false`: every failure here is a property of the token or of the
    /// configuration. Retry policy belongs to the transport layer.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Programmer or deployment mistakes, as opposed to bad client input
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ReservedClaimCollision { .. } | Self::InvalidConfiguration(_)
        )
    }
}
