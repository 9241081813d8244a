//! # Warden JWT - Token Generation and Authentication
//!
//! Issues and validates JSON Web Tokens carrying a [`warden_core::UserProfile`].
//! Tokens may be unsecured, signed (JWS), encrypted (JWE) or signed then
//! encrypted, and the authenticator recognizes all four shapes.
//!
//! ## Architecture
//!
//! - [`claims`] - Claim set with typed accessors for registered claims
//! - [`jose`] - Compact serialization and header handling
//! - [`signature`] - HMAC, ECDSA and RSA signature configurations
//! - [`encryption`] - Shared-secret JWE (`dir`, `A*KW`) with GCM and CBC-HMAC
//! - [`profile`] - Mapping between profiles and claim sets
//! - [`generator`] - `JwtGenerator`
//! - [`authenticator`] - `JwtAuthenticator` and its hot-reloadable wrapper
//! - [`config`] - Declarative configuration building both sides
//!
//! ## Quick Start
//!
//! ```rust
//! use warden_core::UserProfile;
//! use warden_jwt::{
//!     JwtAuthenticator, JwtGenerator, SecretEncryptionConfiguration,
//!     SecretSignatureConfiguration,
//! };
//!
//! const MAC_SECRET: &str = "12345678901234567890123456789012";
//! const ENC_SECRET: &str = "02ez4f7dsq==drrdz54z---++-6ef78=";
//!
//! let generator = JwtGenerator::new()
//!     .with_signature(SecretSignatureConfiguration::new(MAC_SECRET)?)
//!     .with_encryption(SecretEncryptionConfiguration::new(ENC_SECRET)?);
//!
//! let mut profile = UserProfile::new("FacebookProfile", "12345");
//! profile.add_roles(["admin".to_string()]);
//! let token = generator.generate(&profile)?;
//!
//! let authenticator = JwtAuthenticator::builder()
//!     .signature(SecretSignatureConfiguration::new(MAC_SECRET)?)
//!     .encryption(SecretEncryptionConfiguration::new(ENC_SECRET)?)
//!     .build();
//!
//! let restored = authenticator.validate_token(&token)?;
//! assert_eq!(restored.typed_id(), "FacebookProfile:12345");
//! assert!(restored.has_role("admin"));
//! # Ok::<(), warden_core::AuthError>(())
//! ```
//!
//! ## Security Notes
//!
//! - Expiration is always enforced; `nbf` and `aud` are exposed but not checked
//! - Encryption secrets are zeroized on drop; signing keys live inside
//!   `jsonwebtoken` key objects, which do not zeroize. All key material is
//!   redacted from `Debug` output
//! - Tag and MAC comparisons run in constant time

pub mod authenticator;
pub mod claims;
pub mod config;
pub mod encryption;
pub mod generator;
pub mod jose;
pub mod profile;
pub mod signature;

#[doc(inline)]
pub use authenticator::{JwtAuthenticator, JwtAuthenticatorBuilder, ReloadableAuthenticator};
#[doc(inline)]
pub use claims::Claims;
#[doc(inline)]
pub use config::{EncryptionConfig, JwtConfig, SignatureConfig};
#[doc(inline)]
pub use encryption::{
    ContentEncryption, EncryptionConfiguration, KeyManagementAlgorithm,
    SecretEncryptionConfiguration,
};
#[doc(inline)]
pub use generator::JwtGenerator;
#[doc(inline)]
pub use profile::{DEFAULT_PROFILE_TYPE, JwtProfileExt};
#[doc(inline)]
pub use signature::{
    EcSignatureConfiguration, JwsAlgorithm, RsaSignatureConfiguration,
    SecretSignatureConfiguration, SignatureConfiguration,
};
