//! Elliptic-curve (ES256) signature configuration

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{DecodingKey, EncodingKey};
use p256::SecretKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::EncodePrivateKey;
use rand::rngs::OsRng;
use warden_core::{AuthError, AuthResult};

use super::{JwsAlgorithm, SignatureConfiguration, sign_with, verify_with};
use crate::claims::Claims;

/// ECDSA P-256 signature configuration
///
/// Built either from a key pair (sign and verify) or from a public key only
/// (verify only).
#[derive(Clone)]
pub struct EcSignatureConfiguration {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
}

impl EcSignatureConfiguration {
    /// Generate a fresh P-256 key pair
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if the key cannot be encoded.
    pub fn generate() -> AuthResult<Self> {
        let secret_key = SecretKey::random(&mut OsRng);
        Self::from_secret_key(&secret_key)
    }

    /// Configuration from an existing P-256 secret key
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if the key cannot be converted.
    pub fn from_secret_key(secret_key: &SecretKey) -> AuthResult<Self> {
        // jsonwebtoken expects PKCS#8 DER for EC signing keys
        let pkcs8_der = secret_key
            .to_pkcs8_der()
            .map_err(|e| AuthError::Crypto(format!("cannot convert EC key to PKCS#8: {e}")))?;
        let encoding_key = EncodingKey::from_ec_der(pkcs8_der.as_bytes());

        let point = secret_key.public_key().to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(AuthError::Crypto(
                "EC public key has no affine coordinates".to_string(),
            ));
        };
        let decoding_key = Self::decoding_key_from_components(
            &URL_SAFE_NO_PAD.encode(x),
            &URL_SAFE_NO_PAD.encode(y),
        )?;

        Ok(Self {
            encoding_key: Some(encoding_key),
            decoding_key,
        })
    }

    /// Configuration from PEM-encoded private (PKCS#8) and public keys
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if either PEM is not a valid EC key.
    pub fn from_pem(private_key_pem: &str, public_key_pem: &str) -> AuthResult<Self> {
        let encoding_key = EncodingKey::from_ec_pem(private_key_pem.as_bytes()).map_err(|e| {
            AuthError::invalid_configuration(format!("invalid EC private key: {e}"))
        })?;
        let mut config = Self::from_public_pem(public_key_pem)?;
        config.encoding_key = Some(encoding_key);
        Ok(config)
    }

    /// Verify-only configuration from a PEM-encoded public key
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the PEM is not a valid EC public key.
    pub fn from_public_pem(public_key_pem: &str) -> AuthResult<Self> {
        let decoding_key = DecodingKey::from_ec_pem(public_key_pem.as_bytes()).map_err(|e| {
            AuthError::invalid_configuration(format!("invalid EC public key: {e}"))
        })?;
        Ok(Self {
            encoding_key: None,
            decoding_key,
        })
    }

    /// Verify-only configuration from base64url affine coordinates (JWK `x`/`y`)
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the coordinates are invalid.
    pub fn from_public_components(x: &str, y: &str) -> AuthResult<Self> {
        Ok(Self {
            encoding_key: None,
            decoding_key: Self::decoding_key_from_components(x, y)?,
        })
    }

    /// Whether this configuration holds a private key
    pub fn can_sign(&self) -> bool {
        self.encoding_key.is_some()
    }

    fn decoding_key_from_components(x: &str, y: &str) -> AuthResult<DecodingKey> {
        DecodingKey::from_ec_components(x, y).map_err(|e| {
            AuthError::invalid_configuration(format!("invalid EC public key components: {e}"))
        })
    }
}

impl SignatureConfiguration for EcSignatureConfiguration {
    fn algorithm(&self) -> JwsAlgorithm {
        JwsAlgorithm::ES256
    }

    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        let key = self.encoding_key.as_ref().ok_or_else(|| {
            AuthError::invalid_configuration("EC configuration has no private key to sign with")
        })?;
        sign_with(JwsAlgorithm::ES256, key, claims)
    }

    fn verify(&self, token: &str) -> AuthResult<Claims> {
        verify_with(JwsAlgorithm::ES256, &self.decoding_key, token)
    }
}

impl fmt::Debug for EcSignatureConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcSignatureConfiguration")
            .field("algorithm", &JwsAlgorithm::ES256)
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::pkcs8::{EncodePublicKey, LineEnding};
    use warden_core::ErrorKind;

    fn claims() -> Claims {
        let mut claims = Claims::new();
        claims.set_subject("JwtProfile:bob");
        claims
    }

    #[test]
    fn test_generated_key_signs_and_verifies() {
        let config = EcSignatureConfiguration::generate().unwrap();
        assert!(config.can_sign());
        let token = config.sign(&claims()).unwrap();
        assert_eq!(config.verify(&token).unwrap(), claims());
    }

    #[test]
    fn test_other_key_fails_verification() {
        let signer = EcSignatureConfiguration::generate().unwrap();
        let verifier = EcSignatureConfiguration::generate().unwrap();
        let token = signer.sign(&claims()).unwrap();

        let error = verifier.verify(&token).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::VerificationFailed);
    }

    #[test]
    fn test_pem_key_pair() {
        let secret_key = SecretKey::random(&mut OsRng);
        let private_pem = secret_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let public_pem = secret_key
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();

        let signer = EcSignatureConfiguration::from_pem(&private_pem, &public_pem).unwrap();
        let verifier = EcSignatureConfiguration::from_public_pem(&public_pem).unwrap();
        assert!(!verifier.can_sign());

        let token = signer.sign(&claims()).unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), claims());
    }

    #[test]
    fn test_verify_only_cannot_sign() {
        let secret_key = SecretKey::random(&mut OsRng);
        let public_pem = secret_key
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        let verifier = EcSignatureConfiguration::from_public_pem(&public_pem).unwrap();

        let error = verifier.sign(&claims()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_invalid_pem_rejected() {
        let error = EcSignatureConfiguration::from_public_pem("not a pem").unwrap_err();
        assert!(error.is_configuration_error());
    }
}
