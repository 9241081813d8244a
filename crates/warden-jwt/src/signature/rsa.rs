//! RSA (RS* and PS*) signature configuration

use std::fmt;

use ::rsa::pkcs1::EncodeRsaPrivateKey;
use ::rsa::traits::PublicKeyParts;
use ::rsa::{RsaPrivateKey, RsaPublicKey};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::rngs::OsRng;
use warden_core::{AuthError, AuthResult};

use super::{JwsAlgorithm, SignatureConfiguration, sign_with, verify_with};
use crate::claims::Claims;

/// Smallest modulus accepted when generating keys
const MIN_GENERATED_BITS: usize = 2048;

/// RSA signature configuration for RS256/384/512 and PS256/384/512
#[derive(Clone)]
pub struct RsaSignatureConfiguration {
    algorithm: JwsAlgorithm,
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
}

impl RsaSignatureConfiguration {
    /// Generate a fresh key pair of `bits` size (at least 2048)
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] for non-RSA algorithms or
    /// undersized keys, and [`AuthError::Crypto`] if generation fails.
    pub fn generate(algorithm: JwsAlgorithm, bits: usize) -> AuthResult<Self> {
        check_algorithm(algorithm)?;
        if bits < MIN_GENERATED_BITS {
            return Err(AuthError::invalid_configuration(format!(
                "RSA keys must be at least {MIN_GENERATED_BITS} bits, got {bits}"
            )));
        }
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| AuthError::Crypto(format!("cannot generate RSA key: {e}")))?;
        Self::from_private_key(algorithm, &private_key)
    }

    /// Configuration from an existing RSA private key
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] for non-RSA algorithms and
    /// [`AuthError::Crypto`] if the key cannot be encoded.
    pub fn from_private_key(
        algorithm: JwsAlgorithm,
        private_key: &RsaPrivateKey,
    ) -> AuthResult<Self> {
        check_algorithm(algorithm)?;
        // jsonwebtoken signs with PKCS#1 DER
        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| AuthError::Crypto(format!("cannot encode RSA key: {e}")))?;
        let public_key = RsaPublicKey::from(private_key);

        Ok(Self {
            algorithm,
            encoding_key: Some(EncodingKey::from_rsa_der(der.as_bytes())),
            decoding_key: decoding_key_from_public(&public_key)?,
        })
    }

    /// Configuration from PEM-encoded private and public keys (PKCS#1 or PKCS#8)
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if either PEM is invalid or
    /// the algorithm is not an RSA algorithm.
    pub fn from_pem(
        algorithm: JwsAlgorithm,
        private_key_pem: &str,
        public_key_pem: &str,
    ) -> AuthResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|e| {
            AuthError::invalid_configuration(format!("invalid RSA private key: {e}"))
        })?;
        let mut config = Self::from_public_pem(algorithm, public_key_pem)?;
        config.encoding_key = Some(encoding_key);
        Ok(config)
    }

    /// Verify-only configuration from a PEM-encoded public key
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the PEM is invalid or the
    /// algorithm is not an RSA algorithm.
    pub fn from_public_pem(algorithm: JwsAlgorithm, public_key_pem: &str) -> AuthResult<Self> {
        check_algorithm(algorithm)?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes()).map_err(|e| {
            AuthError::invalid_configuration(format!("invalid RSA public key: {e}"))
        })?;
        Ok(Self {
            algorithm,
            encoding_key: None,
            decoding_key,
        })
    }

    /// Verify-only configuration from base64url modulus and exponent (JWK `n`/`e`)
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfiguration`] if the components are invalid.
    pub fn from_public_components(algorithm: JwsAlgorithm, n: &str, e: &str) -> AuthResult<Self> {
        check_algorithm(algorithm)?;
        let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|err| {
            AuthError::invalid_configuration(format!("invalid RSA key components: {err}"))
        })?;
        Ok(Self {
            algorithm,
            encoding_key: None,
            decoding_key,
        })
    }

    /// Whether this configuration holds a private key
    pub fn can_sign(&self) -> bool {
        self.encoding_key.is_some()
    }
}

fn check_algorithm(algorithm: JwsAlgorithm) -> AuthResult<()> {
    if algorithm.is_rsa() {
        Ok(())
    } else {
        Err(AuthError::invalid_configuration(format!(
            "{algorithm} is not an RSA algorithm"
        )))
    }
}

fn decoding_key_from_public(public_key: &RsaPublicKey) -> AuthResult<DecodingKey> {
    let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
    DecodingKey::from_rsa_components(&n, &e)
        .map_err(|err| AuthError::Crypto(format!("cannot build RSA verification key: {err}")))
}

impl SignatureConfiguration for RsaSignatureConfiguration {
    fn algorithm(&self) -> JwsAlgorithm {
        self.algorithm
    }

    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        let key = self.encoding_key.as_ref().ok_or_else(|| {
            AuthError::invalid_configuration("RSA configuration has no private key to sign with")
        })?;
        sign_with(self.algorithm, key, claims)
    }

    fn verify(&self, token: &str) -> AuthResult<Claims> {
        verify_with(self.algorithm, &self.decoding_key, token)
    }
}

impl fmt::Debug for RsaSignatureConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaSignatureConfiguration")
            .field("algorithm", &self.algorithm)
            .field("can_sign", &self.can_sign())
            .finish()
    }
}
