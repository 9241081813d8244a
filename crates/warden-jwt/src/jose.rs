//! Compact serialization: structure detection and the protected header
//!
//! Accepted layouts:
//! - 1 segment: base64url claims JSON
//! - 3 segments with `alg: none` and an empty signature: unsecured JWT
//! - 3 segments otherwise: JWS
//! - 5 segments: JWE

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use warden_core::{AuthError, AuthResult};

use crate::claims::Claims;

/// `alg` value of unsecured tokens
pub const NONE_ALGORITHM: &str = "none";

/// `cty` value marking a JWE whose payload is itself a compact JWT
pub const NESTED_CONTENT_TYPE: &str = "JWT";

/// Base64url-encode without padding
pub fn encode_segment(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Base64url-decode a token segment
///
/// # Errors
///
/// Returns [`AuthError::Malformed`] naming the segment if it is not valid base64url.
pub fn decode_segment(segment: &str, name: &str) -> AuthResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::malformed(format!("invalid base64url in {name}: {e}")))
}

/// JOSE protected header
///
/// `alg` is kept as a string so that algorithms no configuration knows about
/// can still be named in errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoseHeader {
    /// Signature or key management algorithm
    pub alg: String,
    /// Content encryption method (JWE only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc: Option<String>,
    /// Content type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
    /// Token type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Key id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl JoseHeader {
    /// Header with only `alg` set
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            enc: None,
            cty: None,
            typ: None,
            kid: None,
        }
    }

    /// Whether the payload is declared to be a nested compact JWT
    pub fn is_nested(&self) -> bool {
        self.cty
            .as_deref()
            .is_some_and(|cty| cty.eq_ignore_ascii_case(NESTED_CONTENT_TYPE))
    }

    /// Encode as a protected header segment
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if the header cannot be serialized.
    pub fn encode(&self) -> AuthResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| AuthError::Crypto(format!("cannot serialize JOSE header: {e}")))?;
        Ok(encode_segment(json))
    }

    fn decode(segment: &str) -> AuthResult<Self> {
        let bytes = decode_segment(segment, "header")?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::malformed(format!("invalid JOSE header: {e}")))
    }
}

/// A JWS in compact form, header already parsed
#[derive(Debug, Clone)]
pub struct SignedToken<'a> {
    /// Protected header
    pub header: JoseHeader,
    /// The full compact token, as handed to the verifier
    pub compact: &'a str,
}

impl SignedToken<'_> {
    /// Signature algorithm named by the header
    pub fn algorithm(&self) -> &str {
        &self.header.alg
    }
}

/// A JWE in compact form with its segments decoded
#[derive(Debug, Clone)]
pub struct EncryptedToken {
    /// Protected header
    pub header: JoseHeader,
    /// Raw protected header segment; its ASCII bytes are the AEAD additional data
    pub protected: String,
    /// Wrapped content encryption key (empty for direct encryption)
    pub encrypted_key: Vec<u8>,
    /// Initialization vector
    pub iv: Vec<u8>,
    /// Ciphertext
    pub ciphertext: Vec<u8>,
    /// Authentication tag
    pub tag: Vec<u8>,
}

impl EncryptedToken {
    /// Key management algorithm named by the header
    pub fn algorithm(&self) -> &str {
        &self.header.alg
    }

    /// Content encryption method named by the header
    pub fn method(&self) -> &str {
        self.header.enc.as_deref().unwrap_or_default()
    }
}

/// Structure of a compact token, detected from its segments
#[derive(Debug, Clone)]
pub enum CompactToken<'a> {
    /// No signature and no encryption
    Unsecured(Claims),
    /// Signed (JWS)
    Signed(SignedToken<'a>),
    /// Encrypted (JWE), possibly nesting a signed token
    Encrypted(EncryptedToken),
}

impl<'a> CompactToken<'a> {
    /// Detect the structure of `token` and decode what can be decoded without keys
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] for unknown layouts, undecodable
    /// segments, and headers that are not JSON.
    pub fn parse(token: &'a str) -> AuthResult<Self> {
        let token = token.trim();
        let segments: Vec<&str> = token.split('.').collect();

        match segments.as_slice() {
            [payload] => Ok(Self::Unsecured(decode_claims(payload)?)),
            [header, payload, signature] => {
                let header = JoseHeader::decode(header)?;
                if header.alg.eq_ignore_ascii_case(NONE_ALGORITHM) {
                    if !signature.is_empty() {
                        return Err(AuthError::malformed(
                            "unsecured JWT must have an empty signature",
                        ));
                    }
                    Ok(Self::Unsecured(decode_claims(payload)?))
                } else {
                    Ok(Self::Signed(SignedToken {
                        header,
                        compact: token,
                    }))
                }
            }
            [protected, encrypted_key, iv, ciphertext, tag] => {
                let header = JoseHeader::decode(protected)?;
                if header.enc.is_none() {
                    return Err(AuthError::malformed("encrypted JWT header has no 'enc'"));
                }
                Ok(Self::Encrypted(EncryptedToken {
                    header,
                    protected: (*protected).to_string(),
                    encrypted_key: decode_segment(encrypted_key, "encrypted key")?,
                    iv: decode_segment(iv, "initialization vector")?,
                    ciphertext: decode_segment(ciphertext, "ciphertext")?,
                    tag: decode_segment(tag, "authentication tag")?,
                }))
            }
            other => Err(AuthError::malformed(format!(
                "expected 1, 3 or 5 segments, found {}",
                other.len()
            ))),
        }
    }
}

/// Serialize claims as an unsecured `alg: none` JWT
///
/// # Errors
///
/// Returns [`AuthError::Crypto`] if the claims cannot be serialized.
pub fn encode_unsecured(claims: &Claims) -> AuthResult<String> {
    let header = JoseHeader::new(NONE_ALGORITHM).encode()?;
    let payload = encode_segment(claims.to_json()?);
    Ok(format!("{header}.{payload}."))
}

fn decode_claims(segment: &str) -> AuthResult<Claims> {
    Claims::from_json(&decode_segment(segment, "payload")?)
}
