//! Authenticated content encryption (RFC 7518 section 5)

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::hmac;
use subtle::ConstantTimeEq;
use warden_core::{AuthError, AuthResult};

use super::ContentEncryption;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// AES-GCM tag length in bytes
const GCM_TAG_LEN: usize = 16;

/// Ciphertext and authentication tag
pub(crate) struct Sealed {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Encrypt `plaintext` under `key`/`iv`, authenticating `aad` as well
pub(crate) fn seal(
    method: ContentEncryption,
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> AuthResult<Sealed> {
    check_sizes(method, key, iv)?;
    match method {
        ContentEncryption::A128Gcm => gcm_seal::<Aes128Gcm>(key, iv, aad, plaintext),
        ContentEncryption::A192Gcm => gcm_seal::<Aes192Gcm>(key, iv, aad, plaintext),
        ContentEncryption::A256Gcm => gcm_seal::<Aes256Gcm>(key, iv, aad, plaintext),
        ContentEncryption::A128CbcHs256
        | ContentEncryption::A192CbcHs384
        | ContentEncryption::A256CbcHs512 => cbc_hmac_seal(method, key, iv, aad, plaintext),
    }
}

/// Check the tag and decrypt
pub(crate) fn open(
    method: ContentEncryption,
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> AuthResult<Vec<u8>> {
    check_sizes(method, key, iv)?;
    match method {
        ContentEncryption::A128Gcm => gcm_open::<Aes128Gcm>(method, key, iv, aad, ciphertext, tag),
        ContentEncryption::A192Gcm => gcm_open::<Aes192Gcm>(method, key, iv, aad, ciphertext, tag),
        ContentEncryption::A256Gcm => gcm_open::<Aes256Gcm>(method, key, iv, aad, ciphertext, tag),
        ContentEncryption::A128CbcHs256
        | ContentEncryption::A192CbcHs384
        | ContentEncryption::A256CbcHs512 => {
            cbc_hmac_open(method, key, iv, aad, ciphertext, tag)
        }
    }
}

fn check_sizes(method: ContentEncryption, key: &[u8], iv: &[u8]) -> AuthResult<()> {
    if key.len() != method.key_len() {
        return Err(AuthError::VerificationFailed {
            algorithm: method.to_string(),
        });
    }
    if iv.len() != method.iv_len() {
        return Err(AuthError::malformed(format!(
            "{method} needs a {}-byte IV, got {}",
            method.iv_len(),
            iv.len()
        )));
    }
    Ok(())
}

fn gcm_seal<C>(key: &[u8], iv: &[u8], aad: &[u8], plaintext: &[u8]) -> AuthResult<Sealed>
where
    C: KeyInit + Aead<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key)
        .map_err(|_| AuthError::Crypto("invalid AES-GCM key length".to_string()))?;
    let mut ciphertext = cipher
        .encrypt(GenericArray::from_slice(iv), Payload { msg: plaintext, aad })
        .map_err(|_| AuthError::Crypto("AES-GCM encryption failed".to_string()))?;
    let tag = ciphertext.split_off(ciphertext.len() - GCM_TAG_LEN);
    Ok(Sealed { ciphertext, tag })
}

fn gcm_open<C>(
    method: ContentEncryption,
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> AuthResult<Vec<u8>>
where
    C: KeyInit + Aead<NonceSize = U12>,
{
    if tag.len() != GCM_TAG_LEN {
        return Err(AuthError::malformed(format!(
            "{method} needs a {GCM_TAG_LEN}-byte tag, got {}",
            tag.len()
        )));
    }
    let cipher = C::new_from_slice(key)
        .map_err(|_| AuthError::Crypto("invalid AES-GCM key length".to_string()))?;
    let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);
    cipher
        .decrypt(GenericArray::from_slice(iv), Payload { msg: &sealed, aad })
        .map_err(|_| AuthError::VerificationFailed {
            algorithm: method.to_string(),
        })
}

fn cbc_hmac_seal(
    method: ContentEncryption,
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> AuthResult<Sealed> {
    let (mac_key, enc_key) = key.split_at(key.len() / 2);
    let invalid = |_| AuthError::Crypto("invalid AES-CBC key or IV length".to_string());
    let ciphertext = match enc_key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => cbc::Encryptor::<Aes256>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };
    let tag = cbc_hmac_tag(method, mac_key, aad, iv, &ciphertext);
    Ok(Sealed { ciphertext, tag })
}

fn cbc_hmac_open(
    method: ContentEncryption,
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> AuthResult<Vec<u8>> {
    let (mac_key, enc_key) = key.split_at(key.len() / 2);
    let expected = cbc_hmac_tag(method, mac_key, aad, iv, ciphertext);
    if !bool::from(expected.as_slice().ct_eq(tag)) {
        return Err(AuthError::VerificationFailed {
            algorithm: method.to_string(),
        });
    }

    let invalid = |_| AuthError::Crypto("invalid AES-CBC key or IV length".to_string());
    let plaintext = match enc_key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        _ => cbc::Decryptor::<Aes256>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
    };
    plaintext.map_err(|_| AuthError::malformed(format!("invalid {method} padding")))
}

/// HMAC over AAD || IV || ciphertext || AL, truncated to half its length
fn cbc_hmac_tag(
    method: ContentEncryption,
    mac_key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Vec<u8> {
    let algorithm = match method {
        ContentEncryption::A192CbcHs384 => hmac::HMAC_SHA384,
        ContentEncryption::A256CbcHs512 => hmac::HMAC_SHA512,
        _ => hmac::HMAC_SHA256,
    };
    let key = hmac::Key::new(algorithm, mac_key);
    let aad_bits = (aad.len() as u64) * 8;

    let mut context = hmac::Context::with_key(&key);
    context.update(aad);
    context.update(iv);
    context.update(ciphertext);
    context.update(&aad_bits.to_be_bytes());
    let signature = context.sign();

    signature.as_ref()[..mac_key.len()].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL: [ContentEncryption; 6] = [
        ContentEncryption::A128Gcm,
        ContentEncryption::A192Gcm,
        ContentEncryption::A256Gcm,
        ContentEncryption::A128CbcHs256,
        ContentEncryption::A192CbcHs384,
        ContentEncryption::A256CbcHs512,
    ];

    #[test]
    fn test_every_method_opens_what_it_seals() {
        for method in ALL {
            let key = vec![0x42; method.key_len()];
            let iv = vec![0x07; method.iv_len()];
            let sealed = seal(method, &key, &iv, b"header", b"payload").unwrap();
            let opened =
                open(method, &key, &iv, b"header", &sealed.ciphertext, &sealed.tag).unwrap();
            assert_eq!(opened, b"payload", "{method}");
        }
    }

    #[test]
    fn test_tampered_aad_is_rejected() {
        for method in ALL {
            let key = vec![0x42; method.key_len()];
            let iv = vec![0x07; method.iv_len()];
            let sealed = seal(method, &key, &iv, b"header", b"payload").unwrap();
            let error =
                open(method, &key, &iv, b"other", &sealed.ciphertext, &sealed.tag).unwrap_err();
            assert_eq!(error.kind(), warden_core::ErrorKind::VerificationFailed, "{method}");
        }
    }

    #[test]
    fn test_wrong_key_length_is_rejected() {
        let method = ContentEncryption::A256Gcm;
        let iv = vec![0; method.iv_len()];
        assert!(seal(method, &[0; 16], &iv, b"", b"x").is_err());
    }

    #[test]
    fn test_cbc_hmac_tag_matches_rfc7518_vector() {
        // RFC 7518 appendix B.1 (AES_128_CBC_HMAC_SHA_256)
        let key: Vec<u8> = (0x00..=0x1f).collect();
        let plaintext = b"A cipher system must not be required to be secret, and it must be able to fall into the hands of the enemy without inconvenience";
        let iv = [
            0x1a, 0xf3, 0x8c, 0x2d, 0xc2, 0xb9, 0x6f, 0xfd, 0xd8, 0x66, 0x94, 0x09, 0x23, 0x41,
            0xbc, 0x04,
        ];
        let aad = b"The second principle of Auguste Kerckhoffs";

        let sealed = seal(ContentEncryption::A128CbcHs256, &key, &iv, aad, plaintext).unwrap();
        assert_eq!(
            sealed.tag,
            vec![
                0x65, 0x2c, 0x3f, 0xa3, 0x6b, 0x0a, 0x7c, 0x5b, 0x32, 0x19, 0xfa, 0xb3, 0xa3, 0x0b,
                0xc1, 0xc4,
            ]
        );
    }
}
