//! AES key wrap (RFC 3394) for the `A*KW` algorithms

use aes::cipher::generic_array::GenericArray;
use aes_kw::{KekAes128, KekAes192, KekAes256};
use warden_core::{AuthError, AuthResult};

use super::KeyManagementAlgorithm;

/// Bytes added to the wrapped key by the integrity check value
const IV_LEN: usize = 8;

/// Wrap a content encryption key
pub(crate) fn wrap(
    algorithm: KeyManagementAlgorithm,
    kek: &[u8],
    cek: &[u8],
) -> AuthResult<Vec<u8>> {
    check_kek(algorithm, kek)?;
    let mut wrapped = vec![0u8; cek.len() + IV_LEN];
    let result = match algorithm {
        KeyManagementAlgorithm::A128KW => {
            KekAes128::new(GenericArray::from_slice(kek)).wrap(cek, &mut wrapped)
        }
        KeyManagementAlgorithm::A192KW => {
            KekAes192::new(GenericArray::from_slice(kek)).wrap(cek, &mut wrapped)
        }
        KeyManagementAlgorithm::A256KW => {
            KekAes256::new(GenericArray::from_slice(kek)).wrap(cek, &mut wrapped)
        }
        KeyManagementAlgorithm::Dir => {
            return Err(AuthError::invalid_configuration(
                "direct encryption does not wrap keys",
            ));
        }
    };
    result.map_err(|e| AuthError::Crypto(format!("{algorithm} key wrap failed: {e}")))?;
    Ok(wrapped)
}

/// Unwrap a content encryption key, checking its integrity value
pub(crate) fn unwrap(
    algorithm: KeyManagementAlgorithm,
    kek: &[u8],
    wrapped: &[u8],
) -> AuthResult<Vec<u8>> {
    check_kek(algorithm, kek)?;
    if wrapped.len() < 2 * IV_LEN || wrapped.len() % IV_LEN != 0 {
        return Err(AuthError::malformed(format!(
            "{algorithm} wrapped key has invalid length {}",
            wrapped.len()
        )));
    }
    let mut cek = vec![0u8; wrapped.len() - IV_LEN];
    let result = match algorithm {
        KeyManagementAlgorithm::A128KW => {
            KekAes128::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut cek)
        }
        KeyManagementAlgorithm::A192KW => {
            KekAes192::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut cek)
        }
        KeyManagementAlgorithm::A256KW => {
            KekAes256::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut cek)
        }
        KeyManagementAlgorithm::Dir => {
            return Err(AuthError::invalid_configuration(
                "direct encryption does not wrap keys",
            ));
        }
    };
    result.map_err(|_| AuthError::VerificationFailed {
        algorithm: algorithm.to_string(),
    })?;
    Ok(cek)
}

fn check_kek(algorithm: KeyManagementAlgorithm, kek: &[u8]) -> AuthResult<()> {
    match algorithm.key_len() {
        Some(expected) if expected == kek.len() => Ok(()),
        Some(expected) => Err(AuthError::invalid_configuration(format!(
            "{algorithm} requires a {expected}-byte key, got {}",
            kek.len()
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rfc3394_vector() {
        // RFC 3394 section 4.1: 128-bit KEK wrapping 128 bits of key data
        let kek: Vec<u8> = (0x00..=0x0f).collect();
        let cek = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ];
        let expected = vec![
            0x1f, 0xa6, 0x8b, 0x0a, 0x81, 0x12, 0xb4, 0x47, 0xae, 0xf3, 0x4b, 0xd8, 0xfb, 0x5a,
            0x7b, 0x82, 0x9d, 0x3e, 0x86, 0x23, 0x71, 0xd2, 0xcf, 0xe5,
        ];

        let wrapped = wrap(KeyManagementAlgorithm::A128KW, &kek, &cek).unwrap();
        assert_eq!(wrapped, expected);
        assert_eq!(
            unwrap(KeyManagementAlgorithm::A128KW, &kek, &wrapped).unwrap(),
            cek.to_vec()
        );
    }

    #[test]
    fn test_wrong_kek_fails_integrity_check() {
        let cek = [9u8; 32];
        let wrapped = wrap(KeyManagementAlgorithm::A256KW, &[1u8; 32], &cek).unwrap();
        let error = unwrap(KeyManagementAlgorithm::A256KW, &[2u8; 32], &wrapped).unwrap_err();
        assert_eq!(error.kind(), warden_core::ErrorKind::VerificationFailed);
    }

    #[test]
    fn test_kek_length_checked() {
        let error = wrap(KeyManagementAlgorithm::A192KW, &[0u8; 16], &[0u8; 16]).unwrap_err();
        assert_eq!(error.kind(), warden_core::ErrorKind::InvalidConfiguration);
    }
}
