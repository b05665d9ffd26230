//! Hashing utilities using SHA-256 and BLAKE3.
//!
//! BLAKE3 digests record fingerprints; it is fast and not used for secrets.
//! Credentials go through `salted_password`.

use crate::{constants::*, errors::*};
use blake3::Hasher as Blake3Hasher;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a string
pub fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Salted password transform.
///
/// `hex(sha256(hex(sha256(password)) || salt))`. Deterministic for a given
/// salt so a stored form can be recomputed and compared.
pub fn salted_password(password: &str, salt: &str) -> String {
    let inner = sha256_hex(password);
    let mut outer = String::with_capacity(inner.len() + salt.len());
    outer.push_str(&inner);
    outer.push_str(salt);
    sha256_hex(&outer)
}

/// Digest an ordered list of fields into a hex fingerprint.
///
/// Fields are joined with [`FINGERPRINT_SEPARATOR`] under a fixed domain
/// prefix, so the same values in a different order produce a different
/// digest.
pub fn fingerprint_digest(fields: &[&str]) -> String {
    let mut hasher = Blake3Hasher::new();
    hasher.update(FINGERPRINT_DOMAIN.as_bytes());
    let mut sep = [0u8; 4];
    let sep = FINGERPRINT_SEPARATOR.encode_utf8(&mut sep).as_bytes();
    for field in fields {
        hasher.update(sep);
        hasher.update(field.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Decode a hex digest produced by [`fingerprint_digest`]
pub fn digest_from_hex(value: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(value).map_err(|_| CryptoError::InvalidHashFormat)?;
    bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidInput(format!("expected 32 byte digest, got {}", bytes.len()))
    })
}

/// Securely compare two byte slices in constant time
///
/// This prevents timing attacks when comparing secrets like stored password forms.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_salted_password_depends_on_salt() {
        let a = salted_password("old1!", "xyz");
        let b = salted_password("old1!", "abc");
        assert_ne!(a, b);
        assert_eq!(a, salted_password("old1!", "xyz"));
        assert_eq!(a.len(), SALTED_PASSWORD_HEX_LEN);
    }

    #[test]
    fn test_salted_password_is_double_hash() {
        let expected = sha256_hex(&format!("{}{}", sha256_hex("secret"), "pepper"));
        assert_eq!(salted_password("secret", "pepper"), expected);
    }

    #[test]
    fn test_fingerprint_digest_order_sensitive() {
        let a = fingerprint_digest(&["id", "pw", "name", "", ""]);
        let b = fingerprint_digest(&["pw", "id", "name", "", ""]);
        assert_ne!(a, b);
        assert_eq!(a, fingerprint_digest(&["id", "pw", "name", "", ""]));
    }

    #[test]
    fn test_fingerprint_digest_field_boundaries() {
        // Moving a character across a field boundary changes the digest
        let a = fingerprint_digest(&["ab", "c"]);
        let b = fingerprint_digest(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_from_hex() {
        let digest = fingerprint_digest(&["x"]);
        assert!(digest_from_hex(&digest).is_ok());
        assert!(matches!(
            digest_from_hex("zz"),
            Err(CryptoError::InvalidHashFormat)
        ));
        assert!(matches!(
            digest_from_hex("abcd"),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_constant_time_compare() {
        let a = b"secret";
        let b = b"secret";
        let c = b"public";

        assert!(constant_time_compare(a, b));
        assert!(!constant_time_compare(a, c));
        assert!(!constant_time_compare(a, &b[..3])); // Different lengths
    }
}
