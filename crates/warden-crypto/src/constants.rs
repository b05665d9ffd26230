//! Constants shared by the password and fingerprint transforms.
//!
//! Changing any of these invalidates every stored credential or
//! fingerprint computed with the previous value.

/// Length in bytes of a SHA-256 digest
pub const SHA256_DIGEST_SIZE: usize = 32;

/// Length in hex characters of a salted password as stored
pub const SALTED_PASSWORD_HEX_LEN: usize = SHA256_DIGEST_SIZE * 2;

/// Separator placed between fingerprint fields.
///
/// ASCII unit separator. Field validation rejects control characters, so it
/// never occurs inside a fingerprinted value.
pub const FINGERPRINT_SEPARATOR: char = '\u{1f}';

/// Domain separation prefix for record fingerprints
pub const FINGERPRINT_DOMAIN: &str = "warden:user-fingerprint:v1";
