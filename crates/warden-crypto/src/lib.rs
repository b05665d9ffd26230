//! # warden-crypto
//!
//! Hashing primitives for the warden identity core.
//!
//! - Salted password transform (SHA-256, hex encoded)
//! - Record fingerprint digest (BLAKE3, hex encoded). Tamper evidence only,
//!   not a secrecy mechanism.
//! - Constant-time comparison for stored credentials

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod errors;
pub mod hashing;
pub mod utils;

pub use constants::*;
pub use errors::{CryptoError, Result};
pub use hashing::*;
pub use utils::current_timestamp;
