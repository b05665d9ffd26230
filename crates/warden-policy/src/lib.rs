//! # warden-policy
//!
//! Credential storage policy and password-change authorization.
//!
//! - [`PasswordPolicyEngine`] transforms passwords for storage and verifies
//!   candidates under a tenant's password mode.
//! - [`PasswordChangeAuthorizer`] decides who may change whose password.

#![warn(clippy::all)]

pub mod types;
pub mod errors;
pub mod engine;
pub mod evaluator;

pub use types::*;
pub use errors::{PolicyError, Result};
pub use engine::{CredentialPolicy, PasswordPolicyEngine};
pub use evaluator::PasswordChangeAuthorizer;
