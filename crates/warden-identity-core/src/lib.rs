//! # warden-identity-core
//!
//! Identity records and credential changes for a multi-tenant system.
//!
//! This crate is responsible for:
//! - Enrolling, reading, updating and deleting user records
//! - Password changes gated by [`warden_policy::PasswordChangeAuthorizer`]
//! - Tamper-evidence fingerprints over security-relevant fields
//! - Lookup by name, email or phone
//! - Masking secrets on every record that leaves the crate

#![warn(clippy::all)]

pub mod types;
pub mod errors;
pub mod fields;
pub mod integrity;
pub mod mask;
pub mod store;
pub mod tenants;
pub mod traits;
pub mod validation;
pub mod service;

pub use types::*;
pub use errors::{ErrorKind, IdentityCoreError, Result};
pub use fields::UserField;
pub use mask::{mask_user, mask_users, MASKED_PASSWORD};
pub use store::UserRepository;
pub use tenants::StoredTenantPolicies;
pub use traits::{IdentityCore, IntegrityAuditor, TenantPolicyProvider, TracingAuditor};
pub use service::{IdentityCoreService, DEFAULT_BATCH_SIZE};
