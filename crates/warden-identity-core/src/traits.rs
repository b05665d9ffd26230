//! Identity Core trait definitions.

use crate::{errors::Result, fields::UserField, types::*};
use async_trait::async_trait;
use tracing::warn;
use warden_policy::TenantPolicy;

/// Source of per-tenant password policy
///
/// `Ok(None)` means the tenant does not exist, which callers report
/// differently from a tenant whose policy is unusable.
#[async_trait]
pub trait TenantPolicyProvider: Send + Sync {
    async fn get_policy(&self, tenant: &str) -> Result<Option<TenantPolicy>>;
}

/// Receiver for fingerprint mismatches
///
/// Injected so the identity core never repairs a tampered record itself.
#[async_trait]
pub trait IntegrityAuditor: Send + Sync {
    /// Report a record whose stored fingerprint does not match its fields
    async fn report(&self, violation: IntegrityViolation);
}

/// Auditor that writes violations to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditor;

#[async_trait]
impl IntegrityAuditor for TracingAuditor {
    async fn report(&self, violation: IntegrityViolation) {
        warn!(
            user = %violation.user_id,
            stored = %violation.stored_fingerprint,
            computed = %violation.computed_fingerprint,
            origin = %violation.origin_fingerprint,
            "User record fingerprint mismatch"
        );
    }
}

/// Identity Core subsystem trait
///
/// Every record or collection returned here has been masked.
#[async_trait]
pub trait IdentityCore: Send + Sync {
    /// All users across tenants, newest first
    async fn list_global_users(&self) -> Result<Vec<User>>;

    /// All users in a tenant, newest first
    async fn list_users(&self, owner: &str) -> Result<Vec<User>>;

    /// Get a user by `owner/name` id
    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// Enroll one user. Assigns the id, applies the tenant's password
    /// policy and seals both fingerprints.
    async fn create_user(&self, user: User) -> Result<bool>;

    /// Enroll many users in bounded batches
    async fn create_users(&self, users: Vec<User>) -> Result<BulkInsertReport>;

    /// Update the profile and flag fields of the user at `id`
    async fn update_user(&self, id: &str, user: User) -> Result<bool>;

    /// Delete the user keyed by `user.owner` and `user.name`
    async fn delete_user(&self, user: &User) -> Result<bool>;

    /// Change a password on behalf of `requester_id`
    ///
    /// `requester_id` is the authenticated principal's `owner/name`, or
    /// `None` if nobody is logged in.
    async fn change_password(
        &self,
        requester_id: Option<&str>,
        owner: &str,
        name: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<()>;

    /// Find a user in a tenant by name, then email, then phone
    async fn resolve_user(&self, owner: &str, candidate: &str) -> Result<Option<User>>;

    /// Check login credentials. Does not issue a session.
    async fn check_user_login(&self, owner: &str, username: &str, password: &str)
        -> Result<User>;

    /// Validate a signup request without writing anything
    async fn check_user_signup(&self, request: &SignupRequest) -> Result<()>;

    /// Validate and enroll a self-service signup
    async fn signup(&self, request: SignupRequest) -> Result<User>;

    /// Change a single field
    async fn set_user_field(&self, owner: &str, name: &str, field: UserField) -> Result<bool>;

    /// True if a user in the tenant has `field` equal to `value`
    async fn has_user_by_field(&self, owner: &str, field: LookupField, value: &str)
        -> Result<bool>;

    /// Recompute a user's fingerprint. Mismatches go to the auditor.
    async fn verify_user_integrity(&self, owner: &str, name: &str) -> Result<bool>;

    /// Verify every user in a tenant and return the mismatches found
    async fn audit_tenant(&self, owner: &str) -> Result<Vec<IntegrityViolation>>;
}
