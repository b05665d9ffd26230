//! Identity Core service implementation.

mod audit;
mod lookup;
mod password;
mod signup;
mod users;

use crate::{
    errors::*, fields::UserField, integrity, mask::*, store::UserRepository, traits::*, types::*,
    validation::*,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use warden_policy::{CredentialPolicy, TenantPolicy};
use warden_storage::Storage;

/// Users per store write during bulk enrollment
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Identity Core service implementation
pub struct IdentityCoreService<P, T, A, S>
where
    P: CredentialPolicy,
    T: TenantPolicyProvider,
    A: IntegrityAuditor,
    S: Storage,
{
    policy: Arc<P>,
    tenants: Arc<T>,
    auditor: Arc<A>,
    users: UserRepository<S>,
    batch_size: usize,
}

impl<P, T, A, S> IdentityCoreService<P, T, A, S>
where
    P: CredentialPolicy,
    T: TenantPolicyProvider,
    A: IntegrityAuditor,
    S: Storage,
{
    /// Create a new Identity Core service
    pub fn new(policy: Arc<P>, tenants: Arc<T>, auditor: Arc<A>, storage: Arc<S>) -> Self {
        Self {
            policy,
            tenants,
            auditor,
            users: UserRepository::new(storage),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the bulk enrollment batch size (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Policy of an existing tenant
    async fn tenant_policy(&self, owner: &str) -> Result<TenantPolicy> {
        self.tenants
            .get_policy(owner)
            .await?
            .ok_or_else(|| IdentityCoreError::TenantNotFound(owner.to_string()))
    }

    /// Load a record that must exist
    async fn load_user(&self, owner: &str, name: &str) -> Result<User> {
        self.users
            .get(owner, name)
            .await?
            .ok_or_else(|| IdentityCoreError::UserNotFound(format_user_id(owner, name)))
    }

    /// Persist field changes, forwarding fingerprint mismatches to the auditor
    async fn apply_changes(&self, owner: &str, name: &str, fields: Vec<UserField>) -> Result<bool> {
        self.apply_changes_checked(owner, name, fields, |_| Ok(()))
            .await
    }

    async fn apply_changes_checked<F>(
        &self,
        owner: &str,
        name: &str,
        fields: Vec<UserField>,
        check: F,
    ) -> Result<bool>
    where
        F: FnOnce(&User) -> Result<()> + Send,
    {
        match self
            .users
            .update_fields_checked(owner, name, fields, check)
            .await
        {
            Ok(affected) => Ok(affected > 0),
            Err(IdentityCoreError::Integrity(violation)) => {
                self.auditor.report(violation.clone()).await;
                Err(IdentityCoreError::Integrity(violation))
            }
            Err(e) => Err(e),
        }
    }

    /// Turn caller input into a record ready for insertion
    ///
    /// Assigns a fresh id, stamps `created_at` if unset, stores the password
    /// in the tenant's form and seals both fingerprints. Fields that feed the
    /// fingerprint may not contain control characters, so the digest
    /// separator never occurs in data.
    fn prepare_new_user(&self, mut user: User, policy: &TenantPolicy) -> Result<User> {
        validate_identity_key(&user.owner, &user.name)?;
        validate_text("password", &user.password)?;
        validate_text("display name", &user.display_name)?;
        validate_text("avatar", &user.avatar)?;
        validate_text("phone", &user.phone)?;

        user.id = Uuid::new_v4().to_string();
        if user.created_at == 0 {
            user.created_at = current_timestamp();
        }
        if !user.password.is_empty() {
            user.password = self.policy.transform_for_storage(&user.password, policy)?;
        }
        integrity::seal_new(&mut user);
        Ok(user)
    }
}

#[async_trait]
impl<P, T, A, S> IdentityCore for IdentityCoreService<P, T, A, S>
where
    P: CredentialPolicy + 'static,
    T: TenantPolicyProvider + 'static,
    A: IntegrityAuditor + 'static,
    S: Storage + 'static,
{
    async fn list_global_users(&self) -> Result<Vec<User>> {
        Ok(mask_users(self.users.list_all().await?))
    }

    async fn list_users(&self, owner: &str) -> Result<Vec<User>> {
        Ok(mask_users(self.users.list_by_tenant(owner).await?))
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.get_user_internal(id).await?.map(mask_user))
    }

    async fn create_user(&self, user: User) -> Result<bool> {
        self.create_user_internal(user).await
    }

    async fn create_users(&self, users: Vec<User>) -> Result<BulkInsertReport> {
        self.create_users_internal(users).await
    }

    async fn update_user(&self, id: &str, user: User) -> Result<bool> {
        self.update_user_internal(id, user).await
    }

    async fn delete_user(&self, user: &User) -> Result<bool> {
        self.delete_user_internal(&user.owner, &user.name).await
    }

    async fn change_password(
        &self,
        requester_id: Option<&str>,
        owner: &str,
        name: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        self.change_password_internal(requester_id, owner, name, old_password, new_password)
            .await
    }

    async fn resolve_user(&self, owner: &str, candidate: &str) -> Result<Option<User>> {
        Ok(self.resolve_user_internal(owner, candidate).await?.map(mask_user))
    }

    async fn check_user_login(
        &self,
        owner: &str,
        username: &str,
        password: &str,
    ) -> Result<User> {
        Ok(mask_user(
            self.check_user_login_internal(owner, username, password)
                .await?,
        ))
    }

    async fn check_user_signup(&self, request: &SignupRequest) -> Result<()> {
        self.check_user_signup_internal(request).await.map(|_| ())
    }

    async fn signup(&self, request: SignupRequest) -> Result<User> {
        Ok(mask_user(self.signup_internal(request).await?))
    }

    async fn set_user_field(&self, owner: &str, name: &str, field: UserField) -> Result<bool> {
        self.set_user_field_internal(owner, name, field).await
    }

    async fn has_user_by_field(
        &self,
        owner: &str,
        field: LookupField,
        value: &str,
    ) -> Result<bool> {
        self.users.exists_by_field(owner, field, value).await
    }

    async fn verify_user_integrity(&self, owner: &str, name: &str) -> Result<bool> {
        self.verify_user_integrity_internal(owner, name).await
    }

    async fn audit_tenant(&self, owner: &str) -> Result<Vec<IntegrityViolation>> {
        self.audit_tenant_internal(owner).await
    }
}
