//! User CRUD and field-scoped updates.

use crate::{errors::*, fields::UserField, traits::*, types::*};
use std::collections::HashMap;
use tracing::{info, warn};
use warden_policy::{CredentialPolicy, TenantPolicy};
use warden_storage::Storage;

use super::IdentityCoreService;

impl<P, T, A, S> IdentityCoreService<P, T, A, S>
where
    P: CredentialPolicy + 'static,
    T: TenantPolicyProvider + 'static,
    A: IntegrityAuditor + 'static,
    S: Storage + 'static,
{
    /// Get an unmasked record by `owner/name` id
    pub(crate) async fn get_user_internal(&self, id: &str) -> Result<Option<User>> {
        let (owner, name) = split_user_id(id)?;
        self.users.get(owner, name).await
    }

    /// Enroll one user under its tenant's policy
    pub(crate) async fn create_user_internal(&self, user: User) -> Result<bool> {
        let policy = self.tenant_policy(&user.owner).await?;
        let user = self.prepare_new_user(user, &policy)?;
        let affected = self.users.insert(&user).await?;

        info!(user = %user.user_id(), "User created");
        Ok(affected > 0)
    }

    /// Enroll users in batches of `batch_size`
    ///
    /// Every record is prepared before the first write, so bad input fails
    /// the call without touching the store. A failed batch stops the run:
    /// later batches are never attempted.
    pub(crate) async fn create_users_internal(&self, users: Vec<User>) -> Result<BulkInsertReport> {
        if users.is_empty() {
            return Ok(BulkInsertReport::default());
        }

        let mut policies: HashMap<String, TenantPolicy> = HashMap::new();
        let mut prepared = Vec::with_capacity(users.len());
        for user in users {
            if !policies.contains_key(&user.owner) {
                let policy = self.tenant_policy(&user.owner).await?;
                policies.insert(user.owner.clone(), policy);
            }
            let policy = &policies[&user.owner];
            prepared.push(self.prepare_new_user(user, policy)?);
        }

        let mut report = BulkInsertReport {
            batches_total: prepared.len().div_ceil(self.batch_size),
            ..Default::default()
        };

        for (index, chunk) in prepared.chunks(self.batch_size).enumerate() {
            let start = index * self.batch_size;
            info!(start, end = start + chunk.len(), "Adding users");

            match self.users.insert_many(chunk).await {
                Ok(inserted) => {
                    report.users_inserted += inserted;
                    report.batches_committed += 1;
                }
                Err(e) if report.batches_committed == 0 => return Err(e),
                Err(e) => {
                    warn!(
                        batches_committed = report.batches_committed,
                        batches_total = report.batches_total,
                        "Bulk insert stopped part way"
                    );
                    return Err(IdentityCoreError::PartialBulkInsert {
                        batches_committed: report.batches_committed,
                        users_inserted: report.users_inserted,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Write the profile and flag fields of `user` onto the record at `id`
    ///
    /// Key fields, credentials, contact fields and fingerprints in `user`
    /// are ignored. The fingerprint is recomputed from the stored record.
    pub(crate) async fn update_user_internal(&self, id: &str, user: User) -> Result<bool> {
        let (owner, name) = split_user_id(id)?;

        let fields = vec![
            UserField::DisplayName(user.display_name),
            UserField::Avatar(user.avatar),
            UserField::Affiliation(user.affiliation),
            UserField::Tag(user.tag),
            UserField::IsAdmin(user.is_admin),
            UserField::IsGlobalAdmin(user.is_global_admin),
            UserField::IsForbidden(user.is_forbidden),
        ];
        for field in &fields {
            field.validate()?;
        }

        let affected = self.apply_changes(owner, name, fields).await?;
        if affected {
            info!(user = %id, "User updated");
        }
        Ok(affected)
    }

    pub(crate) async fn delete_user_internal(&self, owner: &str, name: &str) -> Result<bool> {
        let affected = self.users.delete(owner, name).await? > 0;
        if affected {
            info!(user = %format_user_id(owner, name), "User deleted");
        }
        Ok(affected)
    }

    /// Validate and write one field. Passwords are stored in the tenant's form.
    pub(crate) async fn set_user_field_internal(
        &self,
        owner: &str,
        name: &str,
        field: UserField,
    ) -> Result<bool> {
        field.validate()?;

        let field = match field {
            UserField::Password(raw) => {
                let policy = self.tenant_policy(owner).await?;
                UserField::Password(self.policy.transform_for_storage(&raw, &policy)?)
            }
            other => other,
        };
        let column = field.name();

        let affected = self.apply_changes(owner, name, vec![field]).await?;
        if affected {
            info!(user = %format_user_id(owner, name), field = column, "User field set");
        }
        Ok(affected)
    }
}
