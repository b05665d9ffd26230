//! Fingerprint verification of stored records.

use crate::{errors::*, integrity, traits::*, types::*};
use tracing::{info, warn};
use warden_policy::CredentialPolicy;
use warden_storage::Storage;

use super::IdentityCoreService;

impl<P, T, A, S> IdentityCoreService<P, T, A, S>
where
    P: CredentialPolicy + 'static,
    T: TenantPolicyProvider + 'static,
    A: IntegrityAuditor + 'static,
    S: Storage + 'static,
{
    /// Recompute one record's fingerprint
    ///
    /// Returns `false` and reports to the auditor on mismatch. The record is
    /// never rewritten.
    pub(crate) async fn verify_user_integrity_internal(&self, owner: &str, name: &str) -> Result<bool> {
        let user = self.load_user(owner, name).await?;
        match integrity::check(&user) {
            None => Ok(true),
            Some(violation) => {
                warn!(user = %violation.user_id, "Stored fingerprint does not match record");
                self.auditor.report(violation).await;
                Ok(false)
            }
        }
    }

    /// Check every record in a tenant and report each mismatch
    pub(crate) async fn audit_tenant_internal(&self, owner: &str) -> Result<Vec<IntegrityViolation>> {
        let users = self.users.list_by_tenant(owner).await?;
        let checked = users.len();

        let mut violations = Vec::new();
        for violation in users.iter().filter_map(integrity::check) {
            self.auditor.report(violation.clone()).await;
            violations.push(violation);
        }

        info!(tenant = %owner, checked, mismatched = violations.len(), "Tenant audit finished");
        Ok(violations)
    }
}
