//! Password change and login checks.

use crate::{errors::*, fields::UserField, traits::*, types::*, validation::validate_new_password};
use tracing::{info, warn};
use warden_policy::{CredentialPolicy, PasswordChangeAuthorizer};
use warden_storage::Storage;

use super::IdentityCoreService;

impl<P, T, A, S> IdentityCoreService<P, T, A, S>
where
    P: CredentialPolicy + 'static,
    T: TenantPolicyProvider + 'static,
    A: IntegrityAuditor + 'static,
    S: Storage + 'static,
{
    /// Change a password on behalf of an authenticated requester
    ///
    /// Steps run in a fixed order and the first failure aborts:
    /// requester, target, authorization, old password, new password format,
    /// then the write. The new password's format is only checked once the
    /// old one has verified. The stored password and the recomputed
    /// fingerprint are committed together, and the write is refused if the
    /// stored password changed after it was verified.
    pub(crate) async fn change_password_internal(
        &self,
        requester_id: Option<&str>,
        owner: &str,
        name: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let target_id = format_user_id(owner, name);

        let requester_id = requester_id
            .filter(|id| !id.is_empty())
            .ok_or(IdentityCoreError::NotAuthenticated)?;
        let requester = match split_user_id(requester_id) {
            Ok((r_owner, r_name)) => self.users.get(r_owner, r_name).await?,
            Err(_) => None,
        }
        .ok_or(IdentityCoreError::SessionOutdated)?;

        let target = self.load_user(owner, name).await?;

        let decision = PasswordChangeAuthorizer::evaluate(&requester.principal(), &target.principal());
        if !decision.is_allowed() {
            warn!(
                requester = %requester_id,
                target = %target_id,
                tags = ?decision.audit_tags,
                "Password change denied"
            );
            return Err(IdentityCoreError::PermissionDenied);
        }

        let policy = self.tenant_policy(owner).await?;
        if let Err(e) = self.policy.verify(old_password, &target.password, &policy) {
            warn!(requester = %requester_id, target = %target_id, "Old password rejected");
            return Err(e.into());
        }

        validate_new_password(new_password)?;

        let stored = self.policy.transform_for_storage(new_password, &policy)?;
        let verified_against = target.password;
        let affected = self
            .apply_changes_checked(owner, name, vec![UserField::Password(stored)], |current| {
                if current.password == verified_against {
                    Ok(())
                } else {
                    Err(IdentityCoreError::PasswordIncorrect)
                }
            })
            .await?;
        if !affected {
            return Err(IdentityCoreError::UserNotFound(target_id));
        }

        info!(requester = %requester_id, target = %target_id, rule = %decision.reason, "Password changed");
        Ok(())
    }

    /// Resolve a login name and check its password
    pub(crate) async fn check_user_login_internal(
        &self,
        owner: &str,
        username: &str,
        password: &str,
    ) -> Result<User> {
        let user = self
            .resolve_user_internal(owner, username)
            .await?
            .ok_or(IdentityCoreError::UserNotRegistered)?;

        if user.is_forbidden {
            return Err(IdentityCoreError::UserForbidden);
        }

        let policy = self.tenant_policy(&user.owner).await?;
        self.policy.verify(password, &user.password, &policy)?;

        info!(user = %user.user_id(), "Login credentials accepted");
        Ok(user)
    }
}
