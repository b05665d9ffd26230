//! Lookup by alternate identifiers.

use crate::{errors::*, traits::*, types::*};
use tracing::debug;
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
    /// First record in the tenant matching `candidate` by name, email, then phone
    ///
    /// A name match wins even if another record uses the same string as its
    /// email or phone.
    pub(crate) async fn resolve_user_internal(
        &self,
        owner: &str,
        candidate: &str,
    ) -> Result<Option<User>> {
        for field in LookupField::RESOLUTION_ORDER {
            if let Some(user) = self.users.get_by_field(owner, field, candidate).await? {
                debug!(user = %user.user_id(), by = field.as_str(), "Resolved user");
                return Ok(Some(user));
            }
        }
        Ok(None)
    }
}
