//! Tenant policies persisted in the `organizations` column family.

use crate::{errors::Result, traits::TenantPolicyProvider};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use warden_policy::TenantPolicy;
use warden_storage::{Storage, CF_ORGANIZATIONS};

/// [`TenantPolicyProvider`] reading from the shared store
pub struct StoredTenantPolicies<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> StoredTenantPolicies<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Create or replace a tenant's policy
    pub async fn put_policy(&self, policy: &TenantPolicy) -> Result<()> {
        self.storage
            .put(CF_ORGANIZATIONS, &policy.name, policy)
            .await?;
        info!(tenant = %policy.name, password_type = %policy.password_type, "Stored tenant policy");
        Ok(())
    }
}

#[async_trait]
impl<S: Storage + 'static> TenantPolicyProvider for StoredTenantPolicies<S> {
    async fn get_policy(&self, tenant: &str) -> Result<Option<TenantPolicy>> {
        Ok(self.storage.get(CF_ORGANIZATIONS, &tenant).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_storage::MemoryStorage;

    #[tokio::test]
    async fn test_put_and_get_policy() {
        let tenants = StoredTenantPolicies::new(Arc::new(MemoryStorage::new()));
        assert_eq!(tenants.get_policy("acme").await.unwrap(), None);

        let policy = TenantPolicy::salted("acme", "xyz");
        tenants.put_policy(&policy).await.unwrap();
        assert_eq!(tenants.get_policy("acme").await.unwrap(), Some(policy));

        tenants.put_policy(&TenantPolicy::plain("acme")).await.unwrap();
        let replaced = tenants.get_policy("acme").await.unwrap().unwrap();
        assert_eq!(replaced.password_type, "plain");
    }
}
