use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use warden_identity_core::{
    IdentityCore, IdentityCoreService, StoredTenantPolicies, TenantPolicyProvider, TracingAuditor,
};
use warden_policy::{PasswordPolicyEngine, TenantPolicy};
use warden_storage::{RocksDbStorage, Storage};

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub identity_service: Arc<dyn IdentityCore>,
}

impl AppState {
    /// Open the database at `config.database_path` and build the services
    pub async fn new(config: Config) -> Result<Self> {
        let storage = Arc::new(RocksDbStorage::open(&config.database_path)?);
        Self::with_storage(&config, storage).await
    }

    /// Build the services over an already opened store
    pub async fn with_storage<S: Storage + 'static>(config: &Config, storage: Arc<S>) -> Result<Self> {
        let tenants = Arc::new(StoredTenantPolicies::new(storage.clone()));

        if let Some(bootstrap) = &config.bootstrap_tenant {
            if tenants.get_policy(&bootstrap.name).await?.is_none() {
                let policy = TenantPolicy {
                    name: bootstrap.name.clone(),
                    password_type: bootstrap.password_type.clone(),
                    password_salt: bootstrap.password_salt.clone(),
                    phone_prefix: String::new(),
                };
                // Fail at startup rather than on the first login
                policy.mode()?;
                tenants.put_policy(&policy).await?;
                info!(tenant = %policy.name, "Bootstrapped tenant policy");
            }
        }

        let identity_service = IdentityCoreService::new(
            Arc::new(PasswordPolicyEngine::new()),
            tenants,
            Arc::new(TracingAuditor),
            storage,
        )
        .with_batch_size(config.bulk_insert_batch_size);

        Ok(AppState {
            identity_service: Arc::new(identity_service),
        })
    }
}
