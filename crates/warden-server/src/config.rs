use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use warden_identity_core::DEFAULT_BATCH_SIZE;

/// Tenant policy seeded at startup when the tenant has none yet
#[derive(Debug, Clone)]
pub struct BootstrapTenant {
    pub name: String,
    pub password_type: String,
    pub password_salt: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Path to RocksDB database
    pub database_path: PathBuf,

    /// Users per store write during bulk enrollment
    pub bulk_insert_batch_size: usize,

    pub bootstrap_tenant: Option<BootstrapTenant>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_address = var("BIND_ADDRESS")
            .unwrap_or_else(|| "127.0.0.1:8000".to_string())
            .parse()
            .context("BIND_ADDRESS must be a socket address")?;

        let database_path = var("DATABASE_PATH")
            .unwrap_or_else(|| "./data/warden.db".to_string())
            .into();

        let bulk_insert_batch_size: usize = match var("BULK_INSERT_BATCH_SIZE") {
            Some(value) => value
                .parse()
                .context("BULK_INSERT_BATCH_SIZE must be a positive integer")?,
            None => DEFAULT_BATCH_SIZE,
        };
        if bulk_insert_batch_size == 0 {
            anyhow::bail!("BULK_INSERT_BATCH_SIZE must be a positive integer");
        }

        let bootstrap_tenant = var("BOOTSTRAP_TENANT")
            .filter(|name| !name.is_empty())
            .map(|name| BootstrapTenant {
                name,
                password_type: var("BOOTSTRAP_PASSWORD_TYPE").unwrap_or_else(|| "plain".to_string()),
                password_salt: var("BOOTSTRAP_PASSWORD_SALT").unwrap_or_default(),
            });

        Ok(Config {
            bind_address,
            database_path,
            bulk_insert_batch_size,
            bootstrap_tenant,
        })
    }
}
