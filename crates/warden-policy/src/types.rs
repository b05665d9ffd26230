//! Policy engine type definitions.

use crate::errors::{PolicyError, Result};
use serde::{Deserialize, Serialize};

/// How a tenant stores passwords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordMode {
    /// Stored as given
    Plain,
    /// Stored as `salted_password(raw, tenant_salt)`
    Salted,
}

impl PasswordMode {
    /// Parse the mode name stored on a tenant.
    ///
    /// `"salt"` is the historical spelling and is accepted alongside
    /// `"salted"`.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "plain" => Ok(PasswordMode::Plain),
            "salt" | "salted" => Ok(PasswordMode::Salted),
            other => Err(PolicyError::UnsupportedMode(other.to_string())),
        }
    }

    /// Canonical name written back to tenant records
    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordMode::Plain => "plain",
            PasswordMode::Salted => "salt",
        }
    }
}

impl std::fmt::Display for PasswordMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tenant settings consumed by the identity core
///
/// `password_type` is kept as the raw stored string so that a misconfigured
/// tenant surfaces as [`PolicyError::UnsupportedMode`] at use time rather
/// than failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantPolicy {
    /// Tenant name (the `owner` of its users)
    pub name: String,
    /// Password storage mode name, see [`PasswordMode::parse`]
    pub password_type: String,
    /// Salt used in salted mode. May be empty.
    pub password_salt: String,
    /// Phone country prefix, `"86"` turns on mainland number validation
    pub phone_prefix: String,
}

impl TenantPolicy {
    /// Tenant storing passwords as given
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password_type: PasswordMode::Plain.as_str().to_string(),
            password_salt: String::new(),
            phone_prefix: String::new(),
        }
    }

    /// Tenant storing salted password digests
    pub fn salted(name: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password_type: PasswordMode::Salted.as_str().to_string(),
            password_salt: salt.into(),
            phone_prefix: String::new(),
        }
    }

    /// Parsed password mode
    pub fn mode(&self) -> Result<PasswordMode> {
        PasswordMode::parse(&self.password_type)
    }
}

/// The parts of an identity that password-change authorization looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    /// Tenant-admin capability
    pub is_admin: bool,
    /// Global-admin capability
    pub is_global_admin: bool,
}

impl Principal<'_> {
    /// Same tenant and same name
    pub fn same_identity(&self, other: &Principal<'_>) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

/// Authorization verdict
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Allow = 0x01,
    Deny = 0x02,
}

/// Authorization decision with the rule that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationDecision {
    pub verdict: Verdict,
    pub audit_tags: Vec<String>,
    pub reason: String,
}

impl AuthorizationDecision {
    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }
}
