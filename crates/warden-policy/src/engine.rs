//! Credential policy engine.

use crate::{errors::*, types::*};
use tracing::warn;
use warden_crypto::{constant_time_compare, salted_password};

/// Password storage and verification under a tenant policy
pub trait CredentialPolicy: Send + Sync {
    /// Transform a raw password into the form stored on the record
    fn transform_for_storage(&self, raw_password: &str, policy: &TenantPolicy) -> Result<String>;

    /// Check a candidate password against a stored form
    ///
    /// Returns [`PolicyError::IncorrectPassword`] on mismatch and
    /// [`PolicyError::UnsupportedMode`] when the tenant is misconfigured.
    fn verify(&self, candidate: &str, stored: &str, policy: &TenantPolicy) -> Result<()>;
}

/// Default credential policy
///
/// In salted mode a candidate is accepted if it equals the stored form
/// directly *or* its salted transform does. The direct match keeps records
/// written before the tenant switched to salting (and callers that already
/// hold the stored form) working without a re-hash pass. It is a migration
/// affordance, not a property to rely on for new tenants.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordPolicyEngine;

impl PasswordPolicyEngine {
    pub fn new() -> Self {
        Self
    }

    fn mode(policy: &TenantPolicy) -> Result<PasswordMode> {
        policy.mode().map_err(|e| {
            warn!(tenant = %policy.name, password_type = %policy.password_type, "Unsupported password type");
            e
        })
    }
}

impl CredentialPolicy for PasswordPolicyEngine {
    fn transform_for_storage(&self, raw_password: &str, policy: &TenantPolicy) -> Result<String> {
        match Self::mode(policy)? {
            PasswordMode::Plain => Ok(raw_password.to_string()),
            PasswordMode::Salted => Ok(salted_password(raw_password, &policy.password_salt)),
        }
    }

    fn verify(&self, candidate: &str, stored: &str, policy: &TenantPolicy) -> Result<()> {
        let matched = match Self::mode(policy)? {
            PasswordMode::Plain => constant_time_compare(candidate.as_bytes(), stored.as_bytes()),
            PasswordMode::Salted => {
                // Evaluate both arms so timing does not reveal which one matched
                let direct = constant_time_compare(candidate.as_bytes(), stored.as_bytes());
                let salted = salted_password(candidate, &policy.password_salt);
                let transformed = constant_time_compare(salted.as_bytes(), stored.as_bytes());
                direct | transformed
            }
        };

        if matched {
            Ok(())
        } else {
            Err(PolicyError::IncorrectPassword)
        }
    }
}
