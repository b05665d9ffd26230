//! Identity Core type definitions.

use crate::errors::{IdentityCoreError, Result};
use serde::{Deserialize, Serialize};
use warden_policy::Principal;

/// Identity record: one principal within one tenant
///
/// Keyed by `(owner, name)`. `id` is assigned at creation and never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub owner: String,
    pub name: String,
    pub created_at: u64,

    pub id: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub password: String,
    pub display_name: String,
    pub avatar: String,
    pub email: String,
    pub phone: String,
    pub affiliation: String,
    pub tag: String,
    pub is_admin: bool,
    pub is_global_admin: bool,
    pub is_forbidden: bool,

    /// Fingerprint of the security-relevant fields as last persisted
    pub current_fingerprint: String,
    /// Fingerprint computed at creation, never rewritten
    pub origin_fingerprint: String,

    pub github: String,
    pub google: String,
    pub qq: String,
    pub wechat: String,
}

impl User {
    /// External identifier, `owner/name`
    pub fn user_id(&self) -> String {
        format_user_id(&self.owner, &self.name)
    }

    /// View used by password-change authorization
    pub fn principal(&self) -> Principal<'_> {
        Principal {
            owner: &self.owner,
            name: &self.name,
            is_admin: self.is_admin,
            is_global_admin: self.is_global_admin,
        }
    }

    /// Value of an alternate identifier
    pub fn lookup_value(&self, field: LookupField) -> &str {
        match field {
            LookupField::Name => &self.name,
            LookupField::Email => &self.email,
            LookupField::Phone => &self.phone,
        }
    }
}

/// Format an external user identifier
pub fn format_user_id(owner: &str, name: &str) -> String {
    format!("{}/{}", owner, name)
}

/// Split an external `owner/name` identifier
pub fn split_user_id(id: &str) -> Result<(&str, &str)> {
    match id.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(IdentityCoreError::Validation(format!("invalid user id: {}", id))),
    }
}

/// Identifiers a user can be looked up by within a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupField {
    Name,
    Email,
    Phone,
}

impl LookupField {
    /// Resolution order: name is authoritative over email, email over phone
    pub const RESOLUTION_ORDER: [LookupField; 3] =
        [LookupField::Name, LookupField::Email, LookupField::Phone];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupField::Name => "name",
            LookupField::Email => "email",
            LookupField::Phone => "phone",
        }
    }
}

/// Outcome status reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Error,
}

/// Structured `{status, msg}` result for mutating operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub status: OutcomeStatus,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self {
            status: OutcomeStatus::Ok,
            msg: String::new(),
            data: None,
        }
    }

    /// Successful mutation, `data` says whether a record was touched
    pub fn affected(affected: bool) -> Self {
        Self {
            data: Some(if affected { "Affected" } else { "Unaffected" }.to_string()),
            ..Self::ok()
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            msg: msg.into(),
            data: None,
        }
    }
}

impl From<Result<bool>> for ActionOutcome {
    fn from(result: Result<bool>) -> Self {
        match result {
            Ok(affected) => ActionOutcome::affected(affected),
            Err(e) => ActionOutcome::error(e.to_string()),
        }
    }
}

impl From<Result<()>> for ActionOutcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => ActionOutcome::ok(),
            Err(e) => ActionOutcome::error(e.to_string()),
        }
    }
}

/// Result of a chunked bulk enrollment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkInsertReport {
    pub users_inserted: usize,
    pub batches_committed: usize,
    pub batches_total: usize,
}

impl BulkInsertReport {
    /// True if at least one batch reached the store
    pub fn any_succeeded(&self) -> bool {
        self.batches_committed > 0
    }
}

/// Self-service enrollment request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupRequest {
    pub owner: String,
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub affiliation: String,
}

/// A record whose stored fingerprint does not match its fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityViolation {
    pub user_id: String,
    pub stored_fingerprint: String,
    pub computed_fingerprint: String,
    pub origin_fingerprint: String,
    pub detected_at: u64,
}

// Re-export current_timestamp from warden-crypto
pub use warden_crypto::current_timestamp;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_user_id() {
        assert_eq!(split_user_id("acme/alice").unwrap(), ("acme", "alice"));
        assert!(split_user_id("acme").is_err());
        assert!(split_user_id("/alice").is_err());
        assert!(split_user_id("acme/").is_err());
        assert!(split_user_id("acme/alice/extra").is_err());
    }

    #[test]
    fn test_user_id_round_trip() {
        let user = User {
            owner: "acme".to_string(),
            name: "alice".to_string(),
            ..Default::default()
        };
        let id = user.user_id();
        assert_eq!(split_user_id(&id).unwrap(), ("acme", "alice"));
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: ActionOutcome = Ok::<bool, IdentityCoreError>(true).into();
        assert_eq!(ok.status, OutcomeStatus::Ok);
        assert_eq!(ok.data.as_deref(), Some("Affected"));

        let err: ActionOutcome = Err::<(), _>(IdentityCoreError::PasswordIncorrect).into();
        assert_eq!(err.status, OutcomeStatus::Error);
        assert_eq!(err.msg, "password incorrect");
    }

    #[test]
    fn test_user_json_uses_camel_case() {
        let user = User {
            display_name: "Alice".to_string(),
            user_type: "normal-user".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["displayName"], "Alice");
        assert_eq!(json["type"], "normal-user");
        assert!(json.get("originFingerprint").is_some());
    }

    #[test]
    fn test_bulk_report_flag() {
        assert!(!BulkInsertReport::default().any_succeeded());
        let report = BulkInsertReport {
            users_inserted: 3,
            batches_committed: 1,
            batches_total: 2,
        };
        assert!(report.any_succeeded());
    }
}
