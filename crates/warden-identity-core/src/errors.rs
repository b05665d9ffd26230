//! Identity Core error types.

use crate::types::IntegrityViolation;
use thiserror::Error;
use warden_policy::PolicyError;
use warden_storage::StorageError;

/// Identity Core errors
#[derive(Debug, Error)]
pub enum IdentityCoreError {
    /// Malformed or policy-violating input
    #[error("{0}")]
    Validation(String),

    /// Old or login password does not match
    #[error("password incorrect")]
    PasswordIncorrect,

    /// No authenticated requester
    #[error("Please login first.")]
    NotAuthenticated,

    /// Authenticated requester no longer resolves to a record
    #[error("Session outdated. Please login again.")]
    SessionOutdated,

    /// Requester may not act on the target
    #[error("You don't have the permission to do this.")]
    PermissionDenied,

    /// User is barred from signing in
    #[error("the user is forbidden to sign in, please contact the administrator")]
    UserForbidden,

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Login name matched no user in the tenant
    #[error("the user does not exist, please sign up first")]
    UserNotRegistered,

    /// Tenant has no policy record
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    /// Tenant policy unusable
    #[error("{0}")]
    Policy(PolicyError),

    /// Stored fingerprint does not match the record's fields
    #[error("Integrity check failed for user {}", .0.user_id)]
    Integrity(IntegrityViolation),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Bulk enrollment stopped part way
    #[error(
        "Bulk insert stopped after {batches_committed} committed batch(es) \
         ({users_inserted} users): {source}"
    )]
    PartialBulkInsert {
        batches_committed: usize,
        users_inserted: usize,
        source: Box<IdentityCoreError>,
    },
}

impl From<PolicyError> for IdentityCoreError {
    fn from(error: PolicyError) -> Self {
        match error {
            PolicyError::IncorrectPassword => IdentityCoreError::PasswordIncorrect,
            other => IdentityCoreError::Policy(other),
        }
    }
}

/// Error categories callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Policy,
    NotFound,
    Store,
    Integrity,
}

impl IdentityCoreError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityCoreError::Validation(_) => ErrorKind::Validation,
            IdentityCoreError::PasswordIncorrect
            | IdentityCoreError::NotAuthenticated
            | IdentityCoreError::SessionOutdated
            | IdentityCoreError::PermissionDenied
            | IdentityCoreError::UserForbidden => ErrorKind::Auth,
            IdentityCoreError::Policy(_) => ErrorKind::Policy,
            IdentityCoreError::UserNotFound(_)
            | IdentityCoreError::UserNotRegistered
            | IdentityCoreError::TenantNotFound(_) => ErrorKind::NotFound,
            IdentityCoreError::Storage(_) | IdentityCoreError::PartialBulkInsert { .. } => {
                ErrorKind::Store
            }
            IdentityCoreError::Integrity(_) => ErrorKind::Integrity,
        }
    }
}

/// Result type for Identity Core operations
pub type Result<T> = std::result::Result<T, IdentityCoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_error_mapping() {
        let mismatch: IdentityCoreError = PolicyError::IncorrectPassword.into();
        assert_eq!(mismatch.kind(), ErrorKind::Auth);
        assert_eq!(mismatch.to_string(), "password incorrect");

        let unsupported: IdentityCoreError =
            PolicyError::UnsupportedMode("bcrypt-legacy".to_string()).into();
        assert_eq!(unsupported.kind(), ErrorKind::Policy);
        assert_eq!(unsupported.to_string(), "unsupported password type: bcrypt-legacy");
    }

    #[test]
    fn test_storage_error_passes_through() {
        let err: IdentityCoreError = StorageError::Database("disk full".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Store);
        assert!(matches!(err, IdentityCoreError::Storage(StorageError::Database(_))));
    }

    #[test]
    fn test_partial_bulk_insert_keeps_source() {
        let err = IdentityCoreError::PartialBulkInsert {
            batches_committed: 2,
            users_inserted: 2000,
            source: Box::new(StorageError::Database("timeout".to_string()).into()),
        };
        assert_eq!(err.kind(), ErrorKind::Store);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Storage error: Database error: timeout");
    }
}
