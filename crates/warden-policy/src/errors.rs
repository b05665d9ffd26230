//! Policy engine error types.

use thiserror::Error;

/// Policy engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The tenant's password mode is not one this engine knows
    #[error("unsupported password type: {0}")]
    UnsupportedMode(String),

    /// Candidate password does not match the stored form
    #[error("password incorrect")]
    IncorrectPassword,
}

impl PolicyError {
    /// True for a credential mismatch, false for a tenant misconfiguration
    pub fn is_credential_mismatch(&self) -> bool {
        matches!(self, PolicyError::IncorrectPassword)
    }
}

/// Result type for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;
