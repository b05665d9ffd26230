//! Redaction applied to records leaving the identity core.

use crate::types::User;

/// Placeholder that replaces a non-empty password
pub const MASKED_PASSWORD: &str = "***";

/// Replace a non-empty password with [`MASKED_PASSWORD`]
///
/// Empty passwords stay empty so callers can tell "no password set" apart.
pub fn mask_user(mut user: User) -> User {
    if !user.password.is_empty() {
        user.password = MASKED_PASSWORD.to_string();
    }
    user
}

/// Mask every record in a collection
pub fn mask_users(users: Vec<User>) -> Vec<User> {
    users.into_iter().map(mask_user).collect()
}
