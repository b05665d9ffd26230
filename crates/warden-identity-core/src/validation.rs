//! Input validation for identity fields.

use crate::errors::{IdentityCoreError, Result};

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum username length in characters
pub const MIN_USERNAME_LEN: usize = 3;

fn invalid(msg: impl Into<String>) -> IdentityCoreError {
    IdentityCoreError::Validation(msg.into())
}

/// Format rules for a new password: no whitespace or control characters,
/// at least 6 characters
pub fn validate_new_password(password: &str) -> Result<()> {
    validate_text("New password", password)?;

    if password.chars().any(char::is_whitespace) {
        return Err(invalid("New password cannot contain blank space."));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "New password must have at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(())
}

/// Tenant and name forming a record key
///
/// Both must be non-empty and free of whitespace, control characters and
/// `/`, which separates them in external identifiers.
pub fn validate_identity_key(owner: &str, name: &str) -> Result<()> {
    for (label, value) in [("owner", owner), ("name", name)] {
        if value.is_empty() {
            return Err(invalid(format!("{} cannot be empty", label)));
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control() || c == '/') {
            return Err(invalid(format!("{} contains invalid characters", label)));
        }
    }
    Ok(())
}

/// Free-text fields may hold anything but control characters
pub fn validate_text(label: &str, value: &str) -> Result<()> {
    if value.chars().any(char::is_control) {
        return Err(invalid(format!("{} cannot contain control characters", label)));
    }
    Ok(())
}

/// Validate email address format.
///
/// - Exactly one @ symbol
/// - Non-empty local and domain parts, domain with at least one dot
/// - At most 254 characters
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() || email.len() > 254 {
        return Err(invalid("email is invalid"));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid("email is invalid"));
    };

    let local_ok = !local.is_empty()
        && local.len() <= 64
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+'));

    let domain_ok = !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'));

    if local_ok && domain_ok {
        Ok(())
    } else {
        Err(invalid("email is invalid"))
    }
}

/// Phone numbers: digits with an optional leading `+`
pub fn validate_phone(phone: &str) -> Result<()> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("phone number is invalid"));
    }
    Ok(())
}

/// Mainland China mobile number: 11 digits starting with 1
pub fn validate_cn_phone(phone: &str) -> Result<()> {
    let valid = phone.len() == 11
        && phone.starts_with('1')
        && phone.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(invalid("phone number is invalid"))
    }
}
