//! Enumerated, individually validated field mutations.
//!
//! Callers can only change the fields listed here. Key fields (`owner`,
//! `name`, `id`, `created_at`) and the fingerprints have no variant.

use crate::{
    errors::{IdentityCoreError, Result},
    types::User,
    validation::*,
};

/// A single field change on a user record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserField {
    DisplayName(String),
    Avatar(String),
    Email(String),
    Phone(String),
    /// Password in its *stored* form. Transform raw passwords first.
    Password(String),
    Affiliation(String),
    Tag(String),
    UserType(String),
    IsAdmin(bool),
    IsGlobalAdmin(bool),
    IsForbidden(bool),
    Github(String),
    Google(String),
    Qq(String),
    WeChat(String),
}

impl UserField {
    /// Build a change from a field name and string value.
    ///
    /// Names outside the enumerated set are rejected.
    pub fn from_name(field: &str, value: &str) -> Result<Self> {
        let text = || value.to_string();
        let flag = || match value {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(IdentityCoreError::Validation(format!(
                "{} must be true or false",
                field
            ))),
        };

        Ok(match field {
            "display_name" | "displayName" => UserField::DisplayName(text()),
            "avatar" => UserField::Avatar(text()),
            "email" => UserField::Email(text()),
            "phone" => UserField::Phone(text()),
            "password" => UserField::Password(text()),
            "affiliation" => UserField::Affiliation(text()),
            "tag" => UserField::Tag(text()),
            "type" => UserField::UserType(text()),
            "is_admin" | "isAdmin" => UserField::IsAdmin(flag()?),
            "is_global_admin" | "isGlobalAdmin" => UserField::IsGlobalAdmin(flag()?),
            "is_forbidden" | "isForbidden" => UserField::IsForbidden(flag()?),
            "github" => UserField::Github(text()),
            "google" => UserField::Google(text()),
            "qq" => UserField::Qq(text()),
            "wechat" => UserField::WeChat(text()),
            other => {
                return Err(IdentityCoreError::Validation(format!(
                    "field cannot be updated: {}",
                    other
                )))
            }
        })
    }

    /// Storage column name
    pub fn name(&self) -> &'static str {
        match self {
            UserField::DisplayName(_) => "display_name",
            UserField::Avatar(_) => "avatar",
            UserField::Email(_) => "email",
            UserField::Phone(_) => "phone",
            UserField::Password(_) => "password",
            UserField::Affiliation(_) => "affiliation",
            UserField::Tag(_) => "tag",
            UserField::UserType(_) => "type",
            UserField::IsAdmin(_) => "is_admin",
            UserField::IsGlobalAdmin(_) => "is_global_admin",
            UserField::IsForbidden(_) => "is_forbidden",
            UserField::Github(_) => "github",
            UserField::Google(_) => "google",
            UserField::Qq(_) => "qq",
            UserField::WeChat(_) => "wechat",
        }
    }

    /// True if the field feeds the record fingerprint
    pub fn is_security_relevant(&self) -> bool {
        matches!(
            self,
            UserField::Password(_)
                | UserField::DisplayName(_)
                | UserField::Avatar(_)
                | UserField::Phone(_)
        )
    }

    /// Check the value on its own
    pub fn validate(&self) -> Result<()> {
        match self {
            UserField::DisplayName(v) => {
                if v.trim().is_empty() {
                    return Err(IdentityCoreError::Validation(
                        "Display name cannot be empty".to_string(),
                    ));
                }
                validate_text("display name", v)
            }
            UserField::Password(v) => validate_new_password(v),
            UserField::Email(v) if !v.is_empty() => validate_email(v),
            UserField::Phone(v) if !v.is_empty() => validate_phone(v),
            UserField::Email(_) | UserField::Phone(_) => Ok(()),
            UserField::Avatar(v)
            | UserField::Affiliation(v)
            | UserField::Tag(v)
            | UserField::UserType(v)
            | UserField::Github(v)
            | UserField::Google(v)
            | UserField::Qq(v)
            | UserField::WeChat(v) => validate_text(self.name(), v),
            UserField::IsAdmin(_) | UserField::IsGlobalAdmin(_) | UserField::IsForbidden(_) => {
                Ok(())
            }
        }
    }

    /// Write the value into a record. Does not touch fingerprints.
    pub(crate) fn apply(self, user: &mut User) {
        match self {
            UserField::DisplayName(v) => user.display_name = v,
            UserField::Avatar(v) => user.avatar = v,
            UserField::Email(v) => user.email = v,
            UserField::Phone(v) => user.phone = v,
            UserField::Password(v) => user.password = v,
            UserField::Affiliation(v) => user.affiliation = v,
            UserField::Tag(v) => user.tag = v,
            UserField::UserType(v) => user.user_type = v,
            UserField::IsAdmin(v) => user.is_admin = v,
            UserField::IsGlobalAdmin(v) => user.is_global_admin = v,
            UserField::IsForbidden(v) => user.is_forbidden = v,
            UserField::Github(v) => user.github = v,
            UserField::Google(v) => user.google = v,
            UserField::Qq(v) => user.qq = v,
            UserField::WeChat(v) => user.wechat = v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_rejects_unlisted_fields() {
        for field in ["hash", "current_fingerprint", "owner", "name", "id", "created_at"] {
            let err = UserField::from_name(field, "x").unwrap_err();
            assert!(matches!(err, IdentityCoreError::Validation(_)), "{}", field);
        }
    }

    #[test]
    fn test_from_name_parses_flags() {
        assert_eq!(
            UserField::from_name("isAdmin", "true").unwrap(),
            UserField::IsAdmin(true)
        );
        assert!(UserField::from_name("is_forbidden", "yes").is_err());
    }

    #[test]
    fn test_security_relevance() {
        assert!(UserField::Password("x".into()).is_security_relevant());
        assert!(UserField::Phone("1".into()).is_security_relevant());
        assert!(!UserField::Email("a@b.co".into()).is_security_relevant());
        assert!(!UserField::IsAdmin(true).is_security_relevant());
    }

    #[test]
    fn test_validate_per_field() {
        assert!(UserField::DisplayName("".into()).validate().is_err());
        assert!(UserField::DisplayName("Alice".into()).validate().is_ok());
        assert!(UserField::Email("".into()).validate().is_ok());
        assert!(UserField::Email("bad".into()).validate().is_err());
        assert!(UserField::Password("abcde".into()).validate().is_err());
        assert!(UserField::Avatar("https://cdn/a.png\u{1f}".into()).validate().is_err());
    }

    #[test]
    fn test_apply_touches_only_its_field() {
        let mut user = User {
            display_name: "Alice".to_string(),
            current_fingerprint: "fp".to_string(),
            ..Default::default()
        };
        UserField::Tag("staff".into()).apply(&mut user);
        assert_eq!(user.tag, "staff");
        assert_eq!(user.display_name, "Alice");
        assert_eq!(user.current_fingerprint, "fp");
    }
}
