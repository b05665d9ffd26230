//! Column family definitions.

/// User records: (owner, name) → User
pub const CF_USERS: &str = "users";

/// Users by email index: (owner, email, name) → name
pub const CF_USERS_BY_EMAIL: &str = "users_by_email";

/// Users by phone index: (owner, phone, name) → name
pub const CF_USERS_BY_PHONE: &str = "users_by_phone";

/// Tenant policies: owner → TenantPolicy
pub const CF_ORGANIZATIONS: &str = "organizations";

/// Get all column family names
pub fn all_column_families() -> Vec<&'static str> {
    vec![CF_USERS, CF_USERS_BY_EMAIL, CF_USERS_BY_PHONE, CF_ORGANIZATIONS]
}
