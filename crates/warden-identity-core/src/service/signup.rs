//! Self-service signup.

use crate::{errors::*, traits::*, types::*, validation::*};
use tracing::info;
use warden_policy::{CredentialPolicy, TenantPolicy};
use warden_storage::Storage;

use super::IdentityCoreService;

/// Type assigned to self-service accounts
pub const SIGNUP_USER_TYPE: &str = "normal-user";

/// Phone prefix that turns on mainland number validation
const CN_PHONE_PREFIX: &str = "86";

fn rejected(msg: &str) -> IdentityCoreError {
    IdentityCoreError::Validation(msg.to_string())
}

impl<P, T, A, S> IdentityCoreService<P, T, A, S>
where
    P: CredentialPolicy + 'static,
    T: TenantPolicyProvider + 'static,
    A: IntegrityAuditor + 'static,
    S: Storage + 'static,
{
    /// Check a signup request, returning the tenant policy it will use
    ///
    /// Checks run in a fixed order and the first failure is reported.
    pub(crate) async fn check_user_signup_internal(
        &self,
        request: &SignupRequest,
    ) -> Result<TenantPolicy> {
        if request.username.chars().count() < MIN_USERNAME_LEN {
            return Err(rejected("username must have at least 3 characters"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(rejected("password must have at least 6 characters"));
        }

        let policy = self.tenant_policy(&request.owner).await?;

        if request.username.chars().any(char::is_whitespace) {
            return Err(rejected("username cannot contain white spaces"));
        }
        validate_identity_key(&request.owner, &request.username)?;

        let owner = request.owner.as_str();
        if self.users.exists_by_field(owner, LookupField::Name, &request.username).await? {
            return Err(rejected("username already exists"));
        }
        if self.users.exists_by_field(owner, LookupField::Email, &request.email).await? {
            return Err(rejected("email already exists"));
        }
        if self.users.exists_by_field(owner, LookupField::Phone, &request.phone).await? {
            return Err(rejected("phone already exists"));
        }

        if request.display_name.is_empty() {
            return Err(rejected("displayName cannot be blank"));
        }
        if request.affiliation.is_empty() {
            return Err(rejected("affiliation cannot be blank"));
        }
        validate_email(&request.email)?;
        if policy.phone_prefix == CN_PHONE_PREFIX {
            validate_cn_phone(&request.phone)?;
        }

        Ok(policy)
    }

    /// Check and enroll a signup request
    pub(crate) async fn signup_internal(&self, request: SignupRequest) -> Result<User> {
        let policy = self.check_user_signup_internal(&request).await?;

        let user = User {
            owner: request.owner,
            name: request.username,
            user_type: SIGNUP_USER_TYPE.to_string(),
            password: request.password,
            display_name: request.display_name,
            email: request.email,
            phone: request.phone,
            affiliation: request.affiliation,
            ..Default::default()
        };
        let user = self.prepare_new_user(user, &policy)?;
        self.users.insert(&user).await?;

        info!(user = %user.user_id(), "User signed up");
        Ok(user)
    }
}
