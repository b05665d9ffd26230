use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

/// Header carrying the authenticated principal as `owner/name`
pub const SESSION_USER_HEADER: &str = "X-Session-User";

/// Authenticated requester, if any
///
/// Set by the session layer in front of this service. Absent or empty means
/// nobody is logged in; the identity core decides what that allows.
#[derive(Debug, Clone, Default)]
pub struct SessionUser(pub Option<String>);

impl SessionUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(SESSION_USER_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(SessionUser(user))
    }
}
