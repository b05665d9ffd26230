use axum::{
    extract::{Query, State},
    response::Json,
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use warden_identity_core::{ActionOutcome, SignupRequest, User};

use crate::{error::ApiError, extractors::SessionUser, state::AppState};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordForm {
    pub user_owner: String,
    pub user_name: String,
    #[serde(default)]
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub organization: String,
    pub username: String,
    pub password: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// List users of every tenant
pub async fn get_global_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.identity_service.list_global_users().await?))
}

/// List users of one tenant
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.identity_service.list_users(&query.owner).await?))
}

/// Get one user by `owner/name`, `null` if absent
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Option<User>>, ApiError> {
    Ok(Json(state.identity_service.get_user(&query.id).await?))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
    Json(user): Json<User>,
) -> Result<Json<ActionOutcome>, ApiError> {
    let affected = state.identity_service.update_user(&query.id, user).await?;
    Ok(Json(ActionOutcome::affected(affected)))
}

pub async fn add_user(
    State(state): State<Arc<AppState>>,
    Json(user): Json<User>,
) -> Result<Json<ActionOutcome>, ApiError> {
    let affected = state.identity_service.create_user(user).await?;
    Ok(Json(ActionOutcome::affected(affected)))
}

/// Enroll many users in bounded batches
///
/// A run that fails after some batches committed answers with an error body
/// whose `data` is `"Affected"` and whose message carries the counts.
pub async fn add_users(
    State(state): State<Arc<AppState>>,
    Json(users): Json<Vec<User>>,
) -> Result<Json<ActionOutcome>, ApiError> {
    let report = state.identity_service.create_users(users).await?;
    Ok(Json(ActionOutcome::affected(report.any_succeeded())))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Json(user): Json<User>,
) -> Result<Json<ActionOutcome>, ApiError> {
    let affected = state.identity_service.delete_user(&user).await?;
    Ok(Json(ActionOutcome::affected(affected)))
}

/// Change a password on behalf of the session user
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Form(form): Form<SetPasswordForm>,
) -> Result<Json<ActionOutcome>, ApiError> {
    state
        .identity_service
        .change_password(
            session.id(),
            &form.user_owner,
            &form.user_name,
            &form.old_password,
            &form.new_password,
        )
        .await?;
    Ok(Json(ActionOutcome::ok()))
}

/// Check login credentials and return the masked user
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .identity_service
        .check_user_login(&request.organization, &request.username, &request.password)
        .await?;
    Ok(Json(user))
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.identity_service.signup(request).await?))
}
