use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use warden_identity_core::{ActionOutcome, ErrorKind, IdentityCoreError};

/// Application error type
///
/// Rendered as an `{"status": "error", "msg": ...}` body. A bulk insert that
/// stopped part way also carries `"data": "Affected"`, since earlier batches
/// are already committed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] IdentityCoreError),
}

fn status_of(err: &IdentityCoreError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Auth => match err {
            IdentityCoreError::PermissionDenied | IdentityCoreError::UserForbidden => {
                StatusCode::FORBIDDEN
            }
            _ => StatusCode::UNAUTHORIZED,
        },
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Integrity => StatusCode::CONFLICT,
        ErrorKind::Policy | ErrorKind::Store => match err {
            IdentityCoreError::PartialBulkInsert { source, .. } => status_of(source),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

/// Client-facing message; storage details stay in the log
fn message_of(err: &IdentityCoreError) -> String {
    match err {
        IdentityCoreError::PartialBulkInsert {
            batches_committed,
            users_inserted,
            source,
        } => format!(
            "Bulk insert stopped after {} committed batch(es) ({} users): {}",
            batches_committed,
            users_inserted,
            message_of(source)
        ),
        IdentityCoreError::Storage(_) => "An internal error occurred".to_string(),
        other => other.to_string(),
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => status_of(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let ApiError::Core(err) = &self;
        if err.kind() == ErrorKind::Store {
            tracing::error!("Storage failure: {}", err);
        }

        let mut outcome = ActionOutcome::error(message_of(err));
        if matches!(err, IdentityCoreError::PartialBulkInsert { .. }) {
            outcome.data = Some("Affected".to_string());
        }
        (status, Json(outcome)).into_response()
    }
}
