use anyhow::Result;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod extractors;
mod middleware;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warden_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let bind_address = config.bind_address;
    tracing::info!("Starting warden server on {}", bind_address);

    // Open the store and build the identity core
    let state = Arc::new(AppState::new(config).await?);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health::health_check))
        // Users
        .route("/api/get-global-users", get(api::users::get_global_users))
        .route("/api/get-users", get(api::users::get_users))
        .route("/api/get-user", get(api::users::get_user))
        .route("/api/update-user", post(api::users::update_user))
        .route("/api/add-user", post(api::users::add_user))
        .route("/api/add-users", post(api::users::add_users))
        .route("/api/delete-user", post(api::users::delete_user))
        // Credentials
        .route("/api/set-password", post(api::users::set_password))
        .route("/api/login", post(api::users::login))
        .route("/api/signup", post(api::users::signup))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Graceful shutdown initiated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use warden_storage::MemoryStorage;

    async fn app() -> Router {
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            database_path: "unused".into(),
            bulk_insert_batch_size: 2,
            bootstrap_tenant: Some(config::BootstrapTenant {
                name: "acme".to_string(),
                password_type: "salt".to_string(),
                password_salt: "xyz".to_string(),
            }),
        };
        let state = AppState::with_storage(&config, Arc::new(MemoryStorage::new()))
            .await
            .unwrap();
        create_router(Arc::new(state))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn set_password(session: Option<&str>, form: &str) -> Request<Body> {
        let mut builder = Request::post("/api/set-password")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(user) = session {
            builder = builder.header(extractors::SESSION_USER_HEADER, user);
        }
        builder.body(Body::from(form.to_string())).unwrap()
    }

    async fn add_alice(app: &Router) {
        let (status, body) = send(
            app,
            post_json(
                "/api/add-user",
                json!({"owner": "acme", "name": "alice", "password": "old1!x", "displayName": "Alice"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["data"], "Affected");
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_user_reads_are_masked() {
        let app = app().await;
        add_alice(&app).await;

        let (_, user) = send(
            &app,
            Request::get("/api/get-user?id=acme/alice").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(user["password"], "***");
        assert_eq!(user["displayName"], "Alice");

        let (_, users) = send(
            &app,
            Request::get("/api/get-users?owner=acme").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert_eq!(users[0]["password"], "***");
    }

    #[tokio::test]
    async fn test_set_password_flow() {
        let app = app().await;
        add_alice(&app).await;
        let form = "userOwner=acme&userName=alice&oldPassword=old1%21x&newPassword=new1%21x";

        let (status, body) = send(&app, set_password(None, form)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "Please login first.");

        let (status, body) = send(&app, set_password(Some("acme/alice"), form)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["status"], "ok");

        let (status, _) = send(
            &app,
            post_json(
                "/api/login",
                json!({"organization": "acme", "username": "alice", "password": "new1!x"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_password_validation_message() {
        let app = app().await;
        add_alice(&app).await;
        let form = "userOwner=acme&userName=alice&oldPassword=old1%21x&newPassword=abcde";

        let (status, body) = send(&app, set_password(Some("acme/alice"), form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["msg"], "New password must have at least 6 characters");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = app().await;
        add_alice(&app).await;

        let (_, body) = send(
            &app,
            post_json("/api/update-user?id=acme/alice", json!({"displayName": "Alice A."})),
        )
        .await;
        assert_eq!(body["data"], "Affected");

        let (_, body) = send(
            &app,
            post_json("/api/delete-user", json!({"owner": "acme", "name": "alice"})),
        )
        .await;
        assert_eq!(body["data"], "Affected");

        let (_, user) = send(
            &app,
            Request::get("/api/get-user?id=acme/alice").body(Body::empty()).unwrap(),
        )
        .await;
        assert!(user.is_null());
    }

    #[tokio::test]
    async fn test_unknown_tenant_is_not_found() {
        let app = app().await;
        let (status, body) = send(
            &app,
            post_json("/api/add-user", json!({"owner": "nowhere", "name": "bob"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_add_users_reports_committed_batches() {
        let app = app().await;
        add_alice(&app).await;

        // Batch size is 2: carl and dana commit, the batch holding alice fails
        let users = json!([
            {"owner": "acme", "name": "carl", "password": "carl123"},
            {"owner": "acme", "name": "dana", "password": "dana123"},
            {"owner": "acme", "name": "alice", "password": "other12"},
        ]);
        let (status, body) = send(&app, post_json("/api/add-users", users)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["data"], "Affected");
        assert_eq!(
            body["msg"],
            "Bulk insert stopped after 1 committed batch(es) (2 users): user already exists: acme/alice"
        );

        let (_, users) = send(
            &app,
            Request::get("/api/get-users?owner=acme").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(users.as_array().unwrap().len(), 3);
    }
}
