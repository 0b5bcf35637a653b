//! Vidhub Account API
//!
//! User account microservice providing REST endpoints.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/users/register` - Register (multipart, with avatar)
//! - `POST /api/v1/users/login` - Log in, sets token cookies
//! - `POST /api/v1/users/logout` - Log out, clears token cookies
//! - `POST /api/v1/users/refresh-token` - Rotate the token pair
//! - `POST /api/v1/users/change-password` - Change password
//! - `GET /api/v1/users/current-user` - Current user
//! - `PATCH /api/v1/users/update-account` - Update name and email
//! - `PATCH /api/v1/users/avatar` - Replace avatar
//! - `PATCH /api/v1/users/cover-image` - Replace cover image
//! - `GET /api/v1/users/c/{username}` - Channel profile
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod cookies;
mod error;
mod extractors;
mod handlers;
mod response;
mod staging;
mod state;

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::ApiError;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("account_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Vidhub Account API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        upload_dir = %config.upload_dir.display(),
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool = vidhub_db::create_pool_with_options(&config.database_url, &config.pool).await?;
    tracing::info!("Database pool created");

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = AppState::new(pool, config);
    let app = build_router(state, metrics_handle)?;

    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(
    state: AppState,
    metrics_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Router> {
    let request_timeout = state.request_timeout();
    let body_limit = state.config.body_limit_bytes;
    let cors = cors_layer(state.config.cors_origin.as_deref())?;

    // Account routes
    let users = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/refresh-token", post(handlers::refresh))
        .route("/change-password", post(handlers::change_password))
        .route("/current-user", get(handlers::current_user))
        .route("/update-account", patch(handlers::update_account))
        .route("/avatar", patch(handlers::update_avatar))
        .route("/cover-image", patch(handlers::update_cover_image))
        .route("/c/{username}", get(handlers::channel_profile));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(map_response(timeout_envelope))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    Ok(Router::new()
        .nest("/api/v1/users", users)
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state))
}

/// Render the bare timeout response as an error envelope
async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        ApiError::Timeout.into_response()
    } else {
        response
    }
}

/// Credentialed CORS for one exact origin, or anonymous CORS for any
fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    };

    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(origin)?)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("accounts_registered_total", "Total accounts registered");
    metrics::describe_counter!("auth_logins_total", "Login attempts by outcome");
    metrics::describe_counter!("auth_refresh_total", "Refresh token exchanges by outcome");

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let env = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/vidhub_test".to_string()),
            ("ACCESS_TOKEN_SECRET", "a".repeat(32)),
            ("REFRESH_TOKEN_SECRET", "r".repeat(32)),
            ("CLOUDINARY_CLOUD_NAME", "demo".to_string()),
            ("CLOUDINARY_API_KEY", "key".to_string()),
            ("CLOUDINARY_API_SECRET", "secret".to_string()),
        ]);
        let config = Config::from_lookup(|key| env.get(key).cloned()).unwrap();
        // Never connects: these requests are all rejected before storage
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();

        build_router(AppState::new(pool, config), None).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_unauthorized() {
        let response = test_router()
            .oneshot(
                Request::post("/api/v1/users/refresh-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-request-id"));

        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_refresh_with_garbage_cookie_is_unauthorized() {
        let response = test_router()
            .oneshot(
                Request::post("/api/v1/users/refresh-token")
                    .header(header::COOKIE, "refreshToken=not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/users/current-user")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(
                Request::get("/api/v1/users/current-user")
                    .header(header::AUTHORIZATION, "Bearer garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "invalid token");
    }

    #[tokio::test]
    async fn test_login_requires_identity() {
        let response = test_router()
            .oneshot(
                Request::post("/api/v1/users/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"password":"p1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["message"], "username or email is required");
    }

    #[tokio::test]
    async fn test_login_malformed_json() {
        let response = test_router()
            .oneshot(
                Request::post("/api/v1/users/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        let response = test_router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_register_without_multipart_uses_envelope() {
        let response = test_router()
            .oneshot(
                Request::post("/api/v1/users/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid multipart body");
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_route_uses_envelope() {
        let response = test_router()
            .oneshot(
                Request::get("/api/v1/users/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_wrong_method_uses_envelope() {
        let response = test_router()
            .oneshot(
                Request::get("/api/v1/users/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 405);
        assert_eq!(body["message"], "method not allowed");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_timeout_envelope_only_rewrites_408() {
        let timed_out = timeout_envelope(StatusCode::REQUEST_TIMEOUT.into_response()).await;
        assert_eq!(timed_out.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(json_body(timed_out).await["statusCode"], 408);

        let ok = timeout_envelope(StatusCode::NO_CONTENT.into_response()).await;
        assert_eq!(ok.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_cors_layer_rejects_invalid_origin() {
        assert!(cors_layer(Some("https://app.example.com")).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
        assert!(cors_layer(None).is_ok());
    }
}
