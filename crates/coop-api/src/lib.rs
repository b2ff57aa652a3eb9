//! # coop-api: HTTP Services for the Cooperative Backend
//!
//! Multi-tenant REST API over the domain types in `coop-core`. Every
//! branch-scoped entity is served by one generic set of CRUD handlers
//! instantiated per entity; notifications and user settings have their own
//! handlers. Every mutating request leaves exactly one footstep.
//!
//! ## API Surface
//!
//! | Prefix                      | Module                       | Scope   |
//! |-----------------------------|------------------------------|---------|
//! | `/api/v1/bank/*`            | [`routes::bank`]             | Branch  |
//! | `/api/v1/collateral/*`      | [`routes::collateral`]       | Branch  |
//! | `/api/v1/funds/*`           | [`routes::funds`]            | Branch  |
//! | `/api/v1/member-asset/*`    | [`routes::member_asset`]     | Branch  |
//! | `/api/v1/member-profile/*`  | [`routes::member_profile`]   | Branch  |
//! | `/api/v1/member-type/*`     | [`routes::member_type`]      | Branch  |
//! | `/api/v1/member-type-history/*` | [`routes::member_type_history`] | Branch |
//! | `/api/v1/tag-template/*`    | [`routes::tag_template`]     | Branch  |
//! | `/api/v1/notification/*`    | [`routes::notification`]     | User    |
//! | `/api/v1/user/*`, `/api/v1/profile/*` | [`routes::user`]   | Organization |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! The auth middleware only resolves the caller; handlers decide between
//! 401 (no identity) and 400 (no branch).
//!
//! ## OpenAPI
//!
//! Generated by utoipa and served at `/openapi.json`.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod footstep;
pub mod manager;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod seed;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Build the application router.
///
/// Health probes and the OpenAPI document are mounted outside the auth
/// middleware. `/metrics` is added by the binary once the Prometheus
/// recorder is installed.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        secret: state.config.auth_secret.clone(),
    };

    let api = routes::api_router()
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .merge(openapi::router())
        .with_state(state);

    Router::new()
        .merge(unauthenticated)
        .merge(api)
        .layer(CorsLayer::permissive())
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 "ready", or 503 when the configured database does
/// not answer.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}
