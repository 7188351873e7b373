pub mod auth;
pub mod reports;

use std::path::Path;

use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::openapi::ApiDoc;
use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public form API, session routes,
/// the guarded dashboard API and the static front-end as fallback.
pub fn build_router(state: ServerState, cors: CorsLayer, static_dir: &str) -> Router {
    let index = Path::new(static_dir).join("index.html");
    let static_files = ServeDir::new(static_dir).fallback(ServeFile::new(index));

    // Public routes (health + form + login)
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/api/reference", get(reports::reference))
        .route("/api/reports", post(reports::submit_report))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    // Dashboard routes behind the session guard
    let admin = Router::new()
        .route("/admin/reports", get(reports::list_reports))
        .route("/admin/reports/export", get(reports::export_reports))
        .route("/admin/reports/:id", delete(reports::delete_report))
        .route("/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session_state));

    public
        .merge(admin)
        .fallback_service(static_files)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
