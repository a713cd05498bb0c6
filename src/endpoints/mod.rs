pub mod enrol;
pub mod extractors;
pub mod instances;
pub mod invitations;

use axum::Router;

use crate::config::CONFIG;
use crate::state::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/system/version", axum::routing::get(get_version))
        .nest("/enrol", enrol::enrol_routes(state.clone()))
        .nest("/api/courses", course_routes(state))
}

/// Course-scoped API routes under /api/courses/*
fn course_routes(state: AppState) -> Router {
    Router::new()
        .merge(invitations::invitations_routes(state.clone()))
        .merge(instances::instances_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "version": CONFIG.version,
        "commit_hash": CONFIG.commit_hash,
        "build_time": CONFIG.build_time,
        "rust_version": "1.83",
        "backend": "rust"
    }))
}
