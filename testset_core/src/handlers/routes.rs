//! Route table for the test-set service

use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use super::{evaluators, health, session, testsets};
use crate::{models::ApiResponse, AppState};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::handle_health))
        .route("/api/testsets/export", post(testsets::export_csv))
        .route("/api/testsets/save", post(testsets::save_csv))
        .route("/api/testsets/validate", post(testsets::validate_testset))
        .route(
            "/api/evaluator-configs",
            get(evaluators::list_evaluator_configs).post(evaluators::create_evaluator_config),
        )
        .route("/api/evaluator-configs/:id", delete(evaluators::delete_evaluator_config))
        .route("/api/session", get(session::get_session))
        .route("/api/session/logout", post(session::logout))
        .fallback(handle_not_found)
}

async fn handle_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(format!("No route for {}", uri.path()))),
    )
}
