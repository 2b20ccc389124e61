use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{AppError, Result},
    evaluators::CreateEvaluatorConfig,
    models::ApiResponse,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct EvaluatorConfigQuery {
    #[serde(default)]
    pub search: String,
}

pub async fn list_evaluator_configs(
    State(state): State<AppState>,
    Query(query): Query<EvaluatorConfigQuery>,
) -> Result<impl IntoResponse> {
    info!("GET /api/evaluator-configs - search: {:?}", query.search);

    let configs = state.evaluator_configs.search(&query.search)?;
    Ok(Json(ApiResponse::success(configs)))
}

pub async fn create_evaluator_config(
    State(state): State<AppState>,
    Json(payload): Json<CreateEvaluatorConfig>,
) -> Result<impl IntoResponse> {
    info!("POST /api/evaluator-configs - name: {}", payload.name);

    let config = state.evaluator_configs.create(payload)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(config))))
}

pub async fn delete_evaluator_config(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    info!("DELETE /api/evaluator-configs/{}", id);

    if id == 0 {
        return Err(AppError::BadRequest("Invalid evaluator config ID".to_string()));
    }

    state.evaluator_configs.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
