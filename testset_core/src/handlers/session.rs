use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{models::ApiResponse, session::bearer_token, AppState};

pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let session = state.session.state(bearer_token(&headers));
    Json(ApiResponse::success(session))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    state.session.logout(bearer_token(&headers));
    StatusCode::NO_CONTENT
}
