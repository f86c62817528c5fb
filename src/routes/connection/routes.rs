use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::routes::reject;
use crate::state::AppState;
use super::ConnectionRequest;

/// Last saved connection settings
pub async fn get(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.console.connection().await)
}

/// Apply connection settings and initialize the analytics SDK
pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<ConnectionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .console
        .update_connection(payload.into())
        .await
        .map_err(reject)?;

    Ok(Json(state.console.view().await))
}

pub async fn clear(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.console.clear_connection().await)
}
