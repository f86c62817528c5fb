use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::routes::reject;
use crate::state::AppState;
use super::{theme_presets, UserContextForm};

/// Replace the user context; flags are re-resolved when an experiment is running
pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<UserContextForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let context = payload.parse().map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    state.console.update_user_context(context).await.map_err(reject)?;

    Ok(Json(state.console.view().await))
}

pub async fn randomize(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let context = state.console.randomize_user().await.map_err(reject)?;
    Ok(Json(context))
}

pub async fn presets() -> impl IntoResponse {
    Json(theme_presets())
}
