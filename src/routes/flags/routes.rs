use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::routes::reject;
use crate::state::AppState;
use super::{parse_variant, AssignRequest, FlagsResponse};

/// Re-resolve every configured flag for the current user
pub async fn refresh(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let active_flags = state.console.refresh_flags().await.map_err(reject)?;

    Ok(Json(FlagsResponse {
        active_flags,
        is_dark_theme: state.console.is_dark_theme().await,
    }))
}

/// Manually pin a flag to control or treatment
pub async fn assign(
    State(state): State<AppState>,
    Path(flag_key): Path<String>,
    Json(payload): Json<AssignRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let variant = parse_variant(&payload.variant).map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    state
        .console
        .assign_variant(&flag_key, variant)
        .await
        .map_err(reject)?;

    let view = state.console.view().await;
    Ok(Json(FlagsResponse {
        active_flags: view.active_flags,
        is_dark_theme: view.is_dark_theme,
    }))
}
