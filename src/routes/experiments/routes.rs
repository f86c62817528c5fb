use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::routes::reject;
use crate::state::AppState;
use super::{validate_server_url, FlagKeyRequest, FlagKeyResponse, UpdateDraftRequest};

pub async fn get_draft(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.console.experiment_draft().await)
}

/// Edit deployment key, server url or environment of the draft
pub async fn update_draft(
    State(state): State<AppState>,
    Json(payload): Json<UpdateDraftRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Some(ref url) = payload.server_url {
        validate_server_url(url).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    }

    let draft = state
        .console
        .edit_experiment_draft(
            payload.deployment_key.map(|k| k.trim().to_string()),
            payload.server_url.map(|u| u.trim().to_string()),
            payload.environment,
        )
        .await;

    Ok(Json(draft))
}

pub async fn reset_draft(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.console.reset_experiment_draft().await)
}

/// Add a flag key; blank or duplicate keys are not added
pub async fn add_flag_key(
    State(state): State<AppState>,
    Json(payload): Json<FlagKeyRequest>,
) -> impl IntoResponse {
    let changed = state.console.add_flag_key(&payload.key).await;
    let status = if changed { StatusCode::CREATED } else { StatusCode::OK };

    (
        status,
        Json(FlagKeyResponse {
            changed,
            draft: state.console.experiment_draft().await,
        }),
    )
}

pub async fn remove_flag_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let changed = state.console.remove_flag_key(&key).await;

    Json(FlagKeyResponse {
        changed,
        draft: state.console.experiment_draft().await,
    })
}

/// Submit the draft: start the experiment client and resolve flags
pub async fn submit(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.console.configure_experiment().await.map_err(reject)?;

    Ok((StatusCode::CREATED, Json(state.console.view().await)))
}
