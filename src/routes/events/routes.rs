use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::routes::reject;
use crate::state::AppState;
use super::{ClearedResponse, EventForm, ResultsResponse};

/// Send one event over the ingestion API and record the outcome
pub async fn send(
    State(state): State<AppState>,
    Json(payload): Json<EventForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let event = payload
        .into_event(chrono::Utc::now().timestamp_millis())
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let result = state.console.send_event(event).await.map_err(reject)?;

    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn list_results(State(state): State<AppState>) -> impl IntoResponse {
    let (results, summary) = state.console.results().await;
    Json(ResultsResponse { summary, results })
}

pub async fn clear_results(State(state): State<AppState>) -> impl IntoResponse {
    state.console.clear_results().await;
    Json(ClearedResponse { cleared: true })
}
