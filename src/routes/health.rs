use axum::{ extract::State, Json, http::StatusCode };
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthData {
    status: u16,
    persistence: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthData> {
    let health_data = HealthData {
        status: StatusCode::OK.as_u16(),
        persistence: state.console.store_backend(),
    };
    Json(health_data)
}
