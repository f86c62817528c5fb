use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;

mod connection;
mod events;
mod experiments;
mod flags;
mod health;
mod user_context;

pub use health::health;

use crate::console::model::PropertyBag;
use crate::console::ConsoleError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let experiment_router = Router::new()
        .route("/", post(experiments::routes::submit))
        .route(
            "/draft",
            get(experiments::routes::get_draft)
                .put(experiments::routes::update_draft)
                .delete(experiments::routes::reset_draft),
        )
        .route("/draft/flag-keys", post(experiments::routes::add_flag_key))
        .route("/draft/flag-keys/{key}", delete(experiments::routes::remove_flag_key));

    let user_context_router = Router::new()
        .route("/", put(user_context::routes::update))
        .route("/random", post(user_context::routes::randomize))
        .route("/presets", get(user_context::routes::presets));

    let flag_router = Router::new()
        .route("/refresh", post(flags::routes::refresh))
        .route("/{flag_key}/assign", post(flags::routes::assign));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                .route("/session", get(session))
                .route("/theme", get(theme))
                .route(
                    "/connection",
                    get(connection::routes::get)
                        .put(connection::routes::update)
                        .delete(connection::routes::clear),
                )
                .nest("/experiment", experiment_router)
                .nest("/user-context", user_context_router)
                .nest("/flags", flag_router)
                .route("/events", post(events::routes::send))
                .route(
                    "/results",
                    get(events::routes::list_results).delete(events::routes::clear_results),
                ),
        )
}

async fn root() -> &'static str {
    "Experiment console: analytics and experiment integration testing"
}

async fn session(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    Json(state.console.view().await)
}

async fn theme(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    Json(json!({ "isDarkTheme": state.console.is_dark_theme().await }))
}

/// Map a console failure onto the status/message pair handlers reject with.
pub fn reject(err: ConsoleError) -> (StatusCode, String) {
    let status = match &err {
        ConsoleError::MissingApiKey | ConsoleError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ConsoleError::NotInitialized | ConsoleError::NoExperiment => StatusCode::CONFLICT,
        ConsoleError::SdkInit(_) | ConsoleError::ExperimentInit(_) | ConsoleError::Resolution(_) => {
            StatusCode::BAD_GATEWAY
        }
    };
    (status, err.to_string())
}

/// Parse a free-form property field. Blank text is an empty bag; anything
/// other than a JSON object is refused.
pub fn parse_property_bag(text: &str) -> Result<PropertyBag, String> {
    if text.trim().is_empty() {
        return Ok(PropertyBag::new());
    }

    match serde_json::from_str(text) {
        Ok(serde_json::Value::Object(bag)) => Ok(bag),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
