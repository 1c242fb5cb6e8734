use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    commands: Arc<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub commands: Vec<String>,
    pub checked_at: String,
}

pub fn router(commands: Vec<String>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthState { commands: Arc::new(commands) })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: "slashbot-server",
        commands: state.commands.as_ref().clone(),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
