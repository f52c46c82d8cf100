use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::metrics;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let api = state.settings().api();
    let response = RootResponse {
        message: api.project_name.clone(),
        version: api.version.clone(),
        api_prefix: api.api_v1_str.clone(),
    };

    Json(response)
}

pub(crate) async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut status = "healthy".to_string();
    let mut code = StatusCode::OK;
    let mut components = HashMap::new();

    let backend = state.settings().storage().backend.as_str();
    match state.store().health().await {
        Ok(()) => {
            components.insert(backend.to_string(), "healthy".to_string());
        }
        Err(err) => {
            components.insert(backend.to_string(), format!("unhealthy: {err}"));
            status = "unhealthy".to_string();
            code = StatusCode::SERVICE_UNAVAILABLE;
        }
    }
    components.insert("timers".to_string(), state.timers().len().to_string());

    (code, Json(HealthResponse { service: "quizglass".to_string(), status, components }))
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
