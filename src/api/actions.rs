use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::actions::{ActionOutcome, ActionRequest};
use crate::AppState;

// The result of a configuration-only check.
#[derive(Debug, Serialize)]
pub struct ValidationOutput {
    pub name: &'static str,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn unknown_action(name: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("Unknown action: {}", name) })),
    )
        .into_response()
}

// Failure kinds that are the caller's fault map to 4xx, the rest to 5xx.
fn status_for(outcome: &ActionOutcome) -> StatusCode {
    if outcome.success {
        return StatusCode::OK;
    }
    let kind = outcome
        .payload
        .as_ref()
        .and_then(|p| p.get("kind"))
        .and_then(|k| k.as_str())
        .unwrap_or_default();
    match kind {
        "extraction_failure" | "invalid_parameter" => StatusCode::BAD_REQUEST,
        "deployment_conflict" => StatusCode::CONFLICT,
        "remote_call_failure" | "malformed_response" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// GET /actions
pub async fn list_actions_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.describe())
}

// POST /actions/:name with `{text, options}`
pub async fn invoke_action_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> impl IntoResponse {
    let action = match state.registry.find(&name) {
        Some(action) => action,
        None => {
            warn!("HTTP call for unknown action {}", name);
            return unknown_action(&name);
        }
    };
    info!("HTTP invocation of {}", action.name());
    let outcome = action.handle(&request, state.settings.as_ref(), None).await;
    (status_for(&outcome), Json(outcome)).into_response()
}

// GET /actions/:name/validate
pub async fn validate_action_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let action = match state.registry.find(&name) {
        Some(action) => action,
        None => return unknown_action(&name),
    };
    let output = match action.validate(state.settings.as_ref()) {
        Ok(valid) => ValidationOutput {
            name: action.name(),
            valid,
            error: None,
        },
        Err(e) => ValidationOutput {
            name: action.name(),
            valid: false,
            error: Some(e.to_string()),
        },
    };
    (StatusCode::OK, Json(output)).into_response()
}
