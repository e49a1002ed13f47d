//! # API Module
//!
//! HTTP surface over the action registry.
//!
//! ## Available Endpoints
//!
//! - `GET /api/health` - liveness and number of registered actions
//! - `GET /api/actions` - names, similes, descriptions and examples
//! - `POST /api/actions/:name` - run an action with `{text, options}`
//! - `GET /api/actions/:name/validate` - configuration check only
//! - `POST /api/rpc` - the MCP JSON-RPC methods over HTTP

pub mod actions;
pub mod health;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::mcp::{
    handler::handle_mcp_request,
    protocol::{error_codes, Request, Response},
};
use crate::AppState;

// Forward JSON-RPC requests over HTTP to the MCP handler
pub async fn rpc_handler(State(state): State<AppState>, Json(req): Json<Request>) -> Json<Response> {
    match handle_mcp_request(req, state).await {
        Some(resp) => Json(resp),
        None => Json(Response::error(
            serde_json::Value::Null,
            error_codes::INVALID_REQUEST,
            "Notifications are not supported over HTTP".into(),
        )),
    }
}

/// The full HTTP application, routes nested under `/api`.
pub fn router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/actions", get(actions::list_actions_handler))
        .route("/actions/:name", post(actions::invoke_action_handler))
        .route("/actions/:name/validate", get(actions::validate_action_handler))
        .route("/rpc", post(rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
