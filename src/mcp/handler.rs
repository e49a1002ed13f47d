//! # MCP Handler Module
//!
//! Model Context Protocol dispatch onto the action registry.
//!
//! ## Methods
//!
//! - `initialize`
//! - `tools/list` - one tool per registered action
//! - `tools/call` - `{name, arguments: {text, ...options}}`; the name may be
//!   an action name or any of its similes
//! - `actions/validate` - `{name}`; checks configuration without running
//! - `<ACTION_NAME>` - direct call, rewritten into `tools/call`

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::actions::registry::ActionInfo;
use crate::mcp::protocol::{error_codes, Request, Response, ToolCall};
use crate::{utils, AppState};

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "ping" => Response::success(req.id, json!({})),
        "tools/list" => handle_tools_list(&req, &state),
        "tools/call" => handle_tool_call(req, &state).await,
        "actions/validate" => handle_validate(&req, &state),
        method if state.registry.find(method).is_some() => {
            handle_tool_call(req.into_tool_call(), &state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

fn unknown_action(id: Value, name: &str, state: &AppState) -> Response {
    let available: Vec<&str> = state.registry.describe().iter().map(|a| a.name).collect();
    Response::error_with_data(
        id,
        error_codes::INVALID_PARAMS,
        format!("Unknown action: {}", name),
        json!({ "available": available }),
    )
}

/// Runs the named action; its outcome always comes back as a tool result.
async fn handle_tool_call(req: Request, state: &AppState) -> Response {
    let params = match req.params {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };
    let call: ToolCall = match serde_json::from_value(params) {
        Ok(call) => call,
        Err(e) => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                format!("Invalid tools/call params: {}", e),
            )
        }
    };

    let (name, request) = call.into_request();
    let action = match state.registry.find(&name) {
        Some(action) => action,
        None => {
            warn!("No action answers to {}", name);
            return unknown_action(req.id, &name, state);
        }
    };

    let outcome = action.handle(&request, state.settings.as_ref(), None).await;
    Response::tool_result(req.id, &outcome)
}

fn handle_validate(req: &Request, state: &AppState) -> Response {
    let empty = json!({});
    let params = req.params.as_ref().unwrap_or(&empty);
    let name = match utils::get_required_arg::<String>(params, "name", &req.id) {
        Ok(name) => name,
        Err(resp) => return resp,
    };
    let action = match state.registry.find(&name) {
        Some(action) => action,
        None => return unknown_action(req.id.clone(), &name, state),
    };
    let result = match action.validate(state.settings.as_ref()) {
        Ok(valid) => json!({ "name": action.name(), "valid": valid }),
        Err(e) => json!({ "name": action.name(), "valid": false, "error": e.to_string() }),
    };
    Response::success(req.id.clone(), result)
}

fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": "chain_actions",
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions = "Blockchain actions for a conversational agent: ERC-20 airdrops on NeoX, \
         explorer queries, and NEAR token deployment. Pass the user's message as `text`.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": "2025-06-18",
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

fn tool_definition(info: &ActionInfo) -> Value {
    json!({
        "name": info.name,
        "description": info.description,
        "similes": info.similes,
        "requiredSettings": info.required_settings,
        "examples": info.examples,
        "inputSchema": {
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "The user's message." }
            },
            "required": ["text"],
            "additionalProperties": true
        }
    })
}

fn handle_tools_list(req: &Request, state: &AppState) -> Response {
    let tools: Vec<Value> = state.registry.describe().iter().map(tool_definition).collect();
    Response::success(req.id.clone(), json!({ "tools": tools }))
}
