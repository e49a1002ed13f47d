// src/mcp/protocol.rs

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::actions::{ActionOutcome, ActionRequest};

#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `params` of a `tools/call`.
#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// `text` becomes the message; every other argument is an option.
    pub fn into_request(mut self) -> (String, ActionRequest) {
        let text = match self.arguments.remove("text") {
            Some(Value::String(text)) => text,
            _ => String::new(),
        };
        (
            self.name,
            ActionRequest {
                text,
                options: self.arguments,
            },
        )
    }
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

impl Request {
    pub fn is_notification(&self) -> bool {
        self.id.is_null()
    }

    /// Rewrites a direct `ACTION_NAME` call into `tools/call`.
    pub fn into_tool_call(self) -> Request {
        let arguments = self.params.unwrap_or_else(|| json!({}));
        Request {
            jsonrpc: self.jsonrpc,
            id: self.id,
            params: Some(json!({ "name": self.method, "arguments": arguments })),
            method: "tools/call".to_string(),
        }
    }
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message,
                data: None,
            }),
        }
    }

    pub fn error_with_data(id: Value, code: i32, message: String, data: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message,
                data: Some(data),
            }),
        }
    }

    /// A finished action as an MCP tool result. Action failures are tool
    /// results with `isError`, not JSON-RPC errors.
    pub fn tool_result(id: Value, outcome: &ActionOutcome) -> Self {
        let mut result = json!({
            "content": [{ "type": "text", "text": outcome.text }],
            "isError": !outcome.success,
        });
        if let (Some(payload), Value::Object(map)) = (&outcome.payload, &mut result) {
            map.insert("structuredContent".into(), payload.clone());
        }
        Self::success(id, result)
    }
}

// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_splits_text_from_options() {
        let call: ToolCall = serde_json::from_value(json!({
            "name": "AIRDROP",
            "arguments": { "text": "airdrop me", "amount": "5" }
        }))
        .unwrap();
        let (name, request) = call.into_request();
        assert_eq!(name, "AIRDROP");
        assert_eq!(request.text, "airdrop me");
        assert_eq!(request.option_str("amount").as_deref(), Some("5"));
        assert!(!request.options.contains_key("text"));
    }

    #[test]
    fn failed_outcome_is_flagged_in_tool_result() {
        let outcome = ActionOutcome {
            success: false,
            text: "Error: boom".into(),
            payload: Some(json!({ "error": "boom" })),
        };
        let response = Response::tool_result(json!(3), &outcome);
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Error: boom");
        assert_eq!(result["structuredContent"]["error"], "boom");
    }

    #[test]
    fn direct_call_is_rewrapped() {
        let req: Request = serde_json::from_value(json!({
            "id": 1, "method": "GET_NETWORK_STATS", "params": { "text": "stats" }
        }))
        .unwrap();
        let wrapped = req.into_tool_call();
        assert_eq!(wrapped.method, "tools/call");
        assert_eq!(wrapped.params.unwrap()["name"], "GET_NETWORK_STATS");
    }
}
