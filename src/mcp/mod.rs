// MCP JSON-RPC surface over the action registry
pub mod handler;
pub mod protocol;
