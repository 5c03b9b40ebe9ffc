//! JSON-RPC 2.0 message types and the method dispatcher.
//!
//! A single [`dispatch`] entry point is shared by both transports: each
//! parses a line of input into a [`serde_json::Value`], hands it here, and
//! writes back whatever this returns (or nothing, for notifications).

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::registry::ToolRegistry;

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// A parsed JSON-RPC 2.0 request or notification (notifications have no `id`).
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Build a JSON-RPC success response envelope.
fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

/// Build a JSON-RPC error response envelope. `id` is `Value::Null` when the
/// request couldn't even be parsed far enough to find one.
fn failure(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() },
    })
}

/// Parse a raw line of input. `Err` carries a fully-formed `-32700` response
/// body (the line wasn't valid JSON at all, so there is no request id to echo).
pub fn parse_line(line: &str) -> Result<Request, Value> {
    serde_json::from_str::<Request>(line)
        .map_err(|e| failure(Value::Null, PARSE_ERROR, format!("Parse error: {e}")))
}

/// Dispatch a parsed request against the tool registry. Returns `None` for
/// notifications (requests with no `id`), which per JSON-RPC 2.0 get no reply.
pub async fn dispatch(request: Request, registry: &ToolRegistry) -> Option<Value> {
    let id = request.id.clone();

    let result = match request.method.as_str() {
        "initialize" => Ok(handle_initialize()),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": registry.list_schemas() })),
        "tools/call" => handle_tools_call(&request.params, registry).await,
        other => Err((METHOD_NOT_FOUND, format!("Method not found: {other}"))),
    };

    let id = id?;
    Some(match result {
        Ok(value) => success(id, value),
        Err((code, message)) => failure(id, code, message),
    })
}

fn handle_initialize() -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": "shellmcp", "version": env!("CARGO_PKG_VERSION") },
    })
}

async fn handle_tools_call(
    params: &Value,
    registry: &ToolRegistry,
) -> Result<Value, (i64, String)> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| (INVALID_PARAMS, "Invalid params: missing 'name'".to_string()))?;

    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    let tool = registry
        .resolve(name)
        .ok_or_else(|| (INVALID_PARAMS, format!("Invalid params: unknown tool '{name}'")))?;

    let result = tool.execute(arguments).await;
    serde_json::to_value(result).map_err(|e| (INTERNAL_ERROR, format!("Internal error: {e}")))
}
