//! End-to-end scenarios against the assembled tool registry, mirroring the
//! numbered walkthroughs a client driving the JSON-RPC surface would see.

use std::sync::Arc;

use serde_json::json;
use shellmcp::editor::NonSessionedEditor;
use shellmcp::envelope::ToolResult;
use shellmcp::registry::{Tool, ToolRegistry};
use shellmcp::rpc::{self, Request};
use shellmcp::session::{SessionManager, SessionManagerConfig};
use shellmcp::tools::{BashTool, EditorTool, SessionEditorTool, SessionExecTool, SessionListTool, SessionStartTool, SessionStopTool};

fn test_session_manager() -> Arc<SessionManager> {
    Arc::new(SessionManager::new(SessionManagerConfig {
        max_output_chars: 30_000,
        max_timeout_ms: 600_000,
        default_timeout_ms: 5_000,
        ready_timeout_s: 30,
        run_as_user: None,
    }))
}

fn registry_with(base_dir: std::path::PathBuf, manager: Arc<SessionManager>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(BashTool));
    registry.register(Arc::new(EditorTool::new(NonSessionedEditor::new(base_dir))));
    registry.register(Arc::new(SessionStartTool::new(manager.clone(), "session")));
    registry.register(Arc::new(SessionExecTool::new(manager.clone(), "session")));
    registry.register(Arc::new(SessionStopTool::new(manager.clone(), "session")));
    registry.register(Arc::new(SessionListTool::new(manager.clone(), "session")));
    registry.register(Arc::new(SessionEditorTool::new(manager, "session")));
    registry
}

/// Scenario 1: create/edit/view cycle.
#[tokio::test]
async fn create_edit_view_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let editor = EditorTool::new(NonSessionedEditor::new(dir.path().to_path_buf()));

    let created = editor
        .execute(json!({
            "command": "create",
            "path": "t.txt",
            "file_text": "Hello World\nThis is a test\nAnother line",
        }))
        .await;
    assert_eq!(created.content[0].text, "File created successfully at t.txt");

    let edited = editor
        .execute(json!({
            "command": "str_replace",
            "path": "t.txt",
            "old_str": "Hello World",
            "new_str": "Hello Julia",
        }))
        .await;
    assert_eq!(
        edited.content[0].text,
        "The file t.txt has been edited successfully."
    );

    let viewed = editor.execute(json!({ "command": "view", "path": "t.txt" })).await;
    assert!(viewed.content[0].text.starts_with("1\tHello Julia"));
}

/// Scenario 2: ambiguous replace is rejected unless `replace_all`.
#[tokio::test]
async fn ambiguous_replace_then_replace_all() {
    let dir = tempfile::tempdir().unwrap();
    let editor = EditorTool::new(NonSessionedEditor::new(dir.path().to_path_buf()));

    editor
        .execute(json!({ "command": "create", "path": "f.txt", "file_text": "foo bar\nfoo baz\nfoo qux" }))
        .await;

    let rejected = editor
        .execute(json!({ "command": "str_replace", "path": "f.txt", "old_str": "foo", "new_str": "bar" }))
        .await;
    assert!(rejected.is_error);
    assert!(rejected.content[0].text.contains("1, 2, 3"));

    let replaced = editor
        .execute(json!({
            "command": "str_replace", "path": "f.txt", "old_str": "foo", "new_str": "bar", "replace_all": true,
        }))
        .await;
    assert!(!replaced.is_error);
    assert!(replaced.content[0].text.contains("Made 3 replacements"));
}

/// Scenario 3: bash non-zero exit is surfaced in text, not as an MCP error.
#[tokio::test]
async fn bash_nonzero_exit_is_not_an_mcp_error() {
    let bash = BashTool;
    let result = bash.execute(json!({ "command": "exit 42" })).await;
    assert!(!result.is_error);
    assert!(result.content[0].text.contains("Exit code: 42"));
}

/// Scenario 4: bash timeout reports elapsed time in the expected window.
#[tokio::test]
async fn bash_timeout_is_reported() {
    let bash = BashTool;
    let started = std::time::Instant::now();
    let result = bash.execute(json!({ "command": "sleep 10", "timeout": 2 })).await;
    let elapsed = started.elapsed().as_secs_f64();

    assert!(result.is_error);
    assert!(result.content[0].text.contains("timed out after 2 seconds"));
    assert!((2.0..5.0).contains(&elapsed));
}

/// Scenario 5: a session persists working directory across calls.
#[tokio::test]
async fn session_persistence_scenario() {
    let manager = test_session_manager();
    let start = SessionStartTool::new(manager.clone(), "session");
    let exec = SessionExecTool::new(manager.clone(), "session");
    let stop = SessionStopTool::new(manager.clone(), "session");

    let started = start.execute(json!({})).await;
    let session_id = started.content[0]
        .text
        .trim_start_matches("Session '")
        .split('\'')
        .next()
        .unwrap()
        .to_string();

    let cd = exec
        .execute(json!({ "session_id": session_id, "command": "cd /tmp" }))
        .await;
    assert!(!cd.is_error);

    let pwd = exec
        .execute(json!({ "session_id": session_id, "command": "pwd" }))
        .await;
    assert!(!pwd.is_error);
    assert!(pwd.content[0].text.contains("/tmp"));

    let stopped = stop.execute(json!({ "session_id": session_id })).await;
    assert_eq!(stopped.content[0].text, format!("Session '{session_id}' stopped."));
}

/// Scenario 6: the initialize handshake advertises the right capabilities.
#[tokio::test]
async fn initialize_handshake() {
    let registry = ToolRegistry::new();
    let req = Request {
        jsonrpc: Some("2.0".into()),
        method: "initialize".into(),
        params: json!(null),
        id: Some(json!(1)),
    };
    let resp = rpc::dispatch(req, &registry).await.unwrap();
    assert_eq!(resp["result"]["protocolVersion"], json!("2024-11-05"));
    assert!(resp["result"]["serverInfo"]["name"].is_string());
    assert_eq!(resp["result"]["capabilities"]["tools"]["listChanged"], json!(false));
}

/// Tool-name aliasing: the vendor name routes to the local editor tool.
#[tokio::test]
async fn tool_call_follows_alias_table() {
    let dir = tempfile::tempdir().unwrap();
    let manager = test_session_manager();
    let registry = registry_with(dir.path().to_path_buf(), manager);

    let req = Request {
        jsonrpc: Some("2.0".into()),
        method: "tools/call".into(),
        params: json!({
            "name": "str_replace_based_edit_tool",
            "arguments": { "command": "create", "path": "aliased.txt", "file_text": "x" },
        }),
        id: Some(json!(7)),
    };
    let resp = rpc::dispatch(req, &registry).await.unwrap();
    assert!(resp.get("error").is_none());
    assert!(
        resp["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("created successfully")
    );
}

/// Unknown tool names surface as an invalid-params JSON-RPC error, not a
/// generic method-not-found.
#[tokio::test]
async fn unknown_tool_name_reports_invalid_params() {
    let registry = ToolRegistry::new();
    let req = Request {
        jsonrpc: Some("2.0".into()),
        method: "tools/call".into(),
        params: json!({ "name": "no_such_tool", "arguments": {} }),
        id: Some(json!(1)),
    };
    let resp = rpc::dispatch(req, &registry).await.unwrap();
    assert_eq!(resp["error"]["code"], json!(-32602));
}

/// The wire envelope must use `isError`, not the Rust field's `is_error`.
#[test]
fn tool_result_serializes_is_error_as_camel_case() {
    let ok = serde_json::to_value(ToolResult::ok("done")).unwrap();
    assert_eq!(ok["isError"], json!(false));
    assert!(ok.get("is_error").is_none());

    let err = serde_json::to_value(ToolResult::error("boom")).unwrap();
    assert_eq!(err["isError"], json!(true));
    assert!(err.get("is_error").is_none());
}
