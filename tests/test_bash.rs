//! The stateless `bash` tool's wire formatting, driven through
//! `BashTool::execute` with real shell commands rather than the private
//! formatting helpers.

use serde_json::json;
use shellmcp::registry::Tool;
use shellmcp::tools::BashTool;

#[tokio::test]
async fn nonzero_exit_is_not_an_error() {
    let result = BashTool.execute(json!({ "command": "exit 42" })).await;
    assert!(!result.is_error);
    assert!(result.content[0].text.contains("Exit code: 42"));
}

#[tokio::test]
async fn empty_success_renders_system_message() {
    let result = BashTool.execute(json!({ "command": "true" })).await;
    assert_eq!(
        result.content[0].text,
        "<system>Tool ran without output or errors</system>"
    );
}

#[tokio::test]
async fn stderr_is_demarcated() {
    let result = BashTool
        .execute(json!({ "command": "echo out; echo oops >&2" }))
        .await;
    assert!(result.content[0].text.contains("--- stderr ---"));
    assert!(result.content[0].text.contains("oops"));
}

#[tokio::test]
async fn timeout_is_reported_as_error() {
    let result = BashTool
        .execute(json!({ "command": "sleep 10", "timeout": 2 }))
        .await;
    assert!(result.is_error);
    assert!(result.content[0].text.contains("timed out after 2 seconds"));
}

#[tokio::test]
async fn truncates_long_output_with_notice() {
    let result = BashTool
        .execute(json!({ "command": "yes a | head -c 40000" }))
        .await;
    assert!(!result.is_error);
    assert!(result.content[0].text.contains("output truncated"));
}

#[tokio::test]
async fn missing_command_is_tool_error() {
    let result = BashTool.execute(json!({})).await;
    assert!(result.is_error);
}
