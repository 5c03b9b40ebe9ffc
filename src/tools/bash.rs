//! The stateless `bash` tool: one `/bin/sh -c <command>` per call, text
//! formatting per spec §6 — non-zero exit is not an MCP-level error.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::envelope::ToolResult;
use crate::process::{self, ProcessConfig, ProcessResult};
use crate::registry::Tool;

/// Output is truncated to this many bytes, with a visible notice appended.
const MAX_OUTPUT_BYTES: usize = 30_720;

pub struct BashTool;

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Run a shell command in a fresh process and return its output. \
         Each call is independent: no state (working directory, environment, \
         background jobs) is shared with previous calls."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "The shell command to run." },
                "timeout": { "type": "integer", "description": "Timeout in seconds." },
                "working_directory": { "type": "string" },
            },
            "required": ["command"],
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let Some(command) = arguments.get("command").and_then(Value::as_str) else {
            return ToolResult::error("missing required parameter: command");
        };

        let timeout_seconds = process::clamp_timeout(arguments.get("timeout").and_then(Value::as_u64));

        let config = ProcessConfig {
            command: command.to_string(),
            working_directory: arguments
                .get("working_directory")
                .and_then(Value::as_str)
                .map(str::to_string),
            timeout_seconds,
        };

        let result = process::run(&config).await;
        format_result(&result, timeout_seconds)
    }
}

fn compose_body(result: &ProcessResult) -> String {
    let mut body = String::new();
    let stdout = result.stdout.trim_end_matches('\n');
    if !stdout.is_empty() {
        body.push_str(stdout);
    }
    let stderr = result.stderr.trim_end_matches('\n');
    if !stderr.is_empty() {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str("--- stderr ---\n");
        body.push_str(stderr);
    }
    body
}

/// Truncate `body` to `max_bytes`, at a char boundary, with a visible notice
/// describing how much was cut.
fn truncate_to_bytes(body: &str, max_bytes: usize) -> String {
    if body.len() <= max_bytes {
        return body.to_string();
    }
    let mut cut = max_bytes;
    while cut > 0 && !body.is_char_boundary(cut) {
        cut -= 1;
    }
    let omitted = body.len() - cut;
    format!(
        "{}\n... [output truncated, {omitted} bytes omitted] ...",
        &body[..cut]
    )
}

fn format_result(result: &ProcessResult, timeout_seconds: Option<u64>) -> ToolResult {
    let body = compose_body(result);

    if result.timed_out {
        let secs = timeout_seconds.unwrap_or(0);
        let text = if body.is_empty() {
            format!("Command timed out after {secs} seconds.")
        } else {
            format!("{}\nCommand timed out after {secs} seconds.", truncate_to_bytes(&body, MAX_OUTPUT_BYTES))
        };
        return ToolResult::error(text);
    }

    if body.is_empty() && result.exit_code == 0 {
        return ToolResult::ok("<system>Tool ran without output or errors</system>");
    }

    let truncated = truncate_to_bytes(&body, MAX_OUTPUT_BYTES);
    let text = format!("{truncated}\nExit code: {}", result.exit_code);
    ToolResult::ok(text)
}
