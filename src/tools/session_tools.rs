//! The four-tool session surface: `<prefix>_start`, `<prefix>_exec`,
//! `<prefix>_stop`, `<prefix>_list`, wrapping a shared [`SessionManager`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::envelope::ToolResult;
use crate::registry::Tool;
use crate::session::{SessionManager, StartSessionParams};

/// `<prefix>_start`: spawn a new session shell. The embedder may extend the
/// schema with extra properties and required names (spec §4.4.4), e.g. to
/// mandate `workdir` or `user`.
pub struct SessionStartTool {
    manager: Arc<SessionManager>,
    name: String,
    extra_properties: Value,
    extra_required: Vec<String>,
}

impl SessionStartTool {
    #[must_use]
    pub fn new(manager: Arc<SessionManager>, prefix: &str) -> Self {
        Self {
            manager,
            name: format!("{prefix}_start"),
            extra_properties: json!({}),
            extra_required: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_schema_extension(mut self, extra_properties: Value, extra_required: Vec<String>) -> Self {
        self.extra_properties = extra_properties;
        self.extra_required = extra_required;
        self
    }
}

#[async_trait]
impl Tool for SessionStartTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Start a new persistent interactive shell session and return its session_id."
    }

    fn input_schema(&self) -> Value {
        let mut properties = json!({
            "working_directory": { "type": "string", "description": "Initial working directory." },
            "metadata": { "type": "object", "description": "Opaque key/value display metadata." },
        });
        if let (Some(base), Some(extra)) = (properties.as_object_mut(), self.extra_properties.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        let mut required = self.extra_required.clone();
        required.sort();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let working_directory = arguments
            .get("working_directory")
            .and_then(Value::as_str)
            .map(str::to_string);

        let metadata: HashMap<String, String> = arguments
            .get("metadata")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let params = StartSessionParams {
            working_directory,
            metadata,
        };

        match self.manager.start_session(params).await {
            Ok(info) => ToolResult::ok(format!("Session '{}' started.", info.id)),
            Err(e) => ToolResult::error(format!("Failed to start session: {e}")),
        }
    }
}

/// `<prefix>_exec`: run one command in an existing session.
pub struct SessionExecTool {
    manager: Arc<SessionManager>,
    name: String,
}

impl SessionExecTool {
    #[must_use]
    pub fn new(manager: Arc<SessionManager>, prefix: &str) -> Self {
        Self {
            manager,
            name: format!("{prefix}_exec"),
        }
    }
}

#[async_trait]
impl Tool for SessionExecTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Run a command in an existing persistent shell session, preserving \
         working directory, environment variables, and background jobs \
         across calls."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": { "type": "string" },
                "command": { "type": "string" },
                "timeout": { "type": "integer", "description": "Timeout in milliseconds." },
                "description": { "type": "string" },
            },
            "required": ["session_id", "command"],
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let Some(session_id) = arguments.get("session_id").and_then(Value::as_str) else {
            return ToolResult::error("missing required parameter: session_id");
        };
        let Some(command) = arguments.get("command").and_then(Value::as_str) else {
            return ToolResult::error("missing required parameter: command");
        };
        let timeout_ms = arguments.get("timeout").and_then(Value::as_u64);

        let result = self.manager.exec(session_id, command, timeout_ms).await;

        if result.exit_code == 0 {
            return ToolResult::ok(result.output);
        }

        let suffix = if result.process_died {
            "[Process exited]".to_string()
        } else if result.timed_out {
            format!(
                "[Command timed out after {}ms]",
                self.manager.effective_timeout_ms(timeout_ms)
            )
        } else {
            format!("[Exit code: {}]", result.exit_code)
        };

        ToolResult::error(format!("{}\n{suffix}", result.output))
    }
}

/// `<prefix>_stop`: tear down a session.
pub struct SessionStopTool {
    manager: Arc<SessionManager>,
    name: String,
}

impl SessionStopTool {
    #[must_use]
    pub fn new(manager: Arc<SessionManager>, prefix: &str) -> Self {
        Self {
            manager,
            name: format!("{prefix}_stop"),
        }
    }
}

#[async_trait]
impl Tool for SessionStopTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Stop a persistent shell session, killing its process if necessary."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "session_id": { "type": "string" } },
            "required": ["session_id"],
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let Some(session_id) = arguments.get("session_id").and_then(Value::as_str) else {
            return ToolResult::error("missing required parameter: session_id");
        };

        if self.manager.stop_session(session_id).await {
            ToolResult::ok(format!("Session '{session_id}' stopped."))
        } else {
            ToolResult::error(format!("no session with id '{session_id}'"))
        }
    }
}

/// `<prefix>_list`: enumerate known sessions.
pub struct SessionListTool {
    manager: Arc<SessionManager>,
    name: String,
}

impl SessionListTool {
    #[must_use]
    pub fn new(manager: Arc<SessionManager>, prefix: &str) -> Self {
        Self {
            manager,
            name: format!("{prefix}_list"),
        }
    }
}

#[async_trait]
impl Tool for SessionListTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "List all known persistent shell sessions and whether each is still alive."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, _arguments: Value) -> ToolResult {
        let sessions = self.manager.list().await;
        if sessions.is_empty() {
            return ToolResult::ok("No active sessions.");
        }

        let lines: Vec<String> = sessions
            .iter()
            .map(|s| {
                format!(
                    "{} alive={} uptime={:.1}s metadata={:?}",
                    s.id, s.alive, s.uptime_seconds, s.metadata
                )
            })
            .collect();
        ToolResult::ok(lines.join("\n"))
    }
}
