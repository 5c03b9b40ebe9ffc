//! `session_str_replace_editor`: the same view/str_replace/create vocabulary
//! as [`crate::tools::editor_tool`], but proxied through a session's shell
//! (spec §4.5) so paths are resolved inside that session's filesystem view.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::editor::sessioned;
use crate::envelope::ToolResult;
use crate::error::EditorError;
use crate::registry::Tool;
use crate::session::SessionManager;

pub struct SessionEditorTool {
    manager: Arc<SessionManager>,
    name: String,
}

impl SessionEditorTool {
    #[must_use]
    pub fn new(manager: Arc<SessionManager>, prefix: &str) -> Self {
        Self {
            manager,
            name: format!("{prefix}_str_replace_editor"),
        }
    }
}

#[async_trait]
impl Tool for SessionEditorTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "View, create, and edit files inside a persistent shell session's \
         filesystem view by exact string replacement."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": { "type": "string" },
                "command": { "type": "string", "enum": ["view", "str_replace", "create"] },
                "path": { "type": "string" },
                "view_range": { "type": "array", "items": { "type": "integer" } },
                "old_str": { "type": "string" },
                "new_str": { "type": "string" },
                "file_text": { "type": "string" },
                "replace_all": { "type": "boolean" },
            },
            "required": ["session_id", "command", "path"],
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        match run(&self.manager, &arguments).await {
            Ok(text) => ToolResult::ok(text),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

async fn run(manager: &SessionManager, arguments: &Value) -> Result<String, EditorError> {
    let session_id = arguments
        .get("session_id")
        .and_then(Value::as_str)
        .ok_or(EditorError::MissingParameter("session_id"))?;
    let command = arguments
        .get("command")
        .and_then(Value::as_str)
        .ok_or(EditorError::MissingParameter("command"))?;
    let path = arguments
        .get("path")
        .and_then(Value::as_str)
        .ok_or(EditorError::MissingParameter("path"))?;

    match command {
        "view" => {
            let view_range = arguments
                .get("view_range")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(Value::as_i64).collect::<Vec<_>>());
            sessioned::view(manager, session_id, path, view_range).await
        }
        "str_replace" => {
            let old_str = arguments
                .get("old_str")
                .and_then(Value::as_str)
                .ok_or(EditorError::MissingParameter("old_str"))?;
            let new_str = arguments.get("new_str").and_then(Value::as_str).unwrap_or("");
            let replace_all = arguments
                .get("replace_all")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            sessioned::str_replace(manager, session_id, path, old_str, new_str, replace_all).await
        }
        "create" => {
            let file_text = arguments
                .get("file_text")
                .and_then(Value::as_str)
                .ok_or(EditorError::MissingParameter("file_text"))?;
            sessioned::create(manager, session_id, path, file_text).await
        }
        other => Err(EditorError::UnknownCommand(other.to_string())),
    }
}
