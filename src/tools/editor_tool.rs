//! `str_replace_editor`: view/str_replace/create against a host directory,
//! with no session involved. Shares its command vocabulary with
//! [`crate::tools::session_editor_tool`].

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::editor::NonSessionedEditor;
use crate::envelope::ToolResult;
use crate::error::EditorError;
use crate::registry::Tool;

pub struct EditorTool {
    editor: NonSessionedEditor,
}

impl EditorTool {
    #[must_use]
    pub fn new(editor: NonSessionedEditor) -> Self {
        Self { editor }
    }
}

#[async_trait]
impl Tool for EditorTool {
    fn name(&self) -> &str {
        "str_replace_editor"
    }

    fn description(&self) -> &str {
        "View, create, and edit files by exact string replacement, resolved \
         against a fixed base directory."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "enum": ["view", "str_replace", "create"] },
                "path": { "type": "string" },
                "view_range": { "type": "array", "items": { "type": "integer" } },
                "old_str": { "type": "string" },
                "new_str": { "type": "string" },
                "file_text": { "type": "string" },
                "replace_all": { "type": "boolean" },
            },
            "required": ["command", "path"],
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let outcome = run(&self.editor, &arguments).await;
        match outcome {
            Ok(text) => ToolResult::ok(text),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

async fn run(editor: &NonSessionedEditor, arguments: &Value) -> Result<String, EditorError> {
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
            editor.view(path, view_range).await
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
            editor.str_replace(path, old_str, new_str, replace_all).await
        }
        "create" => {
            let file_text = arguments
                .get("file_text")
                .and_then(Value::as_str)
                .ok_or(EditorError::MissingParameter("file_text"))?;
            editor.create(path, file_text).await
        }
        other => Err(EditorError::UnknownCommand(other.to_string())),
    }
}
