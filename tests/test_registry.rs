//! Tool registration, alias resolution, and `tools/list` schema ordering.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shellmcp::envelope::ToolResult;
use shellmcp::registry::{Tool, ToolRegistry};

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "echoes its input"
    }
    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object" })
    }
    async fn execute(&self, arguments: Value) -> ToolResult {
        ToolResult::ok(arguments.to_string())
    }
}

#[test]
fn list_schemas_is_sorted_by_name() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    let schemas = registry.list_schemas();
    assert_eq!(schemas[0]["name"], "echo");
}

#[test]
fn resolve_follows_alias_table() {
    let mut registry = ToolRegistry::new();
    struct Editor;
    #[async_trait]
    impl Tool for Editor {
        fn name(&self) -> &str {
            "str_replace_editor"
        }
        fn description(&self) -> &str {
            "edits files"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({})
        }
        async fn execute(&self, _arguments: Value) -> ToolResult {
            ToolResult::ok("")
        }
    }
    registry.register(Arc::new(Editor));
    assert!(registry.resolve("str_replace_based_edit_tool").is_some());
    assert!(registry.resolve("nonexistent").is_none());
}
