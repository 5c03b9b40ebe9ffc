//! Tool registry: the set of callable tools this server advertises via
//! `tools/list` and dispatches through on `tools/call`.
//!
//! A [`Tool`] is anything with a JSON schema and an async `execute`. The
//! registry additionally understands one legacy alias
//! (`str_replace_based_edit_tool` -> `str_replace_editor`), since some
//! MCP clients still send the older name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::envelope::ToolResult;

/// A single callable tool: its advertised schema plus the logic to run it.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;
    async fn execute(&self, arguments: Value) -> ToolResult;
}

/// Names that resolve to a different tool's registered name.
fn aliases() -> &'static HashMap<&'static str, &'static str> {
    static ALIASES: std::sync::OnceLock<HashMap<&'static str, &'static str>> =
        std::sync::OnceLock::new();
    ALIASES.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert("str_replace_based_edit_tool", "str_replace_editor");
        m
    })
}

/// Collection of registered tools, addressable by name for dispatch and
/// enumerable for `tools/list`.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Resolve a tool by name, following the alias table if there's no
    /// direct match.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned().or_else(|| {
            aliases()
                .get(name)
                .and_then(|canonical| self.tools.get(*canonical))
                .cloned()
        })
    }

    /// Build the `tools` array returned by `tools/list`.
    #[must_use]
    pub fn list_schemas(&self) -> Vec<Value> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by_key(|t| t.name().to_string());
        tools
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.input_schema(),
                })
            })
            .collect()
    }
}
