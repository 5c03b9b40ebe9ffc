//! The uniform tool result envelope: `{content:[{type,text}], isError}`.
//!
//! Every tool returns exactly this shape (spec §4.3, §6). It is the only
//! value the dispatcher ever places into a `tools/call` JSON-RPC result.

use serde::Serialize;


/// One piece of content in a tool result. Only `text` content is produced
/// by this server (spec's Non-goals exclude richer content types).
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ContentItem {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_owned(),
            text: text.into(),
        }
    }
}

/// The envelope every tool `execute` call returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
    pub is_error: bool,
}

impl ToolResult {
    /// Build a successful, single-text-block result.
    #[must_use]
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            is_error: false,
        }
    }

    /// Build an error result (tool-level error, not a JSON-RPC protocol error).
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            is_error: true,
        }
    }
}
