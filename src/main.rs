//! Entry point for the shellmcp MCP server.
//!
//! Initializes tracing (to stderr, so it doesn't interfere with either
//! transport's wire format), builds the tool registry, and serves on
//! stdio or a Unix domain socket depending on `--socket`.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use shellmcp::config::Cli;
use shellmcp::editor::NonSessionedEditor;
use shellmcp::registry::ToolRegistry;
use shellmcp::session::SessionManager;
use shellmcp::tools::{BashTool, EditorTool, SessionEditorTool, SessionExecTool, SessionListTool, SessionStartTool, SessionStopTool};
use shellmcp::transport::{socket, stdio};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting shellmcp MCP server v{}", env!("CARGO_PKG_VERSION"));

    let editor_base_dir = cli
        .editor_base_dir
        .clone()
        .map(Ok)
        .unwrap_or_else(std::env::current_dir)?;

    let session_manager = Arc::new(SessionManager::new(cli.session_manager_config()));

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(BashTool));
    registry.register(Arc::new(EditorTool::new(NonSessionedEditor::new(editor_base_dir))));
    registry.register(Arc::new(SessionStartTool::new(session_manager.clone(), &cli.tool_prefix)));
    registry.register(Arc::new(SessionExecTool::new(session_manager.clone(), &cli.tool_prefix)));
    registry.register(Arc::new(SessionStopTool::new(session_manager.clone(), &cli.tool_prefix)));
    registry.register(Arc::new(SessionListTool::new(session_manager.clone(), &cli.tool_prefix)));
    registry.register(Arc::new(SessionEditorTool::new(session_manager.clone(), &cli.tool_prefix)));
    let registry = Arc::new(registry);

    let result = match cli.socket {
        Some(path) => socket::serve(path, cli.unlink_existing, registry).await,
        None => stdio::serve(registry).await,
    };

    session_manager.stop_all_sessions().await;

    if let Err(e) = &result {
        tracing::error!("serving error: {:?}", e);
    }
    tracing::info!("shellmcp server shut down");
    result
}
