//! Unix domain socket transport: one JSON-RPC endpoint per connected client.
//!
//! Each client gets its own read/dispatch/write loop; unlike stdio there is
//! only one writer per connection, so no write guard is needed. The listener
//! shuts down on `Ctrl-C`, removing the socket file behind it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::registry::ToolRegistry;
use crate::rpc;

/// Serve JSON-RPC requests over a Unix domain socket at `path` until the
/// process receives `Ctrl-C`, then remove the socket file.
pub async fn serve(path: PathBuf, unlink_existing: bool, registry: Arc<ToolRegistry>) -> anyhow::Result<()> {
    if unlink_existing && path.exists() {
        std::fs::remove_file(&path)?;
    }

    let listener = UnixListener::bind(&path)?;
    tracing::info!(socket = %path.display(), "listening on unix socket");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let registry = registry.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_client(stream, registry).await {
                                tracing::warn!(error = %e, "client connection ended with an error");
                            }
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received shutdown signal");
                break;
            }
        }
    }

    remove_socket(&path);
    Ok(())
}

fn remove_socket(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(error = %e, "failed to remove socket file");
        }
    }
}

async fn handle_client(stream: UnixStream, registry: Arc<ToolRegistry>) -> anyhow::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match rpc::parse_line(&line) {
            Ok(request) => rpc::dispatch(request, &registry).await,
            Err(error_body) => Some(error_body),
        };

        if let Some(value) = response {
            let mut text = serde_json::to_string(&value)?;
            text.push('\n');
            write_half.write_all(text.as_bytes()).await?;
            write_half.flush().await?;
        }
    }
    Ok(())
}
