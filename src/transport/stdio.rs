//! Stdio transport: newline-framed JSON-RPC over standard input/output.
//!
//! Every request carrying an `id` is dispatched on its own task so a
//! long-running tool call never blocks unrelated requests; responses are
//! serialised onto standard output through a single write guard so
//! interleaved completions never corrupt the line-delimited wire format.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::registry::ToolRegistry;
use crate::rpc;

/// Serve JSON-RPC requests read from `stdin`, writing responses to `stdout`.
/// Runs until `stdin` reaches EOF.
pub async fn serve(registry: Arc<ToolRegistry>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = Arc::new(Mutex::new(tokio::io::stdout()));
    let mut lines = BufReader::new(stdin).lines();

    let mut tasks = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let registry = registry.clone();
        let stdout = stdout.clone();
        let task = tokio::spawn(async move {
            let response = match rpc::parse_line(&line) {
                Ok(request) => {
                    let has_id = request.id.is_some();
                    let response = rpc::dispatch(request, &registry).await;
                    if !has_id {
                        return;
                    }
                    response
                }
                Err(error_body) => Some(error_body),
            };

            if let Some(value) = response {
                write_line(&stdout, &value).await;
            }
        });
        tasks.push(task);
    }

    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

async fn write_line(stdout: &Arc<Mutex<tokio::io::Stdout>>, value: &serde_json::Value) {
    let Ok(mut text) = serde_json::to_string(value) else {
        tracing::error!("failed to serialize response");
        return;
    };
    text.push('\n');

    let mut out = stdout.lock().await;
    if out.write_all(text.as_bytes()).await.is_ok() {
        let _ = out.flush().await;
    }
}
