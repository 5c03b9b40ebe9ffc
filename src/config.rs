//! CLI configuration.
//!
//! Selects a transport (stdio by default, or a Unix domain socket) and
//! exposes the [`SessionManager`](crate::session::SessionManager) tuning
//! constants from spec §3 as flags, defaulting to the spec's values.

use std::path::PathBuf;

use clap::Parser;

/// An MCP server exposing persistent shell sessions, ad-hoc shell execution,
/// and a string-replace file editor over JSON-RPC 2.0.
#[derive(Debug, Parser)]
#[command(name = "shellmcp", version, about)]
pub struct Cli {
    /// Serve on a Unix domain socket at this path instead of stdio.
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Remove a stale socket file at `--socket` before binding.
    #[arg(long, default_value_t = true)]
    pub unlink_existing: bool,

    /// Prefix for the session tool names (`<prefix>_start`, `<prefix>_exec`, ...).
    #[arg(long, default_value = "session")]
    pub tool_prefix: String,

    /// Base directory the non-sessioned editor resolves relative paths against.
    #[arg(long)]
    pub editor_base_dir: Option<PathBuf>,

    /// Maximum characters of output `session_exec` returns before truncating.
    #[arg(long, default_value_t = 30_000)]
    pub max_output_chars: usize,

    /// Ceiling `session_exec`'s `timeout_ms` is clamped to.
    #[arg(long, default_value_t = 600_000)]
    pub max_timeout_ms: u64,

    /// Default `timeout_ms` for `session_exec` when the caller omits one.
    #[arg(long, default_value_t = 120_000)]
    pub default_timeout_ms: u64,

    /// Seconds to wait for a newly spawned shell to become ready.
    #[arg(long, default_value_t = 300)]
    pub ready_timeout_s: u64,

    /// Run session shells as this user (via `setuid`), instead of the
    /// server's own user. Requires the server to be running as root.
    #[arg(long)]
    pub run_as_user: Option<String>,
}

impl Cli {
    #[must_use]
    pub fn session_manager_config(&self) -> crate::session::SessionManagerConfig {
        crate::session::SessionManagerConfig {
            max_output_chars: self.max_output_chars,
            max_timeout_ms: self.max_timeout_ms,
            default_timeout_ms: self.default_timeout_ms,
            ready_timeout_s: self.ready_timeout_s,
            run_as_user: self.run_as_user.clone(),
        }
    }
}
