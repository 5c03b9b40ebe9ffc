//! Domain error types.
//!
//! Protocol-level errors (malformed JSON-RPC, unknown method) are handled
//! directly by [`crate::rpc`] as `JsonRpcError` values. The errors here are
//! for conditions a caller inside this crate needs to match on or that get
//! rendered into a specific tool-error message text (spec §7).

use std::path::PathBuf;

/// Errors raised while starting, executing in, or stopping a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session '{id}' already exists")]
    AlreadyExists { id: String },

    #[error("no session with id '{id}'")]
    NotFound { id: String },

    #[error(
        "failed to start session: shell exited during startup (exit code {exit_code:?}): {detail}"
    )]
    Startup {
        exit_code: Option<i32>,
        detail: String,
    },

    #[error("timed out waiting for session to become ready after {0}s")]
    ReadyTimeout(u64),
}

/// Errors raised by the sessioned or non-sessioned editor. Variant names
/// line up with the distinct message families spec §4.5 requires.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("The path {0} does not exist")]
    PathNotFound(String),

    #[error("view_range should be a list of two integers")]
    InvalidRangeShape,

    #[error("view_range {0:?} should be within the range [1, {1}]")]
    InvalidRangeBounds(Vec<i64>, usize),

    #[error("view_range end ({0}) should be smaller than the number of lines ({1})")]
    InvalidRangeEnd(i64, usize),

    #[error("view_range second element ({1}) should be larger or equal than its first ({0})")]
    InvalidRangeOrder(i64, i64),

    #[error("view_range is not allowed for directories")]
    RangeOnDirectory,

    #[error("no replacement was performed, old_str `{0}` did not appear verbatim in {1}")]
    LiteralNotFound(String, String),

    #[error(
        "no replacement was performed. Multiple occurrences of old_str `{old}` in lines {lines}. Please ensure it is unique, or set replace_all to replace every occurrence"
    )]
    AmbiguousMatch { old: String, lines: String },

    #[error("file already exists at {0}")]
    AlreadyExists(String),

    #[error("path escapes base directory: {0}")]
    PathEscape(PathBuf),

    #[error("command failed inside session: {0}")]
    SessionCommandFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
