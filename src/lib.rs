//! `shellmcp` — an MCP server exposing persistent interactive shell sessions,
//! ad-hoc shell execution, and a string-replace file editor over JSON-RPC 2.0.
//!
//! The central contribution is the session manager (`session` module): a
//! live shell process per session, addressed by an opaque id, whose output
//! is framed with per-exec sentinel markers so successive commands share
//! process state (cwd, env vars, background jobs) while still returning a
//! clean request/response pair to the caller.

pub mod config;
pub mod editor;
pub mod envelope;
pub mod error;
pub mod process;
pub mod registry;
pub mod rpc;
pub mod session;
pub mod tools;
pub mod transport;
