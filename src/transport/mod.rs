//! Line-delimited JSON-RPC transports: standard input/output, and a Unix
//! domain socket. Both share [`crate::rpc::dispatch`] as their only logic;
//! what differs is how lines are read and where responses are written.

pub mod socket;
pub mod stdio;
