//! Operator client for the cache cluster.
//!
//! Connects to one node's RPC port and issues a single `get`, `set`, or
//! `delete`, printing the result. No retry, no cluster discovery: if the
//! addressed node returns `Unavailable`, the operator reconnects to a
//! different one by hand (`spec.md` §7: "retriable... against a different
//! node").

pub mod command;

pub use command::{Cli, Command};
