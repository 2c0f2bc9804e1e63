//! rp-worker: the worker side of a rowpipe channel
//!
//! A worker reads one command at a time from its stdio pipe, resolves
//! it against a driver-supplied command table, invokes the handler
//! against backend state it threads through the loop, and writes the
//! response back. Strictly synchronous: one request is fully decoded,
//! dispatched, and answered before the next is read.

pub mod config;
pub mod dispatch;
pub mod memdb;
pub mod reply;

pub use config::{load_config, ConfigError, WorkerConfig};
pub use dispatch::{serve, CommandFn, CommandTable, DispatchPolicy, Outcome, ServeError};
