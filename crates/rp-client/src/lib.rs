//! rp-client: the supervising side of a rowpipe channel
//!
//! Spawns a worker process with piped stdio and exchanges one
//! request/response pair at a time over the binary value protocol.
//! Application errors reported by the worker come back as typed
//! `ClientError::Backend` values; transport and protocol failures
//! poison the channel.

mod client;
mod error;
mod reply;

pub use client::WorkerClient;
pub use error::ClientError;
pub use reply::Reply;
