//! Client error types

use thiserror::Error;

use rp_protocol::WireError;

/// Errors raised while driving a worker process
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport or protocol failure; the channel can no longer be
    /// trusted and must be torn down
    #[error(transparent)]
    Wire(#[from] WireError),

    /// Spawning or reaping the worker process failed
    #[error("worker process error: {0}")]
    Process(#[from] std::io::Error),

    /// The worker's stdio pipes could not be captured
    #[error("worker stdio is not piped")]
    Pipe,

    /// Application error reported by the worker as an `(error ...)`
    /// response; the channel remains usable
    #[error("backend error [{code}]: {message}")]
    Backend { code: String, message: String },

    /// Response does not follow the ok/error convention
    #[error("malformed reply: {0}")]
    BadReply(String),
}
