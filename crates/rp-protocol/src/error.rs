//! Wire protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding values.
///
/// Everything here except `Eof` leaves the stream position untrusted,
/// so callers must tear the connection down rather than retry.
#[derive(Error, Debug)]
pub enum WireError {
    /// Clean end of stream at a value boundary.
    ///
    /// Reported only when the stream ends before the first byte of a
    /// top-level value; end of stream anywhere else is an I/O error.
    #[error("end of stream")]
    Eof,

    /// Unrecognized structural tag; there is no skip-unknown mode
    #[error("unknown type tag {0:#x}")]
    UnknownTag(u64),

    /// Variable-length integer does not fit in 64 bits
    #[error("number too big to represent")]
    SizeOverflow,

    /// Length-like field outside the caller-imposed bounds
    #[error("number {value} outside expected range {min}..={max}")]
    SizeOutOfRange { value: u64, min: u64, max: u64 },

    /// Value nesting exceeds the configured maximum depth
    #[error("value nesting deeper than {0} levels")]
    DepthExceeded(usize),

    /// Flushing the sink failed after a complete value was written
    #[error("flush error: {0}")]
    Flush(#[source] std::io::Error),

    /// Transport failure: short read/write or channel error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
