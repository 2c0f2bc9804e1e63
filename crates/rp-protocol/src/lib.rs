//! rp-protocol: Wire protocol for rowpipe database workers
//!
//! This crate defines the tagged value trees exchanged between a
//! supervising process and a database worker, and the binary codec
//! that carries them over a byte-stream pipe.

pub mod codec;
pub mod error;
pub mod pipe;
pub mod value;

pub use codec::{Decoder, Encoder, Limits};
pub use error::WireError;
pub use pipe::{stdio_pipe, PipeError, StdinDecoder, StdoutEncoder};
pub use value::Value;
