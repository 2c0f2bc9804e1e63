//! Stdio transport binding
//!
//! A worker process reads requests from stdin and writes responses to
//! stdout. The format is binary, so neither end may be an interactive
//! terminal; binding fails outright if one is.

use std::io::{self, BufWriter, IsTerminal};

use thiserror::Error;

use crate::codec::{Decoder, Encoder, Limits};

/// Decoder over the process's locked stdin
pub type StdinDecoder = Decoder<io::StdinLock<'static>>;

/// Encoder over the process's locked, buffered stdout
pub type StdoutEncoder = Encoder<BufWriter<io::StdoutLock<'static>>>;

/// Errors binding the codec to the stdio pipe
#[derive(Error, Debug)]
pub enum PipeError {
    /// Stdin is a terminal; binary data cannot be typed interactively
    #[error("standard input is a terminal")]
    StdinIsTerminal,

    /// Stdout is a terminal; binary data is unsafe to display
    #[error("standard output is a terminal")]
    StdoutIsTerminal,
}

/// Bind a decoder and encoder to the process's stdio pipe.
///
/// Locks both streams for the life of the process; the dispatch loop
/// is the only reader and writer.
pub fn stdio_pipe(limits: Limits) -> Result<(StdinDecoder, StdoutEncoder), PipeError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    if stdin.is_terminal() {
        return Err(PipeError::StdinIsTerminal);
    }
    if stdout.is_terminal() {
        return Err(PipeError::StdoutIsTerminal);
    }
    let decoder = Decoder::with_limits(stdin.lock(), limits);
    let encoder = Encoder::with_limits(BufWriter::new(stdout.lock()), limits);
    Ok((decoder, encoder))
}
