//! Command dispatch loop
//!
//! Per iteration: decode one request, require it to be a proper list
//! headed by a symbol naming a registered command, invoke the handler
//! with the argument list, encode and flush the response. Both value
//! trees live for exactly one iteration.

use std::io::{Read, Write};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rp_protocol::{Decoder, Encoder, Value, WireError};

use crate::reply;

/// What a handler wants done with its response
#[derive(Debug)]
pub enum Outcome {
    /// Send the response and keep serving
    Reply(Value),
    /// Send the response, then terminate the loop normally
    Quit(Value),
}

/// A driver-supplied command handler.
///
/// Receives the backend state it shares with the other handlers and
/// the request's argument list. Application failures are reported as
/// ordinary error response values, never by panicking.
pub type CommandFn<B> = fn(&mut B, &Value) -> Outcome;

/// Small name-to-handler table supplied by the driver
pub struct CommandTable<B> {
    entries: Vec<(&'static str, CommandFn<B>)>,
}

impl<B> CommandTable<B> {
    /// Create an empty table
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register a handler under a command name
    pub fn register(mut self, name: &'static str, handler: CommandFn<B>) -> Self {
        self.entries.push((name, handler));
        self
    }

    /// Look up a handler by command name bytes
    pub fn lookup(&self, name: &[u8]) -> Option<CommandFn<B>> {
        self.entries
            .iter()
            .find(|(entry, _)| entry.as_bytes() == name)
            .map(|(_, handler)| *handler)
    }
}

impl<B> Default for CommandTable<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// How the loop treats malformed requests and unknown commands.
///
/// Fixed per deployment; the two policies must never be mixed within
/// one build of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchPolicy {
    /// A malformed request or unknown command is fatal: no response
    /// is sent and the process exits non-zero
    FailFast,
    /// Such conditions synthesize an `(error args ...)` response and
    /// the loop keeps serving
    ContinueOnError,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        DispatchPolicy::ContinueOnError
    }
}

/// Errors that terminate the dispatch loop
#[derive(Error, Debug)]
pub enum ServeError {
    /// Transport or structural failure; stream position is untrusted
    #[error(transparent)]
    Wire(#[from] WireError),

    /// Request is not a proper list (fatal under fail-fast)
    #[error("command is not a list")]
    NotAList,

    /// Request head is not a symbol (fatal under fail-fast)
    #[error("command name is not a symbol")]
    NotASymbol,

    /// No handler registered under the request's command name
    #[error("no such command: {0}")]
    UnknownCommand(String),
}

/// Serve requests until a handler quits, the source reaches clean end
/// of stream, or a fatal error occurs.
///
/// The loop owns no backend state; `backend` belongs to the handlers
/// and persists across iterations.
pub fn serve<B, R, W>(
    decoder: &mut Decoder<R>,
    encoder: &mut Encoder<W>,
    table: &CommandTable<B>,
    backend: &mut B,
    policy: DispatchPolicy,
) -> Result<(), ServeError>
where
    R: Read,
    W: Write,
{
    loop {
        let request = match decoder.read_value() {
            Ok(request) => request,
            Err(WireError::Eof) => {
                tracing::debug!("clean end of stream, leaving dispatch loop");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        tracing::trace!(request = %request, "dispatching");

        match route(table, backend, &request) {
            Ok(Outcome::Reply(response)) => {
                encoder.write_value(&response)?;
            }
            Ok(Outcome::Quit(response)) => {
                encoder.write_value(&response)?;
                tracing::debug!("handler requested quit");
                return Ok(());
            }
            Err(shape) => match policy {
                DispatchPolicy::FailFast => return Err(shape),
                DispatchPolicy::ContinueOnError => {
                    tracing::warn!(error = %shape, "malformed request");
                    encoder.write_value(&reply::error("args", &shape.to_string()))?;
                }
            },
        }
        // Request and response trees are dropped here, one per iteration
    }
}

/// Validate the request shape and invoke the matching handler
fn route<B>(
    table: &CommandTable<B>,
    backend: &mut B,
    request: &Value,
) -> Result<Outcome, ServeError> {
    if !request.is_proper_list() {
        return Err(ServeError::NotAList);
    }
    let name = match request.head() {
        Some(Value::Symbol(name)) => name,
        _ => return Err(ServeError::NotASymbol),
    };
    let handler = table
        .lookup(name)
        .ok_or_else(|| ServeError::UnknownCommand(String::from_utf8_lossy(name).into_owned()))?;
    let args = request.tail().unwrap_or(&Value::Null);
    Ok(handler(backend, args))
}
