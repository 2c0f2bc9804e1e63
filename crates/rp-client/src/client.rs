//! Worker process client
//!
//! Holds both ends of a spawned worker's stdio pipe. Requests and
//! responses alternate strictly: `call` takes `&mut self`, so there is
//! never more than one request in flight.

use std::io::{BufReader, BufWriter};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use rp_protocol::{Decoder, Encoder, Limits, Value};

use crate::error::ClientError;
use crate::reply::Reply;

/// Client for a worker process speaking the binary value protocol
pub struct WorkerClient {
    child: Child,
    encoder: Encoder<BufWriter<ChildStdin>>,
    decoder: Decoder<BufReader<ChildStdout>>,
}

impl WorkerClient {
    /// Spawn a worker from a prepared command.
    ///
    /// Stdin and stdout are claimed for the protocol; stderr is left
    /// alone so the worker's diagnostics reach the supervisor's own
    /// stderr.
    pub fn spawn(mut command: Command) -> Result<Self, ClientError> {
        Self::spawn_with_limits(&mut command, Limits::default())
    }

    /// Spawn a worker with explicit codec limits
    pub fn spawn_with_limits(command: &mut Command, limits: Limits) -> Result<Self, ClientError> {
        command.stdin(Stdio::piped()).stdout(Stdio::piped());
        let mut child = command.spawn()?;
        tracing::debug!(pid = child.id(), "worker spawned");

        let stdin = child.stdin.take().ok_or(ClientError::Pipe)?;
        let stdout = child.stdout.take().ok_or(ClientError::Pipe)?;
        Ok(Self {
            child,
            encoder: Encoder::with_limits(BufWriter::new(stdin), limits),
            decoder: Decoder::with_limits(BufReader::new(stdout), limits),
        })
    }

    /// Send one request and read its response.
    ///
    /// Blocks until the worker answers; a stalled worker blocks the
    /// caller indefinitely.
    pub fn call(&mut self, request: Value) -> Result<Reply, ClientError> {
        tracing::trace!(request = %request, "calling worker");
        self.encoder.write_value(&request)?;
        let response = self.decoder.read_value()?;
        tracing::trace!(response = %response, "worker answered");
        Reply::parse(response)
    }

    /// Connect the worker's backend with symbol/string option pairs
    pub fn connect(&mut self, options: &[(&str, &str)]) -> Result<(), ClientError> {
        let mut request = vec![Value::symbol("connect")];
        for (name, value) in options {
            request.push(Value::symbol(name));
            request.push(Value::string(value));
        }
        self.call(Value::list(request))?;
        Ok(())
    }

    /// Execute one SQL statement; returns the first row, or `None` if
    /// the statement produced no rows
    pub fn execute(&mut self, sql: &str) -> Result<Option<Vec<Value>>, ClientError> {
        let request = Value::list([Value::symbol("execute"), Value::string(sql)]);
        self.call(request)?.into_row()
    }

    /// Read the next row of the executing statement; `None` once the
    /// statement has finished
    pub fn read_row(&mut self) -> Result<Option<Vec<Value>>, ClientError> {
        self.call(Value::list([Value::symbol("read-row")]))?.into_row()
    }

    /// Ask the worker to disconnect and quit, then reap the process.
    ///
    /// Consumes the client; the channel is gone either way afterwards.
    pub fn disconnect(mut self) -> Result<(), ClientError> {
        self.call(Value::list([Value::symbol("disconnect")]))?;
        let WorkerClient {
            mut child,
            encoder,
            decoder,
        } = self;
        // Closing stdin lets a worker that missed the quit still see EOF
        drop(encoder);
        drop(decoder);
        let status = child.wait()?;
        tracing::debug!(%status, "worker exited");
        Ok(())
    }

    /// Abandon the channel and reap the worker without a farewell.
    ///
    /// For supervisors tearing down after a wire error, when no
    /// further request can be trusted to the stream.
    pub fn shutdown(self) -> Result<(), ClientError> {
        let WorkerClient {
            mut child,
            encoder,
            decoder,
        } = self;
        drop(encoder);
        drop(decoder);
        let status = child.wait()?;
        tracing::debug!(%status, "worker exited");
        Ok(())
    }
}
