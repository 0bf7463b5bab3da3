//! Error definitions for the RPC layer

use serde_json::Value;
use std::io;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

use super::INTERNAL_ERROR;
use crate::gamepad::GamepadError;

/// Recoverable failure of a single request, reported back to the peer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("method not found: {0}")]
    UnknownMethod(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error(transparent)]
    Gamepad(#[from] GamepadError),
}

impl DispatchError {
    /// Every dispatch fault shares one code; the message tells them apart
    pub fn code(&self) -> i64 {
        INTERNAL_ERROR
    }
}

/// Fatal to the connection the server is currently serving
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("read failed: {0}")]
    Read(#[source] LinesCodecError),

    #[error("req unmarshal failed: {source}")]
    MalformedRequest {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("resp marshal failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("write failed: {0}")]
    Write(#[source] LinesCodecError),
}

/// Failure of one client call. Nothing is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("No response to {0} before the read timeout")]
    Timeout(&'static str),

    #[error("Connection closed while waiting for a response to {0}")]
    Closed(&'static str),

    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Undecodable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Response id {actual} does not match request id {expected}")]
    IdMismatch { expected: i64, actual: i64 },

    #[error("Unexpected result for {method}: {value}")]
    UnexpectedResult { method: &'static str, value: Value },
}
