use std::fmt;
use thiserror::Error;
use yellowstone_grpc_client::{GeyserGrpcBuilderError, GeyserGrpcClientError};

/// Failures of the credential lookup. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("access token is not set (checked ${var} and the config file)")]
    MissingToken { var: String },

    #[error("endpoint is not set (checked ${var} and the config file)")]
    MissingEndpoint { var: String },
}

/// Errors raised by a `Transport` or the `StreamHandle` it returns.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("access token cannot be sent as request metadata")]
    InvalidToken,

    #[error("connection setup failed: {0}")]
    Connect(#[from] GeyserGrpcBuilderError),

    #[error("gRPC client error: {0}")]
    Client(#[from] GeyserGrpcClientError),

    #[error("gRPC status error: {0}")]
    Status(#[from] tonic::Status),

    #[error("request stream is closed")]
    RequestChannelClosed,

    #[error("no subscription has been written on this stream")]
    NotSubscribed,

    #[error("stream ended by the server")]
    EndOfStream,
}

/// The controller's error taxonomy.
///
/// Only `MissingCredential` and `RetryExhausted` ever leave
/// [`StreamController::run`](crate::controller::StreamController::run); the
/// other variants are absorbed and drive a reconnect.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("missing credential: {0}")]
    MissingCredential(#[from] CredentialError),

    #[error("connect failed: {0}")]
    Connect(#[source] TransportError),

    #[error("subscribe request could not be written: {0}")]
    SubscribeWrite(#[source] TransportError),

    #[error("stream failed: {0}")]
    Stream(#[source] TransportError),

    #[error("giving up after {retries} retries, last error: {last_error}")]
    RetryExhausted { retries: u32, last_error: String },
}

impl ConnectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::MissingCredential(_) => ErrorKind::MissingCredential,
            ConnectorError::Connect(_) => ErrorKind::Connect,
            ConnectorError::SubscribeWrite(_) => ErrorKind::SubscribeWrite,
            ConnectorError::Stream(_) => ErrorKind::Stream,
            ConnectorError::RetryExhausted { .. } => ErrorKind::RetryExhausted,
        }
    }

    /// Whether the controller reconnects after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConnectorError::Connect(_) | ConnectorError::SubscribeWrite(_) | ConnectorError::Stream(_)
        )
    }
}

/// A malformed identifier inside an otherwise valid event.
///
/// Stays local to the event it was found in: it is logged and the stream
/// carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeAnomaly {
    #[error("{field} has {actual} bytes, expected {expected}")]
    UnexpectedLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Stable short names for errors, used in telemetry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingCredential,
    Connect,
    SubscribeWrite,
    Stream,
    DecodeAnomaly,
    RetryExhausted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::MissingCredential => "missing-credential",
            ErrorKind::Connect => "connect",
            ErrorKind::SubscribeWrite => "subscribe-write",
            ErrorKind::Stream => "stream",
            ErrorKind::DecodeAnomaly => "decode-anomaly",
            ErrorKind::RetryExhausted => "retry-exhausted",
        };
        f.write_str(s)
    }
}
