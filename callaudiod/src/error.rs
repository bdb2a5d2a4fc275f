//! Error taxonomy for routing operations.
//!
//! Every intent ultimately resolves to a single boolean success at the
//! [`crate::facade`] boundary, but internally each failure is one of these
//! distinguishable kinds so logs stay useful.

use thiserror::Error;

/// Why a routing [`crate::engine::Operation`] failed to complete.
#[derive(Debug, Error)]
pub enum OperationError {
    /// No card currently matches the internal-card filter predicates.
    #[error("no internal card is tracked")]
    NoCard,

    /// No sink currently matches the sink filter predicates.
    #[error("no sink is tracked")]
    NoSink,

    /// No source currently matches the source filter predicates.
    #[error("no source is tracked")]
    NoSource,

    /// A server request completed but was itself rejected by the server.
    #[error("server rejected request: {0}")]
    ServerRequestFailed(#[source] pulseaudio::ClientError),

    /// The connection to the server was lost mid-operation.
    #[error("connection to the audio server was lost")]
    ConnectionLost,

    /// A list/info callback produced an empty payload where data was expected.
    #[error("empty info payload for {0}")]
    EmptyInfoPayload(&'static str),

    /// The operation could not be constructed (process is out of resources).
    #[error("failed to allocate operation")]
    AllocationFailure,
}

/// The result of a routing operation.
pub type Result<T> = std::result::Result<T, OperationError>;

impl From<pulseaudio::ClientError> for OperationError {
    fn from(err: pulseaudio::ClientError) -> Self {
        match err {
            pulseaudio::ClientError::Disconnected => OperationError::ConnectionLost,
            other => OperationError::ServerRequestFailed(other),
        }
    }
}
