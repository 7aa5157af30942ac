//! Boundary to the remote API: the error taxonomy call bodies report and the
//! trait a per-chunk call implements. HTTP details live with the implementor.

use async_trait::async_trait;

use crate::retry::{classify_http_status, ErrorKind};

/// Failure of one remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The session credential was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Connection refused, reset, or timed out.
    #[error("connection failed: {0}")]
    Connection(String),
    /// Host name could not be resolved.
    #[error("name resolution failed: {0}")]
    Resolve(String),
    /// Non-success HTTP status.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },
    /// The request or response made no sense.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl RemoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoteError::Unauthorized(_) => ErrorKind::Unauthorized,
            RemoteError::Connection(_) | RemoteError::Resolve(_) => ErrorKind::Connection,
            RemoteError::Status { code, .. } => classify_http_status(*code),
            RemoteError::Invalid(_) => ErrorKind::Other,
        }
    }
}

/// One remote call covering a chunk of ids.
#[async_trait]
pub trait ChunkCall<I, T>: Send + Sync {
    async fn call(&self, credential: &str, ids: &[I]) -> Result<T, RemoteError>;
}
