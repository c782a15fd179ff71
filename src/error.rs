use reqwest::StatusCode;

use crate::{ContextError, FetchResponse};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be built or a request option could not be applied.
    ///
    /// Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The caller's context or the per-attempt timeout ended the attempt.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// Non-success HTTP status after every attempt was used.
    ///
    /// The message is the status line, e.g. `500 Internal Server Error`.
    /// The last response is kept so callers can inspect its body.
    #[error("{status}")]
    Status {
        status: StatusCode,
        response: Box<FetchResponse>,
    },
    /// Value could not be serialized as JSON.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
    /// Response body could not be read or parsed as JSON.
    #[error("decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Returns the HTTP status for [`FetchError::Status`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Takes the last response out of a [`FetchError::Status`].
    pub fn into_response(self) -> Option<FetchResponse> {
        match self {
            Self::Status { response, .. } => Some(*response),
            _ => None,
        }
    }

    /// Returns true if the error came from cancellation or a deadline.
    pub fn is_context(&self) -> bool {
        matches!(self, Self::Context(_))
    }
}
