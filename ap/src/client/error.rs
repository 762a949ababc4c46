//! Client error types

use thiserror::Error;

/// Envelope `code` the server uses when a session id is unknown
pub const SESSION_NOT_FOUND_CODE: &str = "session_not_found";

/// Errors from a single request to the agent service
///
/// Every variant is terminal for the request that produced it; nothing in
/// this crate retries automatically.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Agent service unreachable: {0}")]
    TransportUnreachable(String),

    #[error("HTTP error {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("{message}")]
    ServerRejected { message: String, code: Option<String> },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Check if the server reported the addressed resource as unknown
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::HttpStatus { status, .. } => *status == 404,
            ClientError::ServerRejected { code, .. } => code.as_deref() == Some(SESSION_NOT_FOUND_CODE),
            _ => false,
        }
    }

    /// Check if the request never got a usable answer from the server
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::TransportUnreachable(_) | ClientError::HttpStatus { .. } | ClientError::MalformedResponse(_)
        )
    }
}
