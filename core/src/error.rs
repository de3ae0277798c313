//! Error types for the todo API client.
//!
//! # Design
//! Every failure the client can report is one `ApiError`. Non-2xx responses
//! are normalized into `Http` with the backend's `detail` message (or a
//! generic fallback), so callers only ever present `to_string()`. Login gets
//! its own `Authentication` variant because the sign-in form reports it
//! differently from a failed todo call. `Validation` errors are produced
//! before a request is built and never reach the network.

use thiserror::Error;

/// Message used when a failed response carries no readable `detail`.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Message used when a failed login carries no readable `detail`.
pub const CREDENTIALS_ERROR: &str = "Credentials error";

/// Errors returned by the client, the transport and the controller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not complete (connection refused, DNS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },

    /// The login endpoint rejected the credentials.
    #[error("{0}")]
    Authentication(String),

    /// A client-side precondition failed; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The durable credential entry could not be read or written.
    #[error("credential storage failed: {0}")]
    Storage(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
