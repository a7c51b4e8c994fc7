//! Error types for table-service operations.

use rowgrid_types::{InvalidColumn, WireError};

/// Result type alias for table-service operations.
pub type ServiceResult<T, E = ServiceError> = Result<T, E>;

/// Error type for table-service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The remote service rejected or failed the operation (table already
    /// exists, table not disabled, unknown scanner, ...). Carries the
    /// service's message unchanged.
    #[error("remote service error: {message}")]
    Remote {
        /// The service's error message.
        message: String,
    },

    /// A transport fault on the connection.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame or payload failed to decode.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The service answered with a payload of the wrong shape.
    #[error("unexpected response: expected {expected}, got {got}")]
    UnexpectedResponse {
        /// The payload kind the call expected.
        expected: &'static str,
        /// The payload kind the service sent.
        got: &'static str,
    },

    /// A malformed column identifier, caught at the client boundary.
    #[error(transparent)]
    Column(#[from] InvalidColumn),
}

impl ServiceError {
    /// Create a remote-service error from a message.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote { message: message.into() }
    }
}
