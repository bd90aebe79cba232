//! Error types for the device API client

use thiserror::Error;

/// Errors from the JSON endpoints (poll, set-mode, next-image, image-info,
/// registration)
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connect, DNS, TLS or timeout failure before a status was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered 2xx but the payload could not be decoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered with a non-2xx, non-404 status
    #[error("Server error: HTTP {0}")]
    Server(u16),

    /// 404: the device identity is unknown to the server
    #[error("Device not found on server")]
    NotFound,
}

/// Errors from a bitmap transfer
///
/// No variant carries partial frame data; a failed transfer exposes nothing.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connect, DNS, TLS failure or a broken connection mid-body
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx, non-404 status
    #[error("Server error: HTTP {0}")]
    Server(u16),

    /// 404: no content of the requested kind exists on the server
    #[error("No content available on server")]
    NoContentAvailable,

    /// Fewer (or more) bytes than the display frame size were declared or
    /// received before the read deadline
    #[error("Bitmap size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

impl ClientError {
    pub(crate) fn from_ureq(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(404, _) => ClientError::NotFound,
            ureq::Error::Status(code, _) => ClientError::Server(code),
            ureq::Error::Transport(transport) => ClientError::Transport(transport.to_string()),
        }
    }
}

impl FetchError {
    pub(crate) fn from_ureq(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(404, _) => FetchError::NoContentAvailable,
            ureq::Error::Status(code, _) => FetchError::Server(code),
            ureq::Error::Transport(transport) => FetchError::Transport(transport.to_string()),
        }
    }
}

/// Result alias for the JSON endpoints
pub type Result<T> = std::result::Result<T, ClientError>;
