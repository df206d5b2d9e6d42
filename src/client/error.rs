// Client errors

use thiserror::Error;

/// Error ending a client session
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// The target address could not be parsed
    #[error("invalid address: {0}")]
    Address(String),

    /// Dial, read or write failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The handshake did not complete
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The server answered connect with a code other than success
    #[error("connect rejected by the server: {code}")]
    ConnectRejected { code: String },

    /// The server answered publish with a code other than start
    #[error("publish rejected by the server: {code}")]
    PublishRejected { code: String },
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}
