//! Error types for protocol operations

use crate::secret::Secret;
use std::io;
use thiserror::Error;

/// Result type for protocol operations
pub type RedisResult<T> = Result<T, RedisError>;

/// Error type covering connection, authentication and protocol failures
///
/// No operation retries internally; every failure is raised to the caller at
/// the point it was detected.
#[derive(Error, Debug)]
pub enum RedisError {
    /// Transport could not establish the connection
    #[error("Connect failed: {0}")]
    Connect(String),

    /// Server rejected the AUTH request
    ///
    /// The connection has been closed by the time this error is raised.
    #[error("Authentication failed: {response}")]
    Authentication {
        /// Raw rejection line as sent by the server
        response: String,
        /// Credential that was presented; never rendered
        credential: Secret,
    },

    /// Server error reply, or a byte stream that violates RESP framing
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid connection string or configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Operation on a connection in the terminal closed state
    #[error("Connection closed")]
    ConnectionClosed,

    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_error_hides_credential() {
        let error = RedisError::Authentication {
            response: "-ERR invalid password".to_string(),
            credential: Secret::from("hunter2"),
        };

        assert_eq!(
            error.to_string(),
            "Authentication failed: -ERR invalid password"
        );
        assert!(!format!("{error:?}").contains("hunter2"));
    }

    #[test]
    fn test_io_error_conversion() {
        let cause = io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe");
        let error = RedisError::from(cause);
        assert!(matches!(error, RedisError::Io(_)));
    }

    #[test]
    fn test_protocol_error_carries_server_text() {
        let error = RedisError::Protocol("ERR unknown command".to_string());
        assert_eq!(error.to_string(), "Protocol error: ERR unknown command");
    }
}
