//! Crate-level error type

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the client and binlog halves of the crate
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the underlying transport or file
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unexpected wire data
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Authentication was rejected or could not be completed
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// ERR packet from the server
    #[error("server error [{code}] ({sql_state}): {message}")]
    Server {
        /// MySQL error code
        code: u16,
        /// Five-character SQLSTATE
        sql_state: String,
        /// Human-readable message
        message: String,
    },

    /// Invalid configuration or connection string
    #[error("configuration error: {0}")]
    Config(String),

    /// Peer closed the connection mid-exchange
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Connection state machine violation
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// What the current state allows
        expected: String,
        /// The transition that was attempted
        actual: String,
    },

    /// Malformed binary log contents
    #[error("binlog error: {0}")]
    Binlog(String),

    /// Feature the peer requires but this crate does not implement
    #[error("unsupported: {0}")]
    Unsupported(String),
}
