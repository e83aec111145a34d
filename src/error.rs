//! Error types for fileport
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using FilePortError
pub type Result<T> = std::result::Result<T, FilePortError>;

/// Unified error type for fileport operations
#[derive(Debug, Error)]
pub enum FilePortError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Framing Errors (connection is unusable afterwards)
    // -------------------------------------------------------------------------
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Peer disconnected")]
    PeerDisconnected,

    /// Refused before writing; the stream is untouched
    #[error("Control message too large: {size} bytes (max {max})")]
    ControlTooLarge { size: usize, max: u32 },

    // -------------------------------------------------------------------------
    // Protocol Errors (answered, connection stays open)
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("File {0} not found")]
    NotFound(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Storage error: {0}")]
    Store(String),

    // -------------------------------------------------------------------------
    // Client Errors
    // -------------------------------------------------------------------------
    /// An earlier transfer failed midway; the session must be reconnected
    #[error("Session to {0} is out of sync; reconnect")]
    SessionBroken(String),

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server answered with `status: error`
    #[error("{0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A well-formed request that names no valid command
///
/// The display strings are the exact messages sent back to the peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Filename not provided")]
    MissingFilename,
}

impl FilePortError {
    /// True when the stream was closed by the peer (cleanly or abruptly)
    pub fn is_disconnect(&self) -> bool {
        match self {
            FilePortError::PeerDisconnected => true,
            FilePortError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// True when a read or write timed out
    pub fn is_timeout(&self) -> bool {
        // Windows reports TimedOut where Unix reports WouldBlock
        matches!(
            self,
            FilePortError::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            )
        )
    }
}

impl From<serde_json::Error> for FilePortError {
    fn from(e: serde_json::Error) -> Self {
        FilePortError::MalformedMessage(e.to_string())
    }
}
