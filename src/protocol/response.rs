//! Response definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};

use crate::error::{FilePortError, Result};
use crate::store::FileMetadata;

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// A response to send to client
///
/// Absent fields are left out of the wire map entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Human-readable outcome (UPLOAD, DELETE, QUIT, errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Byte count (UPLOAD, DOWNLOAD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Directory listing (LIST)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileMetadata>>,
}

impl Response {
    /// LIST succeeded
    pub fn listing(files: Vec<FileMetadata>) -> Self {
        Self {
            status: Status::Success,
            message: None,
            size: None,
            files: Some(files),
        }
    }

    /// UPLOAD succeeded
    pub fn stored(filename: &str, size: u64) -> Self {
        Self {
            status: Status::Success,
            message: Some(format!("File {} stored successfully", filename)),
            size: Some(size),
            files: None,
        }
    }

    /// DOWNLOAD accepted; a raw payload of `size` bytes follows
    pub fn ready(size: u64) -> Self {
        Self {
            status: Status::Success,
            message: None,
            size: Some(size),
            files: None,
        }
    }

    /// DELETE succeeded
    pub fn deleted(filename: &str) -> Self {
        Self {
            status: Status::Success,
            message: Some(format!("File {} deleted successfully", filename)),
            size: None,
            files: None,
        }
    }

    /// QUIT acknowledged
    pub fn goodbye() -> Self {
        Self {
            status: Status::Success,
            message: Some("Goodbye!".to_string()),
            size: None,
            files: None,
        }
    }

    /// Create an ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            size: None,
            files: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Turn an error response into `FilePortError::Remote`
    pub fn into_result(self) -> Result<Self> {
        match self.status {
            Status::Success => Ok(self),
            Status::Error => Err(FilePortError::Remote(
                self.message.unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }
}
