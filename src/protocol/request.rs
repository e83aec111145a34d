//! Request definitions
//!
//! Represents commands from clients.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Command names as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    List,
    Upload,
    Download,
    Delete,
    Quit,
}

impl CommandType {
    /// Wire name of the command
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::List => "LIST",
            CommandType::Upload => "UPLOAD",
            CommandType::Download => "DOWNLOAD",
            CommandType::Delete => "DELETE",
            CommandType::Quit => "QUIT",
        }
    }

    /// Parse a wire name (exact, case-sensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "LIST" => Some(CommandType::List),
            "UPLOAD" => Some(CommandType::Upload),
            "DOWNLOAD" => Some(CommandType::Download),
            "DELETE" => Some(CommandType::Delete),
            "QUIT" => Some(CommandType::Quit),
            _ => None,
        }
    }
}

/// Request map exactly as carried in a control frame
///
/// Any other key makes the frame malformed. An absent `command` reads as
/// empty and is rejected as an unknown command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestFrame {
    #[serde(default)]
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// A validated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Enumerate stored files
    List,

    /// Store the raw payload that follows under `filename`
    Upload { filename: String },

    /// Fetch a file; the payload follows a success response
    Download { filename: String },

    /// Remove a file
    Delete { filename: String },

    /// End the session
    Quit,
}

impl Request {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Request::List => CommandType::List,
            Request::Upload { .. } => CommandType::Upload,
            Request::Download { .. } => CommandType::Download,
            Request::Delete { .. } => CommandType::Delete,
            Request::Quit => CommandType::Quit,
        }
    }

    /// The filename carried by the request, if its command takes one
    pub fn filename(&self) -> Option<&str> {
        match self {
            Request::Upload { filename }
            | Request::Download { filename }
            | Request::Delete { filename } => Some(filename),
            Request::List | Request::Quit => None,
        }
    }
}

impl TryFrom<RequestFrame> for Request {
    type Error = ProtocolError;

    fn try_from(frame: RequestFrame) -> Result<Self, Self::Error> {
        let command = CommandType::parse(&frame.command)
            .ok_or_else(|| ProtocolError::UnknownCommand(frame.command.clone()))?;

        // Empty and absent filenames are the same error
        let filename = frame.filename.filter(|name| !name.is_empty());
        let require = || filename.clone().ok_or(ProtocolError::MissingFilename);

        Ok(match command {
            CommandType::List => Request::List,
            CommandType::Quit => Request::Quit,
            CommandType::Upload => Request::Upload { filename: require()? },
            CommandType::Download => Request::Download { filename: require()? },
            CommandType::Delete => Request::Delete { filename: require()? },
        })
    }
}

impl From<&Request> for RequestFrame {
    fn from(request: &Request) -> Self {
        Self {
            command: request.command_type().as_str().to_string(),
            filename: request.filename().map(str::to_string),
        }
    }
}
