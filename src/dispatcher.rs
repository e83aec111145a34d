//! Dispatcher Module
//!
//! Executes one validated request against the file store.
//!
//! ## Responsibilities
//! - Route each command to its store operation
//! - Turn store failures into error responses
//! - Drive the extra payload frame for UPLOAD (inbound) and DOWNLOAD (outbound)
//! - Tell the connection loop whether to keep going

use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::{FilePortError, ProtocolError, Result};
use crate::protocol::{read_payload, write_payload, write_response, Request, Response};
use crate::store::FileStore;

/// What the connection loop should do after a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Wait for the next request
    Continue,

    /// Close the connection (QUIT, or the stream is out of sync)
    Close,
}

/// Command dispatcher shared by all connections
///
/// Holds no per-connection state; every call carries its own streams.
pub struct Dispatcher {
    store: Arc<FileStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }

    /// Execute a request, writing its response (and payload) to `writer`
    ///
    /// Store failures become error responses. `Err` means the peer could
    /// not be written to.
    pub fn dispatch<R: Read, W: Write>(
        &self,
        request: Request,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<Flow> {
        tracing::debug!(
            command = request.command_type().as_str(),
            filename = request.filename(),
            "Dispatching request"
        );

        match request {
            Request::List => {
                match write_response(writer, &self.list()) {
                    Err(FilePortError::ControlTooLarge { size, .. }) => {
                        tracing::warn!("Listing of {} bytes is too large to send", size);
                        write_response(writer, &Response::error("File listing too large to send"))?;
                    }
                    result => result?,
                }
                Ok(Flow::Continue)
            }
            Request::Upload { filename } => self.upload(&filename, reader, writer),
            Request::Download { filename } => self.download(&filename, writer),
            Request::Delete { filename } => {
                write_response(writer, &self.delete(&filename))?;
                Ok(Flow::Continue)
            }
            Request::Quit => {
                write_response(writer, &Response::goodbye())?;
                Ok(Flow::Close)
            }
        }
    }

    /// Answer a request that failed validation; the connection stays open
    pub fn reject<W: Write>(&self, error: &ProtocolError, writer: &mut W) -> Result<Flow> {
        tracing::debug!("Rejecting request: {}", error);
        write_response(writer, &Response::error(error.to_string()))?;
        Ok(Flow::Continue)
    }

    /// LIST
    pub fn list(&self) -> Response {
        match self.store.list() {
            Ok(files) => Response::listing(files),
            Err(e) => Response::error(e.to_string()),
        }
    }

    /// DELETE
    pub fn delete(&self, filename: &str) -> Response {
        match self.store.delete(filename) {
            Ok(()) => Response::deleted(filename),
            Err(e) => Response::error(e.to_string()),
        }
    }

    /// Get the underlying store
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    // =========================================================================
    // Payload-carrying commands
    // =========================================================================

    /// UPLOAD: the payload is consumed before the name is checked, so a
    /// rejected name still leaves the stream in sync
    fn upload<R: Read, W: Write>(
        &self,
        filename: &str,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<Flow> {
        let data = match read_payload(reader) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to receive data for {}: {}", filename, e);
                // Stream position is unknown now; answer if we can, then close
                let _ = write_response(writer, &Response::error("Failed to receive file data"));
                return Ok(Flow::Close);
            }
        };

        let response = match self.store.store(filename, &data) {
            Ok(size) => Response::stored(filename, size),
            Err(e) => Response::error(e.to_string()),
        };

        write_response(writer, &response)?;
        Ok(Flow::Continue)
    }

    /// DOWNLOAD: the payload goes out only after a success response
    fn download<W: Write>(&self, filename: &str, writer: &mut W) -> Result<Flow> {
        match self.store.read(filename) {
            Ok(data) => {
                write_response(writer, &Response::ready(data.len() as u64))?;
                write_payload(writer, &data)?;
            }
            Err(e) => write_response(writer, &Response::error(e.to_string()))?,
        }

        Ok(Flow::Continue)
    }
}
