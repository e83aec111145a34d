//! Client Session
//!
//! One open connection with strict request/response alternation.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;

use crate::error::{FilePortError, Result};
use crate::protocol::{
    read_payload, read_payload_into, read_response, write_payload, write_payload_from,
    write_request, Request, Response,
};
use crate::store::FileMetadata;

/// A connected client
///
/// Every method takes `&mut self`, so only one request is ever in flight.
/// A failure partway through an exchange leaves the stream position unknown;
/// from then on every call fails with `SessionBroken`.
pub struct Session {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    peer_addr: String,
    broken: bool,
}

impl Session {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs + ToString>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(&addr).map_err(|source| FilePortError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        stream.set_nodelay(true)?;

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| addr.to_string());
        tracing::debug!("Connected to {}", peer_addr);

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr,
            broken: false,
        })
    }

    /// LIST
    pub fn list(&mut self) -> Result<Vec<FileMetadata>> {
        let response = self.call(&Request::List)?;
        response.files.ok_or_else(|| {
            FilePortError::MalformedMessage("LIST response without files".to_string())
        })
    }

    /// UPLOAD a local file under its final path component
    ///
    /// Returns the size the server stored.
    pub fn upload(&mut self, path: &Path) -> Result<u64> {
        self.ensure_usable()?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| FilePortError::InvalidFilename(path.display().to_string()))?
            .to_string();

        // Open before sending anything so a bad path costs no round trip
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        tracing::debug!("Uploading {} ({} bytes)", filename, len);
        let sent = write_request(&mut self.writer, &Request::Upload { filename })
            .and_then(|_| write_payload_from(&mut self.writer, &mut file, len));
        self.track(sent)?;

        let stored = self.stored_size();
        self.track(stored)
    }

    /// UPLOAD in-memory bytes as `filename`
    pub fn upload_bytes(&mut self, filename: &str, data: &[u8]) -> Result<u64> {
        self.ensure_usable()?;
        let request = Request::Upload {
            filename: filename.to_string(),
        };
        let sent = write_request(&mut self.writer, &request)
            .and_then(|_| write_payload(&mut self.writer, data));
        self.track(sent)?;

        let stored = self.stored_size();
        self.track(stored)
    }

    /// DOWNLOAD `filename` to `save_path` (default: `filename` in the
    /// current directory). Returns the number of bytes written.
    ///
    /// A partially written file is removed on failure.
    pub fn download(&mut self, filename: &str, save_path: Option<&Path>) -> Result<u64> {
        let target = save_path.unwrap_or_else(|| Path::new(filename));

        self.ensure_usable()?;
        let ready = self.request_download(filename);
        self.track(ready)?;

        let file = match File::create(target) {
            Ok(file) => file,
            Err(e) => {
                // The payload is already on its way; drain it to stay in sync
                let drained = read_payload_into(&mut self.reader, &mut io::sink());
                self.track(drained)?;
                return Err(e.into());
            }
        };

        let mut sink = BufWriter::new(file);
        let received = read_payload_into(&mut self.reader, &mut sink);
        let result = self
            .track(received)
            .and_then(|written| sink.flush().map(|_| written).map_err(FilePortError::from));

        if result.is_err() {
            drop(sink);
            let _ = fs::remove_file(target);
        }
        result
    }

    /// DOWNLOAD `filename` into memory
    pub fn download_bytes(&mut self, filename: &str) -> Result<Vec<u8>> {
        self.ensure_usable()?;
        let ready = self.request_download(filename);
        self.track(ready)?;

        let data = read_payload(&mut self.reader);
        self.track(data)
    }

    /// DELETE; returns the server's message
    pub fn delete(&mut self, filename: &str) -> Result<String> {
        let response = self.call(&Request::Delete {
            filename: filename.to_string(),
        })?;
        Ok(response.message.unwrap_or_default())
    }

    /// Send QUIT and close
    ///
    /// Best effort: a server that already hung up is not an error. A broken
    /// session just closes.
    pub fn disconnect(mut self) {
        if self.broken {
            tracing::debug!("Dropping out-of-sync session to {}", self.peer_addr);
            return;
        }
        match self.call(&Request::Quit) {
            Ok(_) => tracing::debug!("Disconnected from {}", self.peer_addr),
            Err(e) => tracing::debug!("QUIT to {} not acknowledged: {}", self.peer_addr, e),
        }
    }

    /// Send one request and read its response without interpreting it
    pub fn request(&mut self, request: &Request) -> Result<Response> {
        self.ensure_usable()?;
        let response = write_request(&mut self.writer, request)
            .and_then(|_| read_response(&mut self.reader));
        self.track(response)
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// True once a failed exchange has left the stream out of sync
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_usable(&self) -> Result<()> {
        if self.broken {
            return Err(FilePortError::SessionBroken(self.peer_addr.clone()));
        }
        Ok(())
    }

    /// Mark the session broken if `result` failed on the wire
    ///
    /// A `Remote` error is a complete exchange and leaves the stream in sync.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !self.broken && !matches!(e, FilePortError::Remote(_)) {
                tracing::warn!("Session to {} is out of sync: {}", self.peer_addr, e);
                self.broken = true;
            }
        }
        result
    }

    /// Round trip that turns an error response into `Remote`
    fn call(&mut self, request: &Request) -> Result<Response> {
        self.request(request)?.into_result()
    }

    /// Read the UPLOAD acknowledgement
    fn stored_size(&mut self) -> Result<u64> {
        let response = read_response(&mut self.reader)?.into_result()?;
        response.size.ok_or_else(|| {
            FilePortError::MalformedMessage("UPLOAD response without size".to_string())
        })
    }

    /// Send DOWNLOAD and wait for the go-ahead; a payload follows only on success
    fn request_download(&mut self, filename: &str) -> Result<u64> {
        let response = self.call(&Request::Download {
            filename: filename.to_string(),
        })?;
        let size = response.size.ok_or_else(|| {
            FilePortError::MalformedMessage("DOWNLOAD response without size".to_string())
        })?;

        tracing::debug!("Receiving {} ({} bytes)", filename, size);
        Ok(size)
    }
}
