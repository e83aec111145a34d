//! # fileport
//!
//! A minimal network file-transfer system:
//! - A server exposing one storage directory over TCP
//! - Length-prefixed control frames (JSON maps) and raw payload frames
//! - One isolated handling thread per connection
//! - A blocking client session with strict request/response alternation
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one thread per connection)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  control frames / payload frames
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Dispatcher                               │
//! │        LIST · UPLOAD · DOWNLOAD · DELETE · QUIT              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │   FileStore   │
//!               │ (striped lock)│
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod dispatcher;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FilePortError, ProtocolError, Result};
pub use config::Config;
pub use store::{FileMetadata, FileStore};
pub use dispatcher::Dispatcher;
pub use network::Server;
pub use client::Session;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fileport
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
