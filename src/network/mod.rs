//! Network Module
//!
//! TCP server and per-connection handling.
//!
//! ## Architecture
//! - Single acceptor loop
//! - One thread per accepted connection
//! - Requests routed through the shared Dispatcher

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
