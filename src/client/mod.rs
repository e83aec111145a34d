//! Client Module
//!
//! Blocking client for the fileport protocol.

mod session;

pub use session::Session;
