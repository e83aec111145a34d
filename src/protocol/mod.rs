//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frames
//!
//! ### Control Frame
//! ```text
//! ┌──────────┬─────────────────────────────────────────┐
//! │ Len (4)  │      UTF-8 JSON map                     │
//! └──────────┴─────────────────────────────────────────┘
//! ```
//!
//! ### Raw Payload Frame
//! ```text
//! ┌──────────┬─────────────────────────────────────────┐
//! │ Len (8)  │      File bytes                         │
//! └──────────┴─────────────────────────────────────────┘
//! ```
//!
//! ### Commands
//! - LIST:     `{"command":"LIST"}`
//! - UPLOAD:   `{"command":"UPLOAD","filename":..}` then a payload frame
//! - DOWNLOAD: `{"command":"DOWNLOAD","filename":..}`, payload follows success
//! - DELETE:   `{"command":"DELETE","filename":..}`
//! - QUIT:     `{"command":"QUIT"}`
//!
//! ### Response Fields
//! - status:  "success" | "error"
//! - message, size, files: present depending on the command

mod request;
mod response;
mod codec;

pub use request::{CommandType, Request, RequestFrame};
pub use response::{Response, Status};
pub use codec::{
    encode_control, decode_control, decode_request,
    read_control, write_control,
    read_request, write_request,
    read_response, write_response,
    read_payload, read_payload_into,
    write_payload, write_payload_from,
    CHUNK_SIZE, CONTROL_HEADER_SIZE, MAX_CONTROL_SIZE, PAYLOAD_HEADER_SIZE,
};
