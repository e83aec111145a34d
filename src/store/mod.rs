//! Storage Module
//!
//! Persistent storage of uploaded files.
//!
//! ## Layout
//! ```text
//! {storage_dir}/
//!   ├── report.pdf
//!   ├── a.txt
//!   └── ...        (one file per name, no subdirectories)
//! ```
//!
//! Filenames come straight from clients, so every operation checks that the
//! name is a single plain path component before touching the filesystem.

mod file_store;
mod locks;
mod metadata;

pub use file_store::{validate_filename, FileStore};
pub use metadata::FileMetadata;
