//! File Store
//!
//! Maps filenames to files directly under one storage directory.
//!
//! ## Responsibilities
//! - Enumerate stored files with fresh metadata
//! - Create/overwrite, read and delete files by name
//! - Reject names that would leave the storage directory

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{FilePortError, Result};

use super::locks::FileLocks;
use super::FileMetadata;

/// Flat file storage rooted at one directory
///
/// ## Concurrency:
/// - All methods use `&self`; share it behind an `Arc`
/// - `store`/`delete` hold the name's stripe exclusively,
///   `read`/`stat` hold it shared, so readers never see a half-written file
/// - `list` takes no locks; each entry is a snapshot at stat time
pub struct FileStore {
    /// Directory where files are stored
    root: PathBuf,

    /// Striped per-filename locks
    locks: FileLocks,
}

impl FileStore {
    /// Open an existing storage directory
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(FilePortError::Config(format!(
                "Storage directory {} does not exist",
                root.display()
            )));
        }

        Ok(Self {
            root: root.to_path_buf(),
            locks: FileLocks::new(),
        })
    }

    /// Create the storage directory if needed, then open it
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Self::open(root)
    }

    /// List all regular files, sorted by name
    pub fn list(&self) -> Result<Vec<FileMetadata>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::debug!("Skipping non UTF-8 filename {:?}", raw);
                    continue;
                }
            };

            // Follows symlinks; vanished entries are skipped
            let meta = match fs::metadata(entry.path()) {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            if meta.is_file() {
                files.push(FileMetadata::from_fs(name, &meta)?);
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Create or overwrite `name` with exactly `data`
    ///
    /// Returns the number of bytes written.
    pub fn store(&self, name: &str, data: &[u8]) -> Result<u64> {
        let path = self.path_for(name)?;
        let _guard = self.locks.write(name);

        fs::write(&path, data)?;

        tracing::debug!("Stored {} ({} bytes)", name, data.len());
        Ok(data.len() as u64)
    }

    /// Read the full contents of `name`
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        let _guard = self.locks.read(name);

        if !Self::is_regular_file(&path)? {
            return Err(FilePortError::NotFound(name.to_string()));
        }

        fs::read(&path).map_err(|e| Self::not_found_or(name, e))
    }

    /// Remove `name`
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        let _guard = self.locks.write(name);

        if !Self::is_regular_file(&path)? {
            return Err(FilePortError::NotFound(name.to_string()));
        }

        fs::remove_file(&path).map_err(|e| Self::not_found_or(name, e))?;

        tracing::debug!("Deleted {}", name);
        Ok(())
    }

    /// Metadata for `name`, or `None` if it is not stored
    pub fn stat(&self, name: &str) -> Result<Option<FileMetadata>> {
        let path = self.path_for(name)?;
        let _guard = self.locks.read(name);

        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(FileMetadata::from_fs(name, &meta)?)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the storage directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Resolve a validated name inside the root
    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_filename(name)?;
        Ok(self.root.join(name))
    }

    fn is_regular_file(path: &Path) -> Result<bool> {
        match fs::metadata(path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn not_found_or(name: &str, e: io::Error) -> FilePortError {
        if e.kind() == io::ErrorKind::NotFound {
            FilePortError::NotFound(name.to_string())
        } else {
            e.into()
        }
    }
}

/// Check that `name` is a single plain path component
///
/// Rejects empty names, `.`, `..`, separators and NUL.
pub fn validate_filename(name: &str) -> Result<()> {
    let invalid = || FilePortError::InvalidFilename(name.to_string());

    if name.is_empty() || name.contains(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(invalid());
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}
