//! Per-filename locking
//!
//! A fixed set of reader/writer locks, picked by filename hash. Two names
//! may share a stripe; that only costs some contention.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Number of lock stripes
const STRIPES: usize = 64;

pub(crate) struct FileLocks {
    stripes: Box<[RwLock<()>]>,
}

impl FileLocks {
    pub(crate) fn new() -> Self {
        Self {
            stripes: (0..STRIPES).map(|_| RwLock::new(())).collect(),
        }
    }

    /// Shared access for reads and stats
    pub(crate) fn read(&self, name: &str) -> RwLockReadGuard<'_, ()> {
        self.stripe(name).read()
    }

    /// Exclusive access for writes and deletes
    pub(crate) fn write(&self, name: &str) -> RwLockWriteGuard<'_, ()> {
        self.stripe(name).write()
    }

    fn stripe(&self, name: &str) -> &RwLock<()> {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        &self.stripes[(hasher.finish() as usize) % self.stripes.len()]
    }
}
