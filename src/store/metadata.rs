//! File metadata
//!
//! Per-file information reported by LIST.

use std::fs;

use chrono::{DateTime, Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata for one stored file, read from disk at request time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileMetadata {
    /// Filename within the store
    pub name: String,

    /// Size in bytes
    pub size: u64,

    /// Last modification, server local time, whole seconds
    #[serde(with = "timestamp")]
    pub modified: NaiveDateTime,

    /// Always true for entries produced by the store
    pub exists: bool,
}

impl FileMetadata {
    /// Build from filesystem metadata
    pub fn from_fs(name: impl Into<String>, meta: &fs::Metadata) -> Result<Self> {
        let modified = DateTime::<Local>::from(meta.modified()?)
            .naive_local()
            .trunc_subsecs(0);

        Ok(Self {
            name: name.into(),
            size: meta.len(),
            modified,
            exists: true,
        })
    }
}

/// `YYYY-MM-DD HH:MM:SS` on the wire
mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, FORMAT).map_err(serde::de::Error::custom)
    }
}
