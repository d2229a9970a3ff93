use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::str::FromStr;

use crate::utils::error::StorageError;

/// Metadata the remote service keeps for one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl ObjectInfo {
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.updated_at)
    }

    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }

    /// Falls back to the modification time when access is not tracked.
    pub fn accessed_time(&self) -> Option<DateTime<Utc>> {
        self.last_accessed_at.or_else(|| self.modified_time())
    }
}

/// Names found directly under a listed path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

impl Listing {
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.directories, self.files)
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    Read,
    #[default]
    ReadBinary,
}

impl FromStr for OpenMode {
    type Err = StorageError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "r" | "rt" => Ok(OpenMode::Read),
            "rb" | "br" => Ok(OpenMode::ReadBinary),
            other => Err(StorageError::UnsupportedModeError {
                mode: other.to_string(),
            }),
        }
    }
}

/// A downloaded object. The bytes live in memory and are read through
/// `Read`/`Seek` like a local file.
#[derive(Debug, Clone)]
pub struct StorageFile {
    name: String,
    mode: OpenMode,
    content: Cursor<Vec<u8>>,
}

impl StorageFile {
    pub fn new(name: impl Into<String>, mode: OpenMode, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mode,
            content: Cursor::new(content),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.content.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.content.get_ref()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content.into_inner()
    }
}

impl Read for StorageFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.content.read(buf)
    }
}

impl Seek for StorageFile {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.content.seek(pos)
    }
}
