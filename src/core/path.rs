use crate::utils::error::{Result, StorageError};

/// Location of one object inside a bucket: the adapter's folder prefix plus
/// the caller's relative name, both normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    folder: String,
    name: String,
}

impl ObjectPath {
    pub fn new(folder: &str, name: &str) -> Result<Self> {
        let cleaned = normalize(name)?;
        if cleaned.is_empty() {
            return Err(StorageError::InvalidNameError {
                name: name.to_string(),
                reason: "File name cannot be empty".to_string(),
            });
        }
        Ok(Self {
            folder: normalize(folder)?,
            name: cleaned,
        })
    }

    /// Like `new`, but an empty name addresses the folder itself.
    pub fn directory(folder: &str, path: &str) -> Result<Self> {
        Ok(Self {
            folder: normalize(folder)?,
            name: normalize(path)?,
        })
    }

    /// Name relative to the folder prefix, as handed back to callers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full object key inside the bucket.
    pub fn key(&self) -> String {
        match (self.folder.is_empty(), self.name.is_empty()) {
            (true, _) => self.name.clone(),
            (false, true) => self.folder.clone(),
            (false, false) => format!("{}/{}", self.folder, self.name),
        }
    }
}

/// Collapses separators, drops `.` segments and rejects `..`.
pub fn normalize(raw: &str) -> Result<String> {
    let unified = raw.trim().replace('\\', "/");
    let mut segments = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(StorageError::InvalidNameError {
                    name: raw.to_string(),
                    reason: "Path traversal segments are not allowed".to_string(),
                })
            }
            s => segments.push(s),
        }
    }

    Ok(segments.join("/"))
}
