use crate::domain::model::{Listing, OpenMode, StorageFile};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// File storage contract a web application writes uploads and assets through.
///
/// Names are relative to whatever namespace the implementation applies
/// (bucket, folder prefix); callers never see the namespaced path.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stores `content` under `name`, replacing any existing object, and
    /// returns the name to use for later retrieval.
    async fn save(&self, name: &str, content: &[u8]) -> Result<String>;

    async fn open(&self, name: &str, mode: OpenMode) -> Result<StorageFile>;

    /// Removing a missing object is not an error.
    async fn delete(&self, name: &str) -> Result<()>;

    async fn exists(&self, name: &str) -> Result<bool>;

    /// Directories and files directly under `path`.
    async fn listdir(&self, path: &str) -> Result<Listing>;

    async fn size(&self, name: &str) -> Result<u64>;

    /// Public URL for `name`. Computed locally.
    fn url(&self, name: &str) -> String;

    async fn get_accessed_time(&self, name: &str) -> Result<Option<DateTime<Utc>>>;

    async fn get_created_time(&self, name: &str) -> Result<Option<DateTime<Utc>>>;

    async fn get_modified_time(&self, name: &str) -> Result<Option<DateTime<Utc>>>;

    /// Trims the name, turns spaces into underscores and drops anything that
    /// is not alphanumeric, `-`, `_`, `.` or `/`.
    fn get_valid_name(&self, name: &str) -> String {
        static INVALID: OnceLock<Regex> = OnceLock::new();
        let invalid = INVALID.get_or_init(|| Regex::new(r"[^\w\-./]").expect("valid regex"));

        let spaced = name.trim().replace(' ', "_");
        invalid.replace_all(&spaced, "").into_owned()
    }
}
