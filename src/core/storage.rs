use crate::config::{StorageConfig, SupabaseSettings};
use crate::core::client::StorageClient;
use crate::core::path::{self, ObjectPath};
use crate::domain::model::{Listing, ObjectInfo, OpenMode, StorageFile};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, StorageError};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Supabase keeps this file in folders created from the dashboard.
const FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

/// Storage backend that keeps every object in a Supabase bucket.
///
/// Object keys are `folder/name`; callers only ever see `name`. No bytes are
/// kept locally between calls.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: StorageClient,
}

impl SupabaseStorage {
    /// Fails with a configuration error when the endpoint or key is missing,
    /// so an adapter that exists can always reach the service.
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate().inspect_err(|e| {
            tracing::error!("Supabase storage is not configured: {}", e);
        })?;

        tracing::info!(
            "✅ Supabase storage ready (bucket: {}, folder: {:?})",
            config.bucket,
            config.folder
        );
        Ok(Self {
            client: StorageClient::new(config),
        })
    }

    /// Adapter on `SUPABASE_BUCKET` (default `media`) under `SUPABASE_FOLDER`
    /// (default: bucket root).
    pub fn from_settings(settings: &SupabaseSettings) -> Result<Self> {
        let folder = settings.folder.as_deref().unwrap_or_default();
        Self::new(settings.resolve(settings.bucket(), folder)?)
    }

    pub fn config(&self) -> &StorageConfig {
        self.client.config()
    }

    pub fn bucket(&self) -> &str {
        &self.config().bucket
    }

    pub fn folder(&self) -> &str {
        &self.config().folder
    }

    fn object_path(&self, name: &str) -> Result<ObjectPath> {
        ObjectPath::new(self.folder(), name)
    }

    /// Remote metadata for `name`.
    pub async fn info(&self, name: &str) -> Result<ObjectInfo> {
        let path = self.object_path(name)?;
        self.client.info(&path.key()).await
    }
}

#[async_trait]
impl Storage for SupabaseStorage {
    async fn save(&self, name: &str, content: &[u8]) -> Result<String> {
        let path = self.object_path(name)?;
        if content.is_empty() {
            return Err(StorageError::EmptyContentError {
                name: path.name().to_string(),
            });
        }

        let key = path.key();
        let content_type = mime_guess::from_path(path.name()).first_or_octet_stream();
        tracing::info!(
            bucket = %self.bucket(),
            key = %key,
            size = content.len(),
            "Uploading file to Supabase"
        );

        self.client
            .upload(&key, content, content_type.essence_str())
            .await
            .inspect_err(|e| tracing::error!("Upload of {}/{} failed: {}", self.bucket(), key, e))?;

        tracing::info!("✅ Uploaded {}/{}", self.bucket(), key);
        Ok(path.name().to_string())
    }

    async fn open(&self, name: &str, mode: OpenMode) -> Result<StorageFile> {
        let path = self.object_path(name)?;
        let key = path.key();
        tracing::debug!("Opening {}/{}", self.bucket(), key);

        let content = self.client.download(&key).await?;
        tracing::debug!("Downloaded {}/{} ({} bytes)", self.bucket(), key, content.len());
        Ok(StorageFile::new(path.name(), mode, content))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        if path::normalize(name)?.is_empty() {
            return Ok(());
        }

        let key = self.object_path(name)?.key();
        match self.client.remove(std::slice::from_ref(&key)).await {
            Ok(0) => {
                tracing::warn!("Nothing to delete at {}/{}", self.bucket(), key);
                Ok(())
            }
            Ok(_) => {
                tracing::info!("Deleted {}/{}", self.bucket(), key);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Could not delete {}/{}: {}", self.bucket(), key, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        if path::normalize(name)?.is_empty() {
            return Ok(false);
        }

        match self.info(name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn listdir(&self, path: &str) -> Result<Listing> {
        let prefix = ObjectPath::directory(self.folder(), path)?.key();
        let entries = self.client.list_all(&prefix).await?;

        let mut listing = Listing::default();
        for entry in entries {
            if entry.is_dir() {
                listing.directories.push(entry.name);
            } else if entry.name != FOLDER_PLACEHOLDER {
                listing.files.push(entry.name);
            }
        }

        tracing::debug!(
            "Listed {}/{}: {} directories, {} files",
            self.bucket(),
            prefix,
            listing.directories.len(),
            listing.files.len()
        );
        Ok(listing)
    }

    async fn size(&self, name: &str) -> Result<u64> {
        Ok(self.info(name).await?.size)
    }

    fn url(&self, name: &str) -> String {
        match self.object_path(name) {
            Ok(path) => self.client.public_url(&path.key()),
            Err(_) => String::new(),
        }
    }

    async fn get_accessed_time(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.info(name).await?.accessed_time())
    }

    async fn get_created_time(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.info(name).await?.created_time())
    }

    async fn get_modified_time(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.info(name).await?.modified_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(folder: &str) -> SupabaseStorage {
        let settings = SupabaseSettings::new("https://abc.supabase.co/", "anon-key");
        SupabaseStorage::new(settings.resolve("media", folder).unwrap()).unwrap()
    }

    #[test]
    fn test_url_is_local() {
        let storage = storage("media");
        assert_eq!(
            storage.url("/avatars//me.png"),
            "https://abc.supabase.co/storage/v1/object/public/media/media/avatars/me.png"
        );
        assert_eq!(storage.url("avatars/me.png"), storage.url("avatars/me.png"));
        assert_eq!(storage.url(""), "");
    }

    #[test]
    fn test_url_without_folder() {
        assert_eq!(
            storage("").url("report.pdf"),
            "https://abc.supabase.co/storage/v1/object/public/media/report.pdf"
        );
    }

    #[test]
    fn test_new_rejects_blank_key() {
        let config = StorageConfig {
            endpoint: "https://abc.supabase.co".to_string(),
            api_key: " ".to_string(),
            bucket: "media".to_string(),
            folder: String::new(),
            timeout: std::time::Duration::from_secs(30),
            cache_control_seconds: 3600,
        };
        assert!(matches!(
            SupabaseStorage::new(config),
            Err(StorageError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_from_settings_uses_bucket_and_folder() {
        let settings = SupabaseSettings::new("https://abc.supabase.co", "k")
            .with_bucket("uploads")
            .with_folder("tenant-1/");
        let storage = SupabaseStorage::from_settings(&settings).unwrap();
        assert_eq!(storage.bucket(), "uploads");
        assert_eq!(storage.folder(), "tenant-1");
    }
}
