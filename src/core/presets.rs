use crate::config::SupabaseSettings;
use crate::core::storage::SupabaseStorage;
use crate::domain::model::{Listing, OpenMode, StorageFile};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::ops::Deref;
use std::str::FromStr;

pub const MEDIA_FOLDER: &str = "media";
pub const STATIC_FOLDER: &str = "static";

/// Forwards every `Storage` call to the wrapped `SupabaseStorage`.
macro_rules! delegate_storage {
    ($preset:ty) => {
        #[async_trait]
        impl Storage for $preset {
            async fn save(&self, name: &str, content: &[u8]) -> Result<String> {
                self.0.save(name, content).await
            }

            async fn open(&self, name: &str, mode: OpenMode) -> Result<StorageFile> {
                self.0.open(name, mode).await
            }

            async fn delete(&self, name: &str) -> Result<()> {
                self.0.delete(name).await
            }

            async fn exists(&self, name: &str) -> Result<bool> {
                self.0.exists(name).await
            }

            async fn listdir(&self, path: &str) -> Result<Listing> {
                self.0.listdir(path).await
            }

            async fn size(&self, name: &str) -> Result<u64> {
                self.0.size(name).await
            }

            fn url(&self, name: &str) -> String {
                self.0.url(name)
            }

            async fn get_accessed_time(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
                self.0.get_accessed_time(name).await
            }

            async fn get_created_time(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
                self.0.get_created_time(name).await
            }

            async fn get_modified_time(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
                self.0.get_modified_time(name).await
            }
        }

        impl Deref for $preset {
            type Target = SupabaseStorage;

            fn deref(&self) -> &SupabaseStorage {
                &self.0
            }
        }
    };
}

/// User uploads. Bucket: `SUPABASE_MEDIA_BUCKET`, then `SUPABASE_BUCKET`,
/// then `media`. Objects live under `media/`.
#[derive(Debug, Clone)]
pub struct MediaStorage(SupabaseStorage);

impl MediaStorage {
    pub fn new(settings: &SupabaseSettings) -> Result<Self> {
        let bucket = settings
            .media_bucket
            .as_deref()
            .or(settings.bucket.as_deref())
            .unwrap_or("media");
        let storage = SupabaseStorage::new(settings.resolve(bucket, MEDIA_FOLDER)?)?;
        tracing::debug!("MediaStorage initialized for bucket {}", bucket);
        Ok(Self(storage))
    }
}

/// Build-time static assets. Bucket: `SUPABASE_STATIC_BUCKET`, then
/// `SUPABASE_BUCKET`, then `static`. Objects live under `static/`.
///
/// Deployments that relied on static files landing in the `media` bucket
/// when no bucket was configured must set `SUPABASE_STATIC_BUCKET=media`.
#[derive(Debug, Clone)]
pub struct StaticStorage(SupabaseStorage);

impl StaticStorage {
    pub fn new(settings: &SupabaseSettings) -> Result<Self> {
        let bucket = settings
            .static_bucket
            .as_deref()
            .or(settings.bucket.as_deref())
            .unwrap_or("static");
        let storage = SupabaseStorage::new(settings.resolve(bucket, STATIC_FOLDER)?)?;
        tracing::debug!("StaticStorage initialized for bucket {}", bucket);
        Ok(Self(storage))
    }
}

delegate_storage!(MediaStorage);
delegate_storage!(StaticStorage);

/// Which adapter flavour to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Base,
    Media,
    Static,
}

impl Preset {
    pub fn build(self, settings: &SupabaseSettings) -> Result<Box<dyn Storage>> {
        Ok(match self {
            Preset::Base => Box::new(SupabaseStorage::from_settings(settings)?),
            Preset::Media => Box::new(MediaStorage::new(settings)?),
            Preset::Static => Box::new(StaticStorage::new(settings)?),
        })
    }
}

impl FromStr for Preset {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "base" | "default" => Ok(Preset::Base),
            "media" => Ok(Preset::Media),
            "static" => Ok(Preset::Static),
            other => Err(StorageError::InvalidConfigValueError {
                field: "preset".to_string(),
                value: other.to_string(),
                reason: "Expected one of: base, media, static".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SupabaseSettings {
        SupabaseSettings::new("https://abc.supabase.co", "anon-key")
    }

    #[test]
    fn test_default_buckets() {
        let media = MediaStorage::new(&settings()).unwrap();
        assert_eq!(media.bucket(), "media");
        assert_eq!(media.folder(), MEDIA_FOLDER);

        let assets = StaticStorage::new(&settings()).unwrap();
        assert_eq!(assets.bucket(), "static");
        assert_eq!(assets.folder(), STATIC_FOLDER);
    }

    #[test]
    fn test_bucket_precedence() {
        let mut settings = settings().with_bucket("shared");
        assert_eq!(MediaStorage::new(&settings).unwrap().bucket(), "shared");
        assert_eq!(StaticStorage::new(&settings).unwrap().bucket(), "shared");

        settings.media_bucket = Some("uploads".to_string());
        settings.static_bucket = Some("assets".to_string());
        assert_eq!(MediaStorage::new(&settings).unwrap().bucket(), "uploads");
        assert_eq!(StaticStorage::new(&settings).unwrap().bucket(), "assets");
    }

    #[test]
    fn test_preset_urls() {
        let storage = Preset::Static.build(&settings()).unwrap();
        assert_eq!(
            storage.url("css/site.css"),
            "https://abc.supabase.co/storage/v1/object/public/static/static/css/site.css"
        );
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("media".parse::<Preset>().unwrap(), Preset::Media);
        assert_eq!("STATIC".parse::<Preset>().unwrap(), Preset::Static);
        assert_eq!("default".parse::<Preset>().unwrap(), Preset::Base);
        assert!("s3".parse::<Preset>().is_err());
    }

    #[test]
    fn test_presets_require_credentials() {
        let missing = SupabaseSettings::default();
        assert!(MediaStorage::new(&missing).is_err());
        assert!(Preset::Static.build(&missing).is_err());
    }
}
