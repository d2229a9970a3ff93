#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::{Result, StorageError};
use crate::utils::validation::{
    validate_bucket_name, validate_range, validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_BUCKET: &str = "media";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_CACHE_CONTROL_SECONDS: u64 = 3600;

/// Raw connection settings as they come from the environment or a config
/// file. Nothing is read from the environment after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseSettings {
    pub url: Option<String>,
    pub key: Option<String>,
    pub bucket: Option<String>,
    pub media_bucket: Option<String>,
    pub static_bucket: Option<String>,
    pub folder: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub cache_control_seconds: Option<u64>,
}

impl SupabaseSettings {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: env_var("SUPABASE_URL"),
            key: env_var("SUPABASE_KEY"),
            bucket: env_var("SUPABASE_BUCKET"),
            media_bucket: env_var("SUPABASE_MEDIA_BUCKET"),
            static_bucket: env_var("SUPABASE_STATIC_BUCKET"),
            folder: env_var("SUPABASE_FOLDER"),
            timeout_seconds: env_number("SUPABASE_TIMEOUT_SECONDS")?,
            cache_control_seconds: env_number("SUPABASE_CACHE_CONTROL_SECONDS")?,
        })
    }

    /// Fills unset fields from `other`.
    pub fn merge(self, other: SupabaseSettings) -> Self {
        Self {
            url: self.url.or(other.url),
            key: self.key.or(other.key),
            bucket: self.bucket.or(other.bucket),
            media_bucket: self.media_bucket.or(other.media_bucket),
            static_bucket: self.static_bucket.or(other.static_bucket),
            folder: self.folder.or(other.folder),
            timeout_seconds: self.timeout_seconds.or(other.timeout_seconds),
            cache_control_seconds: self.cache_control_seconds.or(other.cache_control_seconds),
        }
    }

    pub fn bucket(&self) -> &str {
        self.bucket.as_deref().unwrap_or(DEFAULT_BUCKET)
    }

    /// Resolves the settings for an adapter writing to `bucket` under
    /// `folder`.
    pub fn resolve(&self, bucket: &str, folder: &str) -> Result<StorageConfig> {
        let config = StorageConfig {
            endpoint: validate_required_field("SUPABASE_URL", &self.url)?
                .trim_end_matches('/')
                .to_string(),
            api_key: validate_required_field("SUPABASE_KEY", &self.key)?.to_string(),
            bucket: bucket.to_string(),
            folder: folder.trim_matches('/').to_string(),
            timeout: Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
            cache_control_seconds: self
                .cache_control_seconds
                .unwrap_or(DEFAULT_CACHE_CONTROL_SECONDS),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validate for SupabaseSettings {
    fn validate(&self) -> Result<()> {
        validate_url("SUPABASE_URL", validate_required_field("SUPABASE_URL", &self.url)?)?;
        validate_required_field("SUPABASE_KEY", &self.key)?;

        validate_bucket_name("SUPABASE_BUCKET", self.bucket())?;
        if let Some(bucket) = &self.media_bucket {
            validate_bucket_name("SUPABASE_MEDIA_BUCKET", bucket)?;
        }
        if let Some(bucket) = &self.static_bucket {
            validate_bucket_name("SUPABASE_STATIC_BUCKET", bucket)?;
        }
        if let Some(timeout) = self.timeout_seconds {
            validate_range("SUPABASE_TIMEOUT_SECONDS", timeout, 1, 600)?;
        }

        tracing::debug!("Supabase settings validation passed");
        Ok(())
    }
}

/// Immutable configuration of one adapter instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub endpoint: String,
    pub api_key: String,
    pub bucket: String,
    pub folder: String,
    pub timeout: Duration,
    pub cache_control_seconds: u64,
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<()> {
        validate_url("SUPABASE_URL", &self.endpoint)?;
        if self.api_key.trim().is_empty() {
            return Err(StorageError::MissingConfigError {
                field: "SUPABASE_KEY".to_string(),
            });
        }
        validate_bucket_name("bucket", &self.bucket)?;
        if self.folder.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidConfigValueError {
                field: "folder".to_string(),
                value: self.folder.clone(),
                reason: "Folder prefix cannot contain '..'".to_string(),
            });
        }
        validate_range("timeout_seconds", self.timeout.as_secs(), 1, 600)
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_number(name: &str) -> Result<Option<u64>> {
    env_var(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| StorageError::InvalidConfigValueError {
                    field: name.to_string(),
                    value: raw.clone(),
                    reason: "Value must be a positive integer".to_string(),
                })
        })
        .transpose()
}
