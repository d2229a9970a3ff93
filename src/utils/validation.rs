use crate::utils::error::{Result, StorageError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.trim().is_empty() {
        return Err(StorageError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(StorageError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(StorageError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_required_field<'a>(field_name: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(StorageError::MissingConfigError {
            field: field_name.to_string(),
        }),
    }
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(StorageError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Supabase bucket ids: 1 to 100 characters of lowercase letters, digits,
/// `-`, `_` and `.`.
pub fn validate_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.is_empty() {
        return Err(StorageError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "Bucket name cannot be empty".to_string(),
        });
    }

    if bucket_name.len() > 100 {
        return Err(StorageError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "Bucket name must be at most 100 characters".to_string(),
        });
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
    {
        return Err(StorageError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "Bucket name can only contain lowercase letters, numbers, hyphens, underscores and dots"
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("url", "https://abc.supabase.co").is_ok());
        assert!(validate_url("url", "http://127.0.0.1:54321").is_ok());
        assert!(matches!(
            validate_url("url", ""),
            Err(StorageError::MissingConfigError { .. })
        ));
        assert!(validate_url("url", "abc.supabase.co").is_err());
        assert!(validate_url("url", "ftp://abc.supabase.co").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        assert_eq!(
            validate_required_field("key", &Some("anon".to_string())).unwrap(),
            "anon"
        );
        assert!(validate_required_field("key", &Some("   ".to_string())).is_err());
        assert!(validate_required_field("key", &None).is_err());
    }

    #[test]
    fn test_validate_bucket_name() {
        assert!(validate_bucket_name("bucket", "media").is_ok());
        assert!(validate_bucket_name("bucket", "static-assets_v2.1").is_ok());
        assert!(validate_bucket_name("bucket", "").is_err());
        assert!(validate_bucket_name("bucket", "Media").is_err());
        assert!(validate_bucket_name("bucket", "my bucket").is_err());
        assert!(validate_bucket_name("bucket", &"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("timeout_seconds", 30u64, 1, 600).is_ok());
        assert!(validate_range("timeout_seconds", 0u64, 1, 600).is_err());
    }
}
