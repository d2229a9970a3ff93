use crate::config::StorageConfig;
use crate::domain::model::ObjectInfo;
use crate::utils::error::{Result, StorageError};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use url::Url;

pub const LIST_PAGE_SIZE: usize = 100;

/// Entry returned by the bucket listing endpoint. Folders carry no `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEntry {
    pub name: String,
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_accessed_at: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl ListEntry {
    pub fn is_dir(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Debug, Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "statusCode")]
    status_code: Option<serde_json::Value>,
    error: Option<String>,
    message: Option<String>,
}

/// Object row from the info endpoint. Older deployments nest size and
/// content type under `metadata` and use `updated_at` instead of
/// `last_modified`.
#[derive(Debug, Deserialize)]
struct RawObjectInfo {
    name: Option<String>,
    size: Option<u64>,
    content_type: Option<String>,
    etag: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    last_modified: Option<String>,
    last_accessed_at: Option<String>,
    metadata: Option<serde_json::Value>,
}

/// HTTP client for the Supabase Storage REST API, scoped to one bucket.
#[derive(Debug, Clone)]
pub struct StorageClient {
    config: StorageConfig,
    http: OnceLock<Client>,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            http: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Built on first use; a client that cannot honour the configured
    /// timeout is a configuration error.
    fn http(&self) -> Result<&Client> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }

        tracing::debug!("Creating HTTP client for {}", self.config.endpoint);
        let client = Client::builder()
            .timeout(self.config.timeout)
            .user_agent(concat!("supabase-storage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorageError::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(self.http.get_or_init(|| client))
    }

    fn endpoint(&self, route: &[&str], key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint)
            .map_err(|e| StorageError::config(format!("Invalid SUPABASE_URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::config("SUPABASE_URL cannot be a base URL"))?
            .pop_if_empty()
            .extend(["storage", "v1", "object"])
            .extend(route)
            .extend(key.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        Ok(self
            .http()?
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("apikey", &self.config.api_key))
    }

    /// Public URL of `key`. No request is made and nothing is signed.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.endpoint, self.config.bucket, key
        )
    }

    /// Upserts `content` at `key`.
    pub async fn upload(&self, key: &str, content: &[u8], content_type: &str) -> Result<()> {
        let url = self.endpoint(&[self.config.bucket.as_str()], key)?;
        tracing::debug!("POST {} ({} bytes, {})", url, content.len(), content_type);

        let response = self
            .request(Method::POST, url)?
            .header("x-upsert", "true")
            .header("content-type", content_type)
            .header(
                "cache-control",
                format!("max-age={}", self.config.cache_control_seconds),
            )
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| self.upload_error(key, e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }

        match self.error_from_response(response, key).await {
            err @ StorageError::PermissionError { .. } => Err(err),
            err => Err(self.upload_error(key, err.to_string())),
        }
    }

    pub async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.endpoint(&[self.config.bucket.as_str()], key)?;
        tracing::debug!("GET {}", url);

        let response = self.request(Method::GET, url)?.send().await?;
        if !response.status().is_success() {
            return Err(self.error_from_response(response, key).await);
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Removes `keys` and returns how many objects the service deleted.
    pub async fn remove(&self, keys: &[String]) -> Result<usize> {
        let url = self.endpoint(&[self.config.bucket.as_str()], "")?;
        tracing::debug!("DELETE {} {:?}", url, keys);

        let response = self
            .request(Method::DELETE, url)?
            .json(&serde_json::json!({ "prefixes": keys }))
            .send()
            .await?;

        if !response.status().is_success() {
            let key = keys.first().map(String::as_str).unwrap_or_default();
            return Err(self.error_from_response(response, key).await);
        }

        let removed: Vec<serde_json::Value> = decode(response).await?;
        Ok(removed.len())
    }

    /// One page of entries directly under `prefix`.
    pub async fn list(&self, prefix: &str, limit: usize, offset: usize) -> Result<Vec<ListEntry>> {
        let url = self.endpoint(&["list", self.config.bucket.as_str()], "")?;
        tracing::debug!("POST {} prefix={:?} offset={}", url, prefix, offset);

        let body = ListRequest {
            prefix,
            limit,
            offset,
            sort_by: SortBy {
                column: "name",
                order: "asc",
            },
        };
        let response = self.request(Method::POST, url)?.json(&body).send().await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response, prefix).await);
        }

        decode(response).await
    }

    /// All entries under `prefix`, following pages until a short one.
    pub async fn list_all(&self, prefix: &str) -> Result<Vec<ListEntry>> {
        let mut entries = Vec::new();
        loop {
            let page = self.list(prefix, LIST_PAGE_SIZE, entries.len()).await?;
            let page_len = page.len();
            entries.extend(page);
            if page_len < LIST_PAGE_SIZE {
                return Ok(entries);
            }
        }
    }

    pub async fn info(&self, key: &str) -> Result<ObjectInfo> {
        let url = self.endpoint(&["info", self.config.bucket.as_str()], key)?;
        tracing::debug!("GET {}", url);

        let response = self.request(Method::GET, url)?.send().await?;
        if !response.status().is_success() {
            return Err(self.error_from_response(response, key).await);
        }

        let raw: RawObjectInfo = decode(response).await?;
        Ok(raw.into_object_info(key))
    }

    fn upload_error(&self, key: &str, message: String) -> StorageError {
        StorageError::UploadError {
            bucket: self.config.bucket.clone(),
            path: key.to_string(),
            message,
        }
    }

    async fn error_from_response(&self, response: Response, key: &str) -> StorageError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_error(&self.config.bucket, key, status, &body)
    }
}

/// Reads the whole body, so a malformed payload surfaces as a
/// `SerializationError` rather than a transport error.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Maps a failed response to the error taxonomy. The service sometimes
/// answers 400 and carries the real status in the body's `statusCode`.
pub fn classify_error(bucket: &str, key: &str, status: StatusCode, body: &str) -> StorageError {
    let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();

    let body_status = parsed
        .as_ref()
        .and_then(|b| b.status_code.as_ref())
        .and_then(|v| match v {
            serde_json::Value::String(s) => s.parse::<u16>().ok(),
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            _ => None,
        });
    let error_kind = parsed
        .as_ref()
        .and_then(|b| b.error.as_deref())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone().or_else(|| b.error.clone()))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.to_string()
            }
        });

    let effective = body_status.unwrap_or(status.as_u16());
    if effective == 404 || error_kind == "not_found" || error_kind == "nosuchkey" {
        StorageError::NotFoundError {
            bucket: bucket.to_string(),
            path: key.to_string(),
        }
    } else if matches!(effective, 401 | 403) || error_kind == "unauthorized" {
        StorageError::PermissionError {
            bucket: bucket.to_string(),
            path: key.to_string(),
            message,
        }
    } else {
        StorageError::ServiceError {
            status: status.as_u16(),
            message,
        }
    }
}

impl RawObjectInfo {
    fn into_object_info(self, key: &str) -> ObjectInfo {
        let meta = |field: &str| self.metadata.as_ref().and_then(|m| m.get(field).cloned());

        let size = self
            .size
            .or_else(|| meta("size").and_then(|v| v.as_u64()))
            .or_else(|| meta("contentLength").and_then(|v| v.as_u64()))
            .unwrap_or(0);
        let content_type = self
            .content_type
            .clone()
            .or_else(|| meta("mimetype").and_then(|v| v.as_str().map(str::to_string)));
        let etag = self
            .etag
            .clone()
            .or_else(|| meta("eTag").and_then(|v| v.as_str().map(str::to_string)));

        ObjectInfo {
            name: self.name.clone().unwrap_or_else(|| key.to_string()),
            size,
            content_type,
            etag,
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            updated_at: self
                .last_modified
                .as_deref()
                .or(self.updated_at.as_deref())
                .and_then(parse_timestamp),
            last_accessed_at: self.last_accessed_at.as_deref().and_then(parse_timestamp),
        }
    }
}

/// RFC 3339, or a bare timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_classify_error() {
        let not_found = classify_error(
            "media",
            "media/a.txt",
            StatusCode::BAD_REQUEST,
            r#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#,
        );
        assert!(not_found.is_not_found());

        let plain_404 = classify_error("media", "media/a.txt", StatusCode::NOT_FOUND, "");
        assert!(plain_404.is_not_found());

        let denied = classify_error(
            "media",
            "media/a.txt",
            StatusCode::BAD_REQUEST,
            r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates row-level security policy"}"#,
        );
        assert!(matches!(
            denied,
            StorageError::PermissionError { ref message, .. } if message.contains("row-level security")
        ));

        let service = classify_error("media", "media/a.txt", StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(
            service,
            StorageError::ServiceError { status: 502, ref message } if message == "upstream down"
        ));
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:30:00.000+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_object_info_from_legacy_metadata() {
        let raw: RawObjectInfo = serde_json::from_value(serde_json::json!({
            "name": "media/a.txt",
            "created_at": "2024-05-01T12:30:00Z",
            "updated_at": "2024-05-02T12:30:00Z",
            "metadata": { "size": 42, "mimetype": "text/plain", "eTag": "\"abc\"" }
        }))
        .unwrap();

        let info = raw.into_object_info("media/a.txt");
        assert_eq!(info.size, 42);
        assert_eq!(info.content_type.as_deref(), Some("text/plain"));
        assert_eq!(info.etag.as_deref(), Some("\"abc\""));
        assert_eq!(info.updated_at, parse_timestamp("2024-05-02T12:30:00Z"));
        assert_eq!(info.last_accessed_at, None);
    }

    #[test]
    fn test_request_urls() {
        let client = StorageClient::new(StorageConfig {
            endpoint: "https://abc.supabase.co".to_string(),
            api_key: "k".to_string(),
            bucket: "media".to_string(),
            folder: "media".to_string(),
            timeout: std::time::Duration::from_secs(5),
            cache_control_seconds: 3600,
        });

        assert_eq!(
            client.endpoint(&["media"], "media/a b.txt").unwrap().as_str(),
            "https://abc.supabase.co/storage/v1/object/media/media/a%20b.txt"
        );
        assert_eq!(
            client.endpoint(&["list", "media"], "").unwrap().as_str(),
            "https://abc.supabase.co/storage/v1/object/list/media"
        );
        assert_eq!(
            client.public_url("media/a.txt"),
            "https://abc.supabase.co/storage/v1/object/public/media/media/a.txt"
        );
    }
}
