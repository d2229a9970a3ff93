use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field} is not configured")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid object name '{name}': {reason}")]
    InvalidNameError { name: String, reason: String },

    #[error("File is empty: {name}")]
    EmptyContentError { name: String },

    #[error("Unsupported open mode '{mode}': objects can only be opened for reading")]
    UnsupportedModeError { mode: String },

    #[error("Upload to {bucket}/{path} failed: {message}")]
    UploadError {
        bucket: String,
        path: String,
        message: String,
    },

    #[error("Object not found: {bucket}/{path}")]
    NotFoundError { bucket: String, path: String },

    #[error("Permission denied for {bucket}/{path}: {message}")]
    PermissionError {
        bucket: String,
        path: String,
        message: String,
    },

    #[error("Storage service returned {status}: {message}")]
    ServiceError { status: u16, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    NotFound,
    Permission,
    Io,
    Service,
}

impl StorageError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::InvalidNameError { .. }
            | Self::EmptyContentError { .. }
            | Self::UnsupportedModeError { .. } => ErrorCategory::Input,
            Self::NotFoundError { .. } => ErrorCategory::NotFound,
            Self::PermissionError { .. } => ErrorCategory::Permission,
            Self::UploadError { .. } | Self::IoError(_) | Self::ApiError(_) => ErrorCategory::Io,
            Self::ServiceError { .. } | Self::SerializationError(_) => ErrorCategory::Service,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Set SUPABASE_URL (https://your-project-id.supabase.co) and SUPABASE_KEY, or pass them in the config file"
            }
            ErrorCategory::Input => "Check the object name, content and open mode",
            ErrorCategory::NotFound => "Check the object name, bucket and folder prefix",
            ErrorCategory::Permission => {
                "Check the API key and the bucket's storage policies"
            }
            ErrorCategory::Io => "Check network connectivity to the Supabase project",
            ErrorCategory::Service => "Inspect the Supabase project logs for details",
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
