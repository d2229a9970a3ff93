use crate::config::SupabaseSettings;
use crate::utils::error::{Result, StorageError};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub supabase: SupabaseSettings,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StorageError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses a TOML document after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: TomlConfig = toml::from_str(&processed_content)
            .map_err(|e| StorageError::config(format!("TOML parsing error: {}", e)))?;
        config.supabase = blank_to_none(config.supabase);
        Ok(config)
    }

    /// Replaces `${VAR}` with the environment value; unset variables become
    /// empty strings.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| StorageError::config(format!("Invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!("Environment variable {} is not set", var_name);
                String::new()
            })
        });

        Ok(result.into_owned())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.supabase.validate()
    }
}

fn blank_to_none(settings: SupabaseSettings) -> SupabaseSettings {
    let clean = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    SupabaseSettings {
        url: clean(settings.url),
        key: clean(settings.key),
        bucket: clean(settings.bucket),
        media_bucket: clean(settings.media_bucket),
        static_bucket: clean(settings.static_bucket),
        folder: clean(settings.folder),
        ..settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[supabase]
url = "https://abc.supabase.co"
key = "anon"
bucket = "uploads"
static_bucket = "assets"
timeout_seconds = 10

[logging]
level = "debug"
json = true
"#;
        let config = TomlConfig::from_toml_str(content).unwrap();
        assert_eq!(config.supabase.url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(config.supabase.bucket(), "uploads");
        assert_eq!(config.supabase.static_bucket.as_deref(), Some("assets"));
        assert_eq!(config.supabase.media_bucket, None);
        assert_eq!(config.supabase.timeout_seconds, Some(10));

        let logging = config.logging.unwrap();
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert!(logging.json);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("TOML_CONFIG_TEST_KEY", "service-role-key");
        let content = r#"
[supabase]
url = "https://abc.supabase.co"
key = "${TOML_CONFIG_TEST_KEY}"
bucket = "${TOML_CONFIG_TEST_UNSET_BUCKET}"
"#;
        let config = TomlConfig::from_toml_str(content).unwrap();
        assert_eq!(config.supabase.key.as_deref(), Some("service-role-key"));
        assert_eq!(config.supabase.bucket, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let err = TomlConfig::from_toml_str("[supabase\nurl = 1").unwrap_err();
        assert!(matches!(err, StorageError::ConfigError { .. }));
    }
}
