use anyhow::Result;
use supabase_storage::utils::validation::Validate;
use supabase_storage::{MediaStorage, StaticStorage, StorageError, SupabaseSettings, TomlConfig};
use tempfile::TempDir;

// Single test so env mutations are not observed by a parallel test.
#[test]
fn test_settings_from_env() -> Result<()> {
    std::env::set_var("SUPABASE_URL", "https://project-id.supabase.co");
    std::env::set_var("SUPABASE_KEY", "anon-public-key");
    std::env::set_var("SUPABASE_MEDIA_BUCKET", "uploads");
    std::env::remove_var("SUPABASE_BUCKET");
    std::env::remove_var("SUPABASE_STATIC_BUCKET");
    std::env::set_var("SUPABASE_TIMEOUT_SECONDS", "15");

    let settings = SupabaseSettings::from_env()?;
    settings.validate()?;
    assert_eq!(settings.url.as_deref(), Some("https://project-id.supabase.co"));
    assert_eq!(settings.timeout_seconds, Some(15));

    let media = MediaStorage::new(&settings)?;
    assert_eq!(media.bucket(), "uploads");
    assert_eq!(media.config().timeout.as_secs(), 15);
    assert_eq!(StaticStorage::new(&settings)?.bucket(), "static");

    std::env::set_var("SUPABASE_TIMEOUT_SECONDS", "soon");
    assert!(matches!(
        SupabaseSettings::from_env(),
        Err(StorageError::InvalidConfigValueError { ref field, .. }) if field == "SUPABASE_TIMEOUT_SECONDS"
    ));
    std::env::remove_var("SUPABASE_TIMEOUT_SECONDS");
    Ok(())
}

#[test]
fn test_toml_file_builds_adapters() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("storage.toml");
    std::fs::write(
        &config_path,
        r#"
[supabase]
url = "https://project-id.supabase.co"
key = "${CONFIG_TEST_SUPABASE_KEY}"
bucket = "site"
folder = "tenant-a"
cache_control_seconds = 60
"#,
    )?;
    std::env::set_var("CONFIG_TEST_SUPABASE_KEY", "from-env");

    let config = TomlConfig::from_file(&config_path)?;
    config.validate()?;
    assert_eq!(config.supabase.key.as_deref(), Some("from-env"));

    let base = supabase_storage::SupabaseStorage::from_settings(&config.supabase)?;
    assert_eq!(base.bucket(), "site");
    assert_eq!(base.folder(), "tenant-a");
    assert_eq!(base.config().cache_control_seconds, 60);

    let assets = StaticStorage::new(&config.supabase)?;
    assert_eq!(assets.bucket(), "site");
    assert_eq!(assets.folder(), "static");
    Ok(())
}

#[test]
fn test_missing_config_file() {
    let err = TomlConfig::from_file("/nonexistent/storage.toml").unwrap_err();
    assert!(matches!(err, StorageError::IoError(_)));
}
