use crate::config::toml_config::TomlConfig;
use crate::config::SupabaseSettings;
use crate::core::presets::Preset;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "supabase-storage")]
#[command(about = "Manage files in Supabase Storage buckets")]
pub struct CliConfig {
    /// TOML file with a [supabase] table; flags and env vars override it
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "SUPABASE_URL")]
    pub url: Option<String>,

    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub key: Option<String>,

    #[arg(long, env = "SUPABASE_BUCKET")]
    pub bucket: Option<String>,

    #[arg(long, env = "SUPABASE_FOLDER")]
    pub folder: Option<String>,

    /// Adapter flavour: base, media or static
    #[arg(long, default_value = "base", value_parser = parse_preset)]
    pub preset: Preset,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Verify settings and bucket access
    Check,
    /// Upload a local file
    Upload {
        file: PathBuf,
        /// Object name; defaults to the file name
        name: Option<String>,
    },
    /// Download an object to a local file, or stdout when no output is given
    Download {
        name: String,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete an object
    Rm { name: String },
    /// Report whether an object exists
    Exists { name: String },
    /// List directories and files under a path
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Show size and timestamps of an object
    Stat { name: String },
    /// Print the public URL of an object
    Url { name: String },
}

impl CliConfig {
    /// Flags and env vars win over the config file.
    pub fn settings(&self) -> Result<SupabaseSettings> {
        let file_settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?.supabase,
            None => SupabaseSettings::default(),
        };

        let overrides = SupabaseSettings {
            url: self.url.clone(),
            key: self.key.clone(),
            bucket: self.bucket.clone(),
            folder: self.folder.clone(),
            ..Default::default()
        };

        Ok(overrides.merge(SupabaseSettings::from_env()?).merge(file_settings))
    }
}

fn parse_preset(raw: &str) -> std::result::Result<Preset, String> {
    raw.parse().map_err(|e: crate::utils::error::StorageError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = CliConfig::try_parse_from([
            "supabase-storage",
            "--url",
            "https://abc.supabase.co",
            "--key",
            "k",
            "--preset",
            "media",
            "upload",
            "./logo.png",
            "brand/logo.png",
        ])
        .unwrap();

        assert_eq!(cli.preset, Preset::Media);
        assert!(matches!(
            cli.command,
            Command::Upload { ref name, .. } if name.as_deref() == Some("brand/logo.png")
        ));
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.toml");
        std::fs::write(
            &path,
            "[supabase]\nurl = \"https://file.supabase.co\"\nkey = \"file-key\"\nbucket = \"from-file\"\n",
        )
        .unwrap();

        let cli = CliConfig::try_parse_from([
            "supabase-storage",
            "--config",
            path.to_str().unwrap(),
            "--bucket",
            "from-flag",
            "ls",
        ])
        .unwrap();

        let settings = cli.settings().unwrap();
        assert_eq!(settings.bucket(), "from-flag");
        assert!(matches!(cli.command, Command::Ls { ref path } if path.is_empty()));
    }

    #[test]
    fn test_rejects_unknown_preset() {
        assert!(CliConfig::try_parse_from(["supabase-storage", "--preset", "s3", "check"]).is_err());
    }
}
