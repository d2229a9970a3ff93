use anyhow::Context;
use clap::Parser;
use std::io::Write;
use supabase_storage::config::cli::Command;
use supabase_storage::utils::error::ErrorCategory;
use supabase_storage::utils::{logger, validation::Validate};
use supabase_storage::{CliConfig, OpenMode, StorageError, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    let file_logging = config
        .config
        .as_ref()
        .and_then(|path| TomlConfig::from_file(path).ok())
        .and_then(|file| file.logging);

    if config.json_logs || file_logging.as_ref().is_some_and(|l| l.json) {
        let level = match (config.verbose, file_logging.and_then(|l| l.level)) {
            (true, _) => "debug".to_string(),
            (false, Some(level)) => level,
            (false, None) => "info".to_string(),
        };
        logger::init_json_logger(&level);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config.command);

    if let Err(e) = run(&config).await {
        match e.downcast_ref::<StorageError>() {
            Some(storage_error) => {
                tracing::error!(
                    "❌ {} (Category: {:?})",
                    storage_error,
                    storage_error.category()
                );
                eprintln!("❌ {}", storage_error);
                eprintln!("💡 {}", storage_error.recovery_suggestion());
                std::process::exit(exit_code(storage_error.category()));
            }
            None => {
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run(config: &CliConfig) -> anyhow::Result<()> {
    let settings = config.settings()?;
    settings.validate()?;
    let storage = config.preset.build(&settings)?;

    match &config.command {
        Command::Check => {
            println!("✓ SUPABASE_URL: {}", settings.url.as_deref().unwrap_or_default());
            println!("✓ SUPABASE_KEY: configured");
            println!("✓ Preset: {:?}", config.preset);

            let listing = storage.listdir("").await?;
            println!(
                "✓ Bucket reachable ({} directories, {} files at the root)",
                listing.directories.len(),
                listing.files.len()
            );
        }
        Command::Upload { file, name } => {
            let content = tokio::fs::read(file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = match name {
                Some(name) => name.clone(),
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("Upload path has no file name")?,
            };

            let saved = storage.save(&storage.get_valid_name(&name), &content).await?;
            println!("✅ Uploaded {} ({} bytes)", saved, content.len());
            println!("📁 {}", storage.url(&saved));
        }
        Command::Download { name, output } => {
            let file = storage.open(name, OpenMode::ReadBinary).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(path, file.as_bytes())
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("✅ Saved {} bytes to {}", file.len(), path.display());
                }
                None => std::io::stdout().write_all(file.as_bytes())?,
            }
        }
        Command::Rm { name } => {
            storage.delete(name).await?;
            println!("✅ Deleted {}", name);
        }
        Command::Exists { name } => {
            let exists = storage.exists(name).await?;
            println!("{}", exists);
            if !exists {
                std::process::exit(1);
            }
        }
        Command::Ls { path } => {
            let (directories, files) = storage.listdir(path).await?.into_parts();
            for dir in directories {
                println!("{}/", dir);
            }
            for file in files {
                println!("{}", file);
            }
        }
        Command::Stat { name } => {
            let size = storage.size(name).await?;
            let display = |t: Option<chrono::DateTime<chrono::Utc>>| {
                t.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string())
            };
            println!("name:     {}", name);
            println!("size:     {} bytes", size);
            println!("created:  {}", display(storage.get_created_time(name).await?));
            println!("modified: {}", display(storage.get_modified_time(name).await?));
            println!("accessed: {}", display(storage.get_accessed_time(name).await?));
            println!("url:      {}", storage.url(name));
        }
        Command::Url { name } => println!("{}", storage.url(name)),
    }

    Ok(())
}

fn exit_code(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::Configuration => 2,
        ErrorCategory::Input => 3,
        ErrorCategory::NotFound => 4,
        ErrorCategory::Permission => 5,
        ErrorCategory::Io | ErrorCategory::Service => 1,
    }
}
