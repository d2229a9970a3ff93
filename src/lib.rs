//! Supabase Storage backend for applications that write files through a
//! generic [`Storage`] trait.
//!
//! ```no_run
//! use supabase_storage::{MediaStorage, OpenMode, Storage, SupabaseSettings};
//!
//! # async fn run() -> supabase_storage::Result<()> {
//! let settings = SupabaseSettings::from_env()?;
//! let storage = MediaStorage::new(&settings)?;
//!
//! let name = storage.save("avatars/me.png", b"...").await?;
//! let file = storage.open(&name, OpenMode::ReadBinary).await?;
//! println!("{} bytes at {}", file.len(), storage.url(&name));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::{toml_config::TomlConfig, StorageConfig, SupabaseSettings};

pub use core::presets::{MediaStorage, Preset, StaticStorage};
pub use core::storage::SupabaseStorage;
pub use domain::model::{Listing, ObjectInfo, OpenMode, StorageFile};
pub use domain::ports::Storage;
pub use utils::error::{Result, StorageError};
