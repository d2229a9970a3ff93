pub mod client;
pub mod path;
pub mod presets;
pub mod storage;

pub use crate::domain::model::{Listing, ObjectInfo, OpenMode, StorageFile};
pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;
