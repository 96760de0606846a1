//! JSON save file for a whole collection

mod file_storage;
mod models;

pub use file_storage::{CollectionStorage, StorageError};
pub use models::*;
