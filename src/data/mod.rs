//! Tabular data backing the flashcard decks
//!
//! This module provides:
//! - `Table`, an ordered column-name -> values mapping
//! - The `DataSource` trait with CSV/TSV and in-memory implementations
//! - `DataSet`, a cached view of a source that decks materialize from

pub mod dataset;
pub mod source;
pub mod table;

use thiserror::Error;

pub use dataset::DataSet;
pub use source::{open_source, reopen_source, CsvSource, DataSource, MemorySource, SourceKind};
pub use table::Table;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed data in {location}: {reason}")]
    Malformed { location: String, reason: String },

    #[error("Data source is read-only: {0}")]
    ReadOnly(String),

    #[error("Field not found: {0}")]
    MissingField(String),

    #[error("Unrecognized data source: {0}")]
    UnrecognizedSource(String),
}

pub type Result<T> = std::result::Result<T, DataError>;
