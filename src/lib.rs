//! Spaced repetition flashcards built from tabular data.
//!
//! Rows of a CSV/TSV file become cards, cards form decks, and reviews track
//! how well each card is known under a status scheme.

pub mod collection;
pub mod config;
pub mod data;
pub mod flashcards;
pub mod storage;

pub use collection::Collection;
pub use config::Config;
pub use storage::CollectionStorage;
