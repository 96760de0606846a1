pub mod config;
pub mod decks;
pub mod review;
pub mod sources;
pub mod stats;
