//! Flashcard and spaced repetition system
//!
//! This module provides:
//! - Decks materialized from tabular data sets
//! - Status schemes (no-op, Leitner, streak, custom)
//! - Reviews tracking per-card status under one scheme
//! - Review sessions for simple, multiple choice and typed-answer reviews

pub mod algorithm;
pub mod deck;
pub mod errors;
pub mod models;
pub mod review;
pub mod session;

pub use algorithm::{format_interval, CustomScheme, ReviewSettings, StatusScheme, MIN_STATUS};
pub use deck::{CardDisplay, Deck, RefreshSummary};
pub use errors::{FlashcardError, Result};
pub use models::*;
pub use review::{Review, SessionOrder};
pub use session::{normalize_answer, ReviewSession, SessionState};
