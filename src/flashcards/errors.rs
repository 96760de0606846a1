use thiserror::Error;
use uuid::Uuid;

use super::models::ReviewKind;
use crate::data::DataError;

#[derive(Error, Debug)]
pub enum FlashcardError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Unrecognized status scheme: {0}")]
    UnrecognizedScheme(String),

    #[error("Unrecognized review type: {0}")]
    UnrecognizedReviewKind(String),

    #[error("Card not found: {front} / {back}")]
    CardNotFound { front: String, back: String },

    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    #[error("Data set not found: {0}")]
    DataSetNotFound(Uuid),

    #[error("Review not found: {0}")]
    ReviewNotFound(Uuid),

    #[error("Review belongs to deck {expected}, not {found}")]
    DeckMismatch { expected: Uuid, found: Uuid },

    #[error("No current card in this session")]
    NoCurrentCard,

    #[error("Operation requires a {expected} review, this is a {found} review")]
    WrongReviewKind { expected: ReviewKind, found: ReviewKind },

    #[error("Multiple choice needs at least 2 options, got {0}")]
    TooFewOptions(usize),

    #[error("Card index {index} out of range for deck of {len} cards")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Deck is not independent: {0}")]
    NotIndependent(Uuid),
}

pub type Result<T> = std::result::Result<T, FlashcardError>;
