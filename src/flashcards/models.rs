//! Data models for the flashcard system

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::FlashcardError;

/// Mastery level of a card within one review
pub type Status = u32;

/// A flashcard with a front and a back.
///
/// Within a deck a card is identified by its (front, back) pair. The `id` is
/// only stable for the lifetime of the in-memory deck and is what review
/// statuses are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    pub front: String,
    pub back: String,
}

impl Card {
    pub fn new(front: String, back: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            front,
            back,
        }
    }

    pub fn has_sides(&self, front: &str, back: &str) -> bool {
        self.front == front && self.back == back
    }
}

/// Side of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
}

/// How the user interacts with a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    /// Front and back are shown, nothing is graded
    Simple,
    /// Pick the back from a shuffled list of options
    MultipleChoice,
    /// Type the back
    Input,
}

impl ReviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::Simple => "simple",
            ReviewKind::MultipleChoice => "multiple_choice",
            ReviewKind::Input => "input",
        }
    }

    /// Whether answers update card status
    pub fn is_graded(&self) -> bool {
        !matches!(self, ReviewKind::Simple)
    }
}

impl fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewKind {
    type Err = FlashcardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(ReviewKind::Simple),
            "multiple_choice" | "multiple-choice" => Ok(ReviewKind::MultipleChoice),
            "input" => Ok(ReviewKind::Input),
            other => Err(FlashcardError::UnrecognizedReviewKind(other.to_string())),
        }
    }
}

/// Status of one card under one review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardReviewStatus {
    pub card_id: Uuid,
    pub status: Status,
    /// When the status last changed
    pub last_update: DateTime<Utc>,
}

impl CardReviewStatus {
    pub fn new(card_id: Uuid, status: Status, last_update: DateTime<Utc>) -> Self {
        Self {
            card_id,
            status,
            last_update,
        }
    }
}

/// Statistics for a review over its deck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub unreviewed_cards: usize,
    pub reviewed_cards: usize,
    pub due_cards: usize,
    /// Number of reviewed cards at each status
    pub by_status: BTreeMap<Status, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_kind_parsing() {
        assert_eq!("simple".parse::<ReviewKind>().unwrap(), ReviewKind::Simple);
        assert_eq!(
            "Multiple-Choice".parse::<ReviewKind>().unwrap(),
            ReviewKind::MultipleChoice
        );
        assert_eq!("input".parse::<ReviewKind>().unwrap(), ReviewKind::Input);
        assert!(matches!(
            "flash".parse::<ReviewKind>(),
            Err(FlashcardError::UnrecognizedReviewKind(_))
        ));
    }

    #[test]
    fn test_review_kind_serde_names() {
        let json = serde_json::to_string(&ReviewKind::MultipleChoice).unwrap();
        assert_eq!(json, "\"multiple_choice\"");
    }
}
