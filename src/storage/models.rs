//! On-disk layout of the save file.
//!
//! Objects refer to each other by `num`, their position in the saved list.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::data::SourceKind;
use crate::flashcards::{ReviewKind, ReviewSettings, SessionOrder, Status};

/// `status_datetime` format, always UTC
pub const DATETIME_FORMAT: &str = "%m/%d/%Y, %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    #[serde(default)]
    pub data_sources: Vec<SavedDataSource>,
    #[serde(default)]
    pub data_sets: Vec<SavedDataSet>,
    #[serde(default)]
    pub decks: Vec<SavedDeck>,
    #[serde(default)]
    pub reviews: Vec<SavedReview>,
    #[serde(default)]
    pub review_statuses: Vec<SavedReviewStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDataSource {
    pub num: usize,
    /// Missing in older files; inferred from the extension then
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SourceKind>,
    #[serde(alias = "data_source_str")]
    pub location: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDataSet {
    pub num: usize,
    pub data_source_num: usize,
    pub depends_on_deck: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDeck {
    pub num: usize,
    pub data_set_num: usize,
    pub front_field: String,
    pub back_field: String,
    #[serde(rename = "static")]
    pub independent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReview {
    pub num: usize,
    pub deck_num: usize,
    pub status_type: String,
    pub review_type: ReviewKind,
    /// Missing in older files; the scheme's default order then
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SavedOrder>,
    #[serde(flatten)]
    pub settings: ReviewSettings,
}

/// Session order of a review. The new card count lives in the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavedOrder {
    Shuffled,
    DeckOrder,
    DueThenNew,
}

impl SavedOrder {
    pub fn into_order(self, settings: &ReviewSettings) -> SessionOrder {
        match self {
            SavedOrder::Shuffled => SessionOrder::WholeDeckShuffled,
            SavedOrder::DeckOrder => SessionOrder::WholeDeck,
            SavedOrder::DueThenNew => SessionOrder::DueThenNew {
                new_cards_per_session: settings.new_cards_per_session,
            },
        }
    }
}

impl From<SessionOrder> for SavedOrder {
    fn from(order: SessionOrder) -> Self {
        match order {
            SessionOrder::WholeDeckShuffled => SavedOrder::Shuffled,
            SessionOrder::WholeDeck => SavedOrder::DeckOrder,
            SessionOrder::DueThenNew { .. } => SavedOrder::DueThenNew,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReviewStatus {
    pub num: usize,
    pub review_num: usize,
    pub deck_num: usize,
    pub front_side: String,
    pub back_side: String,
    pub status: Status,
    pub status_datetime: String,
}

pub fn format_datetime(datetime: &DateTime<Utc>) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_format() {
        let datetime = Utc.with_ymd_and_hms(2026, 1, 9, 17, 5, 3).unwrap();
        let text = format_datetime(&datetime);
        assert_eq!(text, "01/09/2026, 17:05:03");
        assert_eq!(parse_datetime(&text).unwrap(), datetime);
        assert!(parse_datetime("2026-01-09T17:05:03Z").is_err());
    }

    #[test]
    fn test_review_settings_default_when_absent() {
        let json = r#"{"num": 0, "deck_num": 0, "status_type": "leitner", "review_type": "input"}"#;
        let review: SavedReview = serde_json::from_str(json).unwrap();
        assert_eq!(review.settings, ReviewSettings::default());
        assert_eq!(review.review_type, ReviewKind::Input);
        assert_eq!(review.order, None);
    }

    #[test]
    fn test_saved_order_keeps_new_card_count_in_settings() {
        let settings = ReviewSettings {
            new_cards_per_session: 3,
            ..ReviewSettings::default()
        };
        let order = SessionOrder::DueThenNew { new_cards_per_session: 3 };
        assert_eq!(SavedOrder::from(order).into_order(&settings), order);
        assert_eq!(
            SavedOrder::from(SessionOrder::WholeDeck).into_order(&settings),
            SessionOrder::WholeDeck
        );

        let json = r#"{"num": 0, "deck_num": 0, "status_type": "default", "review_type": "simple", "order": "deck_order"}"#;
        let review: SavedReview = serde_json::from_str(json).unwrap();
        assert_eq!(review.order, Some(SavedOrder::DeckOrder));
    }

    #[test]
    fn test_legacy_source_key() {
        let json = r#"{"num": 0, "data_source_str": "words.csv", "read_only": true}"#;
        let source: SavedDataSource = serde_json::from_str(json).unwrap();
        assert_eq!(source.location, "words.csv");
        assert_eq!(source.kind, None);
    }
}
