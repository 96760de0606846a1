use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use super::models::*;
use crate::collection::Collection;
use crate::data::{reopen_source, DataError, DataSet, SourceKind};
use crate::flashcards::{CardReviewStatus, Deck, FlashcardError, Review, ReviewSettings, StatusScheme};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Flashcard(#[from] FlashcardError),

    #[error("Invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("{kind} {num} refers to missing {target} {target_num}")]
    DanglingReference {
        kind: &'static str,
        num: usize,
        target: &'static str,
        target_num: usize,
    },

    #[error("Data set {0} cannot be saved: its source is not a file")]
    Unpersistable(String),

    #[error("Review scheme '{0}' is defined in code and cannot be saved")]
    CustomScheme(String),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Reads and writes a whole collection as one JSON file
pub struct CollectionStorage {
    path: PathBuf,
}

impl CollectionStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the default save file path
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("cardbox").join("collection.json"))
            .ok_or(StorageError::DataDirNotFound)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the collection; a missing save file is an empty collection.
    ///
    /// Sources are re-pulled and decks rematerialized, then each saved status
    /// is reattached to the card with the same front and back.
    pub fn load(&self) -> Result<Collection> {
        if !self.path.exists() {
            log::info!("No save file at {}, starting empty", self.path.display());
            return Ok(Collection::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let save: SaveFile = serde_json::from_str(&content)?;
        let collection = restore(save)?;
        log::info!(
            "Loaded {} data sets, {} decks, {} reviews from {}",
            collection.data_sets().len(),
            collection.decks().len(),
            collection.reviews().len(),
            self.path.display()
        );
        Ok(collection)
    }

    pub fn save(&self, collection: &Collection) -> Result<()> {
        let save = snapshot(collection)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&save)?;
        fs::write(&self.path, content)?;
        log::info!(
            "Saved {} decks and {} statuses to {}",
            save.decks.len(),
            save.review_statuses.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn lookup<T: Copy>(
    map: &HashMap<usize, T>,
    kind: &'static str,
    num: usize,
    target: &'static str,
    target_num: usize,
) -> Result<T> {
    map.get(&target_num).copied().ok_or(StorageError::DanglingReference {
        kind,
        num,
        target,
        target_num,
    })
}

fn restore(save: SaveFile) -> Result<Collection> {
    let mut collection = Collection::new();

    let sources: HashMap<usize, &SavedDataSource> = save.data_sources.iter().map(|s| (s.num, s)).collect();

    let mut data_sets: HashMap<usize, Uuid> = HashMap::new();
    for saved in &save.data_sets {
        let source = sources.get(&saved.data_source_num).ok_or(StorageError::DanglingReference {
            kind: "data set",
            num: saved.num,
            target: "data source",
            target_num: saved.data_source_num,
        })?;
        let kind = match source.kind {
            Some(kind) => kind,
            None => SourceKind::from_path(Path::new(&source.location))
                .ok_or_else(|| DataError::UnrecognizedSource(source.location.clone()))?,
        };
        let data_set = DataSet::load(
            reopen_source(kind, &source.location, source.read_only)?,
            saved.depends_on_deck,
        )?;
        data_sets.insert(saved.num, collection.add_data_set(data_set));
    }

    let mut decks: HashMap<usize, Uuid> = HashMap::new();
    for saved in &save.decks {
        let ds_id = lookup(&data_sets, "deck", saved.num, "data set", saved.data_set_num)?;
        let data_set = collection
            .data_set(ds_id)
            .ok_or(FlashcardError::DataSetNotFound(ds_id))?;
        let deck = Deck::restore(data_set, &saved.front_field, &saved.back_field, saved.independent)?;
        decks.insert(saved.num, collection.add_deck(deck)?);
    }

    let mut reviews: HashMap<usize, Uuid> = HashMap::new();
    for saved in &save.reviews {
        let deck_id = lookup(&decks, "review", saved.num, "deck", saved.deck_num)?;
        let deck = collection.deck(deck_id).ok_or(FlashcardError::DeckNotFound(deck_id))?;
        let mut review = Review::from_scheme_name(deck, &saved.status_type, saved.review_type, saved.settings)?;
        if let Some(order) = saved.order {
            review = review.with_order(order.into_order(&saved.settings));
        }
        reviews.insert(saved.num, collection.add_review(review)?);
    }

    for saved in &save.review_statuses {
        let review_id = lookup(&reviews, "review status", saved.num, "review", saved.review_num)?;
        let deck_id = collection
            .review(review_id)
            .ok_or(FlashcardError::ReviewNotFound(review_id))?
            .deck_id();
        let saved_deck_id = lookup(&decks, "review status", saved.num, "deck", saved.deck_num)?;
        if saved_deck_id != deck_id {
            return Err(FlashcardError::DeckMismatch {
                expected: deck_id,
                found: saved_deck_id,
            }
            .into());
        }
        let card_id = collection
            .deck(deck_id)
            .and_then(|deck| deck.find_card_by_sides(&saved.front_side, &saved.back_side))
            .map(|card| card.id)
            .ok_or_else(|| FlashcardError::CardNotFound {
                front: saved.front_side.clone(),
                back: saved.back_side.clone(),
            })?;
        let last_update = parse_datetime(&saved.status_datetime).map_err(|source| StorageError::InvalidTimestamp {
            value: saved.status_datetime.clone(),
            source,
        })?;
        collection
            .review_mut(review_id)
            .ok_or(FlashcardError::ReviewNotFound(review_id))?
            .restore_status(CardReviewStatus::new(card_id, saved.status, last_update));
    }

    Ok(collection)
}

fn snapshot(collection: &Collection) -> Result<SaveFile> {
    let mut save = SaveFile::default();

    // Data sets opening a file the same way share one source entry
    let mut source_nums: HashMap<(String, SourceKind, bool), usize> = HashMap::new();
    let mut data_set_nums: HashMap<Uuid, usize> = HashMap::new();
    for (num, data_set) in collection.data_sets().iter().enumerate() {
        let source = data_set.source();
        if source.kind() == SourceKind::Memory {
            return Err(StorageError::Unpersistable(data_set.name()));
        }
        let key = (source.location(), source.kind(), source.is_read_only());
        let data_source_num = match source_nums.get(&key) {
            Some(&n) => n,
            None => {
                let n = save.data_sources.len();
                save.data_sources.push(SavedDataSource {
                    num: n,
                    kind: Some(key.1),
                    location: key.0.clone(),
                    read_only: key.2,
                });
                source_nums.insert(key, n);
                n
            }
        };
        save.data_sets.push(SavedDataSet {
            num,
            data_source_num,
            depends_on_deck: data_set.mirrors_deck(),
        });
        data_set_nums.insert(data_set.id, num);
    }

    let mut deck_nums: HashMap<Uuid, usize> = HashMap::new();
    for (num, deck) in collection.decks().iter().enumerate() {
        let data_set_num = data_set_nums
            .get(&deck.data_set_id())
            .copied()
            .ok_or(FlashcardError::DataSetNotFound(deck.data_set_id()))?;
        save.decks.push(SavedDeck {
            num,
            data_set_num,
            front_field: deck.front_field().to_string(),
            back_field: deck.back_field().to_string(),
            independent: deck.is_independent(),
        });
        deck_nums.insert(deck.id, num);
    }

    for (review_num, review) in collection.reviews().iter().enumerate() {
        if let StatusScheme::Custom(_) = review.scheme() {
            return Err(StorageError::CustomScheme(review.scheme().name().to_string()));
        }
        let deck_num = deck_nums
            .get(&review.deck_id())
            .copied()
            .ok_or(FlashcardError::DeckNotFound(review.deck_id()))?;
        let deck = &collection.decks()[deck_num];
        let settings: ReviewSettings = review.settings();
        save.reviews.push(SavedReview {
            num: review_num,
            deck_num,
            status_type: review.scheme().name().to_string(),
            review_type: review.kind(),
            order: Some(SavedOrder::from(review.order())),
            settings,
        });

        // Deck order keeps the file stable between saves
        let positions = deck.position_index();
        let mut statuses: Vec<(usize, &CardReviewStatus)> = Vec::new();
        for record in review.statuses() {
            match positions.get(&record.card_id) {
                Some(&pos) => statuses.push((pos, record)),
                None => log::warn!(
                    "Skipping status for card {} which is no longer in deck {}",
                    record.card_id,
                    deck_num
                ),
            }
        }
        statuses.sort_by_key(|(pos, _)| *pos);

        for (num, (pos, record)) in statuses.into_iter().enumerate() {
            let card = &deck.cards()[pos];
            save.review_statuses.push(SavedReviewStatus {
                num,
                review_num,
                deck_num,
                front_side: card.front.clone(),
                back_side: card.back.clone(),
                status: record.status,
                status_datetime: format_datetime(&record.last_update),
            });
        }
    }

    Ok(save)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::{CustomScheme, ReviewKind, SessionOrder};
    use chrono::{Duration, Timelike, Utc};
    use tempfile::TempDir;

    fn setup() -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capitals.csv");
        fs::write(&path, "city,country\nParis,France\nRome,Italy\nBern,Switzerland\n").unwrap();
        let location = path.to_string_lossy().to_string();
        (dir, location)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = CollectionStorage::new(dir.path().join("none.json"));
        let collection = storage.load().unwrap();
        assert!(collection.decks().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let (dir, location) = setup();
        let mut collection = Collection::new();
        let ds_id = collection.open_data_set(&location, true).unwrap();
        let deck_id = collection.create_deck(ds_id, "city", "country").unwrap();
        let settings = ReviewSettings {
            days_per_status: 2,
            max_status: Some(6),
            ..ReviewSettings::default()
        };
        let review_id = collection
            .find_or_create_review(deck_id, ReviewKind::Input, "leitner", settings)
            .unwrap();

        let when = (Utc::now() - Duration::days(3)).with_nanosecond(0).unwrap();
        let rome = collection.deck(deck_id).unwrap().find_card_by_sides("Rome", "Italy").unwrap().id;
        collection.review_mut(review_id).unwrap().record_outcome(rome, true, when);

        let storage = CollectionStorage::new(dir.path().join("save").join("collection.json"));
        storage.save(&collection).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded.data_sets().len(), 1);
        assert_eq!(loaded.decks().len(), 1);
        let deck = &loaded.decks()[0];
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.front_field(), "city");

        let review = &loaded.reviews()[0];
        assert_eq!(review.kind(), ReviewKind::Input);
        assert_eq!(review.scheme().name(), "leitner");
        assert_eq!(review.settings().days_per_status, 2);
        assert_eq!(review.settings().max_status, Some(6));

        let rome = deck.find_card_by_sides("Rome", "Italy").unwrap().id;
        let status = review.status_of(rome).unwrap();
        assert_eq!(status.status, 2);
        assert_eq!(status.last_update, when);
    }

    #[test]
    fn test_save_file_keys() {
        let (dir, location) = setup();
        let mut collection = Collection::new();
        let ds_id = collection.open_data_set(&location, false).unwrap();
        let deck_id = collection.create_deck(ds_id, "city", "country").unwrap();
        let review_id = collection
            .find_or_create_review(deck_id, ReviewKind::MultipleChoice, "streak", ReviewSettings::default())
            .unwrap();
        let paris = collection.deck(deck_id).unwrap().cards()[0].id;
        collection.review_mut(review_id).unwrap().record_outcome(paris, false, Utc::now());

        let path = dir.path().join("collection.json");
        CollectionStorage::new(path.clone()).save(&collection).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(json["data_sources"][0]["read_only"], false);
        assert_eq!(json["data_sets"][0]["depends_on_deck"], false);
        assert_eq!(json["decks"][0]["static"], false);
        assert_eq!(json["reviews"][0]["status_type"], "streak");
        assert_eq!(json["reviews"][0]["review_type"], "multiple_choice");
        assert_eq!(json["review_statuses"][0]["front_side"], "Paris");
        assert_eq!(json["review_statuses"][0]["status"], 1);
    }

    #[test]
    fn test_missing_card_fails_load() {
        let (dir, location) = setup();
        let mut collection = Collection::new();
        let ds_id = collection.open_data_set(&location, true).unwrap();
        let deck_id = collection.create_deck(ds_id, "city", "country").unwrap();
        let review_id = collection
            .find_or_create_review(deck_id, ReviewKind::Input, "leitner", ReviewSettings::default())
            .unwrap();
        let bern = collection.deck(deck_id).unwrap().cards()[2].id;
        collection.review_mut(review_id).unwrap().record_outcome(bern, true, Utc::now());

        let storage = CollectionStorage::new(dir.path().join("collection.json"));
        storage.save(&collection).unwrap();

        // The source changes behind the save file's back
        fs::write(&location, "city,country\nParis,France\nRome,Italy\n").unwrap();
        assert!(matches!(
            storage.load(),
            Err(StorageError::Flashcard(FlashcardError::CardNotFound { .. }))
        ));
    }

    #[test]
    fn test_independent_deck_round_trip() {
        let dir = TempDir::new().unwrap();
        let location = dir.path().join("vocab.tsv").to_string_lossy().to_string();
        let mut collection = Collection::new();
        let deck_id = collection.create_independent_deck(&location, "word", "meaning").unwrap();
        collection.add_card(deck_id, "chat", "cat").unwrap();
        collection.add_card(deck_id, "chien", "dog").unwrap();

        let storage = CollectionStorage::new(dir.path().join("collection.json"));
        storage.save(&collection).unwrap();
        let loaded = storage.load().unwrap();

        let deck = &loaded.decks()[0];
        assert!(deck.is_independent());
        assert_eq!(deck.len(), 2);
        assert!(loaded.data_sets()[0].mirrors_deck());
    }

    #[test]
    fn test_orphan_statuses_are_not_saved() {
        let dir = TempDir::new().unwrap();
        let location = dir.path().join("vocab.csv").to_string_lossy().to_string();
        let mut collection = Collection::new();
        let deck_id = collection.create_independent_deck(&location, "word", "meaning").unwrap();
        let chat = collection.add_card(deck_id, "chat", "cat").unwrap().unwrap();
        collection.add_card(deck_id, "chien", "dog").unwrap();
        let review_id = collection
            .find_or_create_review(deck_id, ReviewKind::Input, "leitner", ReviewSettings::default())
            .unwrap();
        collection.review_mut(review_id).unwrap().record_outcome(chat, true, Utc::now());
        collection.remove_card(deck_id, chat).unwrap();

        let storage = CollectionStorage::new(dir.path().join("collection.json"));
        storage.save(&collection).unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.reviews()[0].num_statuses(), 0);
    }

    #[test]
    fn test_dangling_reference() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collection.json");
        fs::write(
            &path,
            r#"{"data_sources": [], "data_sets": [{"num": 0, "data_source_num": 3, "depends_on_deck": false}]}"#,
        )
        .unwrap();
        assert!(matches!(
            CollectionStorage::new(path).load(),
            Err(StorageError::DanglingReference { target_num: 3, .. })
        ));
    }

    #[test]
    fn test_custom_scheme_review_is_refused() {
        let (dir, location) = setup();
        let mut collection = Collection::new();
        let ds_id = collection.open_data_set(&location, true).unwrap();
        let deck_id = collection.create_deck(ds_id, "city", "country").unwrap();
        let scheme = StatusScheme::Custom(CustomScheme::new(
            "doubling",
            1,
            |status, success| if success { status * 2 } else { 1 },
            |_, _, _| true,
        ));
        let review = Review::new(collection.deck(deck_id).unwrap(), scheme, ReviewKind::Input);
        collection.add_review(review).unwrap();

        let path = dir.path().join("collection.json");
        let storage = CollectionStorage::new(path.clone());
        assert!(matches!(
            storage.save(&collection),
            Err(StorageError::CustomScheme(name)) if name == "doubling"
        ));
        assert!(!path.exists());
        assert!(storage.load().unwrap().reviews().is_empty());
    }

    #[test]
    fn test_read_only_flag_kept_per_data_set() {
        let (dir, location) = setup();
        let mut collection = Collection::new();
        collection.open_data_set(&location, false).unwrap();
        collection.open_data_set(&location, true).unwrap();
        collection.open_data_set(&location, true).unwrap();

        let path = dir.path().join("collection.json");
        let storage = CollectionStorage::new(path.clone());
        storage.save(&collection).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["data_sources"].as_array().unwrap().len(), 2);

        let loaded = storage.load().unwrap();
        let read_only: Vec<bool> = loaded
            .data_sets()
            .iter()
            .map(|ds| ds.source().is_read_only())
            .collect();
        assert_eq!(read_only, vec![false, true, true]);
    }

    #[test]
    fn test_session_order_round_trip() {
        let (dir, location) = setup();
        let mut collection = Collection::new();
        let ds_id = collection.open_data_set(&location, true).unwrap();
        let deck_id = collection.create_deck(ds_id, "city", "country").unwrap();
        let review = Review::leitner(collection.deck(deck_id).unwrap(), ReviewKind::Input, ReviewSettings::default())
            .with_order(SessionOrder::WholeDeck);
        collection.add_review(review).unwrap();
        let settings = ReviewSettings {
            new_cards_per_session: 2,
            ..ReviewSettings::default()
        };
        collection
            .find_or_create_review(deck_id, ReviewKind::Simple, "streak", settings)
            .unwrap();

        let storage = CollectionStorage::new(dir.path().join("collection.json"));
        storage.save(&collection).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded.reviews()[0].order(), SessionOrder::WholeDeck);
        assert_eq!(
            loaded.reviews()[1].order(),
            SessionOrder::DueThenNew { new_cards_per_session: 2 }
        );
    }

    #[test]
    fn test_status_deck_must_match_its_review() {
        let (dir, location) = setup();
        let mut collection = Collection::new();
        let ds_id = collection.open_data_set(&location, true).unwrap();
        let deck_id = collection.create_deck(ds_id, "city", "country").unwrap();
        collection.create_deck(ds_id, "country", "city").unwrap();
        let review_id = collection
            .find_or_create_review(deck_id, ReviewKind::Input, "leitner", ReviewSettings::default())
            .unwrap();
        let paris = collection.deck(deck_id).unwrap().cards()[0].id;
        collection.review_mut(review_id).unwrap().record_outcome(paris, true, Utc::now());

        let path = dir.path().join("collection.json");
        let storage = CollectionStorage::new(path.clone());
        storage.save(&collection).unwrap();

        let mut json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["review_statuses"][0]["deck_num"] = serde_json::json!(1);
        fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        assert!(matches!(
            storage.load(),
            Err(StorageError::Flashcard(FlashcardError::DeckMismatch { .. }))
        ));
    }
}
