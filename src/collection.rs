//! Application state: every data set, deck and review the user has.
//!
//! Decks refer to their data set and reviews to their deck by id. Removing a
//! parent removes its children.

use uuid::Uuid;

use crate::data::{open_source, DataSet};
use crate::flashcards::{
    Card, Deck, FlashcardError, RefreshSummary, Result, Review, ReviewKind, ReviewSettings,
};

#[derive(Debug, Default)]
pub struct Collection {
    data_sets: Vec<DataSet>,
    decks: Vec<Deck>,
    reviews: Vec<Review>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_sets(&self) -> &[DataSet] {
        &self.data_sets
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn data_set(&self, id: Uuid) -> Option<&DataSet> {
        self.data_sets.iter().find(|ds| ds.id == id)
    }

    pub fn deck(&self, id: Uuid) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == id)
    }

    pub fn deck_mut(&mut self, id: Uuid) -> Option<&mut Deck> {
        self.decks.iter_mut().find(|d| d.id == id)
    }

    pub fn review(&self, id: Uuid) -> Option<&Review> {
        self.reviews.iter().find(|r| r.id == id)
    }

    pub fn review_mut(&mut self, id: Uuid) -> Option<&mut Review> {
        self.reviews.iter_mut().find(|r| r.id == id)
    }

    /// Display name of a deck, e.g. `countries.csv (city/country)`
    pub fn deck_name(&self, deck_id: Uuid) -> Option<String> {
        let deck = self.deck(deck_id)?;
        let data_set = self.data_set(deck.data_set_id())?;
        Some(deck.name(data_set))
    }

    // ==================== Data Sets ====================

    pub fn add_data_set(&mut self, data_set: DataSet) -> Uuid {
        let id = data_set.id;
        self.data_sets.push(data_set);
        id
    }

    /// Open a CSV/TSV file and load it as a new data set
    pub fn open_data_set(&mut self, location: &str, read_only: bool) -> Result<Uuid> {
        let source = open_source(location, read_only)?;
        let data_set = DataSet::load(source, false)?;
        Ok(self.add_data_set(data_set))
    }

    /// Remove a data set with every deck built on it
    pub fn remove_data_set(&mut self, id: Uuid) -> Result<DataSet> {
        let pos = self
            .data_sets
            .iter()
            .position(|ds| ds.id == id)
            .ok_or(FlashcardError::DataSetNotFound(id))?;

        let child_decks: Vec<Uuid> = self
            .decks
            .iter()
            .filter(|d| d.data_set_id() == id)
            .map(|d| d.id)
            .collect();
        for deck_id in &child_decks {
            self.drop_deck(*deck_id);
        }

        let data_set = self.data_sets.remove(pos);
        log::info!(
            "Removed data set {} and {} decks",
            data_set.name(),
            child_decks.len()
        );
        Ok(data_set)
    }

    /// Re-pull a data set and refresh the decks built on it
    pub fn refresh_data_set(&mut self, id: Uuid) -> Result<RefreshSummary> {
        let data_set = self
            .data_sets
            .iter_mut()
            .find(|ds| ds.id == id)
            .ok_or(FlashcardError::DataSetNotFound(id))?;
        data_set.reload()?;

        let mut summary = RefreshSummary::default();
        for deck in self.decks.iter_mut().filter(|d| d.data_set_id() == id) {
            summary.merge(deck.refresh(data_set)?);
        }
        Ok(summary)
    }

    // ==================== Decks ====================

    pub fn add_deck(&mut self, deck: Deck) -> Result<Uuid> {
        if self.data_set(deck.data_set_id()).is_none() {
            return Err(FlashcardError::DataSetNotFound(deck.data_set_id()));
        }
        let id = deck.id;
        self.decks.push(deck);
        Ok(id)
    }

    /// Build a deck over two fields of an existing data set
    pub fn create_deck(&mut self, data_set_id: Uuid, front_field: &str, back_field: &str) -> Result<Uuid> {
        let data_set = self
            .data_set(data_set_id)
            .ok_or(FlashcardError::DataSetNotFound(data_set_id))?;
        let deck = Deck::new(data_set, front_field, back_field)?;
        log::info!("Created deck {} with {} cards", deck.name(data_set), deck.len());
        self.add_deck(deck)
    }

    /// Create an empty independent deck written through to `location`.
    ///
    /// The file is created (or overwritten) right away with just the header.
    pub fn create_independent_deck(&mut self, location: &str, front_field: &str, back_field: &str) -> Result<Uuid> {
        let source = open_source(location, false)?;
        let mut data_set = DataSet::mirror(source);
        let deck = Deck::independent(&data_set, front_field, back_field);
        data_set.push(deck.to_table()?)?;

        log::info!("Created independent deck {}", deck.name(&data_set));
        self.add_data_set(data_set);
        self.add_deck(deck)
    }

    /// Remove a deck with its reviews.
    ///
    /// An independent deck also takes its mirror data set with it.
    pub fn remove_deck(&mut self, id: Uuid) -> Result<Deck> {
        let deck = self.drop_deck(id).ok_or(FlashcardError::DeckNotFound(id))?;
        if deck.is_independent() && !self.decks.iter().any(|d| d.data_set_id() == deck.data_set_id()) {
            self.data_sets.retain(|ds| ds.id != deck.data_set_id());
        }
        Ok(deck)
    }

    fn drop_deck(&mut self, id: Uuid) -> Option<Deck> {
        let pos = self.decks.iter().position(|d| d.id == id)?;
        let before = self.reviews.len();
        self.reviews.retain(|r| r.deck_id() != id);
        let dropped = before - self.reviews.len();
        if dropped > 0 {
            log::debug!("Dropped {} reviews with deck {}", dropped, id);
        }
        Some(self.decks.remove(pos))
    }

    // ==================== Cards ====================

    /// Add a card to an independent deck and write the deck out.
    ///
    /// Returns `None` when the deck already has the card or filters it out.
    pub fn add_card(&mut self, deck_id: Uuid, front: &str, back: &str) -> Result<Option<Uuid>> {
        let deck = self.independent_deck_mut(deck_id)?;
        let added = deck.add_card(front.to_string(), back.to_string());
        if added.is_some() {
            self.sync_independent(deck_id)?;
        }
        Ok(added)
    }

    /// Remove a card from an independent deck and write the deck out
    pub fn remove_card(&mut self, deck_id: Uuid, card_id: Uuid) -> Result<Option<Card>> {
        let deck = self.independent_deck_mut(deck_id)?;
        let removed = deck.remove_card(card_id);
        if removed.is_some() {
            self.sync_independent(deck_id)?;
        }
        Ok(removed)
    }

    fn independent_deck_mut(&mut self, deck_id: Uuid) -> Result<&mut Deck> {
        let deck = self.deck_mut(deck_id).ok_or(FlashcardError::DeckNotFound(deck_id))?;
        if !deck.is_independent() {
            return Err(FlashcardError::NotIndependent(deck_id));
        }
        Ok(deck)
    }

    fn sync_independent(&mut self, deck_id: Uuid) -> Result<()> {
        let deck = self
            .decks
            .iter()
            .find(|d| d.id == deck_id)
            .ok_or(FlashcardError::DeckNotFound(deck_id))?;
        let data_set = self
            .data_sets
            .iter_mut()
            .find(|ds| ds.id == deck.data_set_id())
            .ok_or(FlashcardError::DataSetNotFound(deck.data_set_id()))?;
        data_set.push(deck.to_table()?)?;
        log::debug!("Wrote {} cards to {}", deck.len(), data_set.location());
        Ok(())
    }

    // ==================== Reviews ====================

    pub fn add_review(&mut self, review: Review) -> Result<Uuid> {
        if self.deck(review.deck_id()).is_none() {
            return Err(FlashcardError::DeckNotFound(review.deck_id()));
        }
        let id = review.id;
        self.reviews.push(review);
        Ok(id)
    }

    pub fn remove_review(&mut self, id: Uuid) -> Result<Review> {
        let pos = self
            .reviews
            .iter()
            .position(|r| r.id == id)
            .ok_or(FlashcardError::ReviewNotFound(id))?;
        Ok(self.reviews.remove(pos))
    }

    pub fn reviews_for_deck(&self, deck_id: Uuid) -> impl Iterator<Item = &Review> {
        self.reviews.iter().filter(move |r| r.deck_id() == deck_id)
    }

    /// First review of `deck_id` with the given modality and scheme name
    pub fn find_review(&self, deck_id: Uuid, kind: ReviewKind, scheme_name: &str) -> Option<&Review> {
        self.reviews_for_deck(deck_id)
            .find(|r| r.kind() == kind && r.scheme().name().eq_ignore_ascii_case(scheme_name))
    }

    /// Reuse a matching review or start a new one
    pub fn find_or_create_review(
        &mut self,
        deck_id: Uuid,
        kind: ReviewKind,
        scheme_name: &str,
        settings: ReviewSettings,
    ) -> Result<Uuid> {
        if let Some(review) = self.find_review(deck_id, kind, scheme_name) {
            return Ok(review.id);
        }
        let deck = self.deck(deck_id).ok_or(FlashcardError::DeckNotFound(deck_id))?;
        let review = Review::from_scheme_name(deck, scheme_name, kind, settings)?;
        log::info!("Started {} {} review", review.scheme().name(), kind);
        self.add_review(review)
    }

    /// A review together with its deck, ready for a session
    pub fn review_with_deck(&mut self, review_id: Uuid) -> Result<(&mut Review, &Deck)> {
        let review = self
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or(FlashcardError::ReviewNotFound(review_id))?;
        let deck = self
            .decks
            .iter()
            .find(|d| d.id == review.deck_id())
            .ok_or(FlashcardError::DeckNotFound(review.deck_id()))?;
        Ok((review, deck))
    }
}
