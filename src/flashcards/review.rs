//! Reviews: one deck studied under one status scheme and one modality
//!
//! A review owns the status of every card it has seen. Cards without a
//! status are unreviewed. Statuses are keyed by card id; the deck's
//! position index maps them back to deck order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use super::algorithm::{ReviewSettings, StatusScheme};
use super::deck::Deck;
use super::errors::{FlashcardError, Result};
use super::models::{CardReviewStatus, ReviewKind, ReviewStats, Status};
use super::session::ReviewSession;

/// Which deck positions a new session walks through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrder {
    /// Every card, shuffled
    WholeDeckShuffled,
    /// Every card, in deck order
    WholeDeck,
    /// Due cards (shuffled) followed by the first unreviewed cards in deck order
    DueThenNew { new_cards_per_session: usize },
}

#[derive(Debug, Clone)]
pub struct Review {
    pub id: Uuid,
    deck_id: Uuid,
    kind: ReviewKind,
    scheme: StatusScheme,
    order: SessionOrder,
    max_cards_per_session: usize,
    statuses: HashMap<Uuid, CardReviewStatus>,
}

impl Review {
    /// Review over the whole deck in random order
    pub fn new(deck: &Deck, scheme: StatusScheme, kind: ReviewKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id: deck.id,
            kind,
            scheme,
            order: SessionOrder::WholeDeckShuffled,
            max_cards_per_session: ReviewSettings::default().max_cards_per_session,
            statuses: HashMap::new(),
        }
    }

    /// Leitner review: due cards first, then a few new ones
    pub fn leitner(deck: &Deck, kind: ReviewKind, settings: ReviewSettings) -> Self {
        Self::scheduled(deck, StatusScheme::Leitner(settings), kind, settings)
    }

    /// Streak review: due cards first, then a few new ones
    pub fn streak(deck: &Deck, kind: ReviewKind, settings: ReviewSettings) -> Self {
        Self::scheduled(deck, StatusScheme::Streak(settings), kind, settings)
    }

    fn scheduled(deck: &Deck, scheme: StatusScheme, kind: ReviewKind, settings: ReviewSettings) -> Self {
        Self::new(deck, scheme, kind)
            .with_order(SessionOrder::DueThenNew {
                new_cards_per_session: settings.new_cards_per_session,
            })
            .with_max_cards(settings.max_cards_per_session)
    }

    /// Build a review from a scheme name (`default`, `leitner`, `streak`)
    pub fn from_scheme_name(deck: &Deck, scheme_name: &str, kind: ReviewKind, settings: ReviewSettings) -> Result<Self> {
        let review = match StatusScheme::from_name(scheme_name, settings)? {
            StatusScheme::Leitner(_) => Self::leitner(deck, kind, settings),
            StatusScheme::Streak(_) => Self::streak(deck, kind, settings),
            scheme => Self::new(deck, scheme, kind).with_max_cards(settings.max_cards_per_session),
        };
        Ok(review)
    }

    pub fn with_order(mut self, order: SessionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_max_cards(mut self, max_cards_per_session: usize) -> Self {
        self.max_cards_per_session = max_cards_per_session;
        self
    }

    pub fn deck_id(&self) -> Uuid {
        self.deck_id
    }

    pub fn kind(&self) -> ReviewKind {
        self.kind
    }

    pub fn scheme(&self) -> &StatusScheme {
        &self.scheme
    }

    pub fn order(&self) -> SessionOrder {
        self.order
    }

    pub fn max_cards_per_session(&self) -> usize {
        self.max_cards_per_session
    }

    /// Effective settings, for saving
    pub fn settings(&self) -> ReviewSettings {
        let mut settings = self.scheme.settings().copied().unwrap_or_default();
        settings.max_cards_per_session = self.max_cards_per_session;
        if let SessionOrder::DueThenNew { new_cards_per_session } = self.order {
            settings.new_cards_per_session = new_cards_per_session;
        }
        settings
    }

    // ==================== Status Records ====================

    pub fn status_of(&self, card_id: Uuid) -> Option<&CardReviewStatus> {
        self.statuses.get(&card_id)
    }

    pub fn statuses(&self) -> impl Iterator<Item = &CardReviewStatus> {
        self.statuses.values()
    }

    pub fn num_statuses(&self) -> usize {
        self.statuses.len()
    }

    /// Apply an answer to a card.
    ///
    /// A card seen for the first time starts at the scheme's default status;
    /// either way exactly one transition is applied.
    pub fn record_outcome(&mut self, card_id: Uuid, success: bool, now: DateTime<Utc>) -> &CardReviewStatus {
        let default_status = self.scheme.default_status();
        let scheme = &self.scheme;
        let entry = self
            .statuses
            .entry(card_id)
            .or_insert_with(|| CardReviewStatus::new(card_id, default_status, now));
        let previous = entry.status;
        entry.status = scheme.transform(previous, success);
        entry.last_update = now;
        log::debug!(
            "Card {} {} under {}: {} -> {}",
            card_id,
            if success { "passed" } else { "failed" },
            scheme.name(),
            previous,
            entry.status
        );
        entry
    }

    /// Overwrite a card's status directly
    pub fn set_status(&mut self, card_id: Uuid, status: Status, now: DateTime<Utc>) -> &CardReviewStatus {
        let record = CardReviewStatus::new(card_id, status, now);
        self.statuses.insert(card_id, record);
        &self.statuses[&card_id]
    }

    /// Put back a saved status record
    pub fn restore_status(&mut self, record: CardReviewStatus) {
        self.statuses.insert(record.card_id, record);
    }

    /// Drop statuses whose card is no longer in the deck
    pub fn retire_orphans(&mut self, deck: &Deck) -> usize {
        let before = self.statuses.len();
        self.statuses.retain(|card_id, _| deck.position(*card_id).is_some());
        let retired = before - self.statuses.len();
        if retired > 0 {
            log::info!("Retired {} statuses for cards no longer in the deck", retired);
        }
        retired
    }

    // ==================== Card Selection ====================

    /// Deck positions of reviewed cards that are due at `now`, in deck order
    pub fn due_indices(&self, deck: &Deck, now: DateTime<Utc>) -> Vec<usize> {
        let positions = deck.position_index();
        let mut indices: Vec<usize> = self
            .statuses
            .values()
            .filter(|s| self.scheme.is_due_at(s.status, s.last_update, now))
            .filter_map(|s| positions.get(&s.card_id).copied())
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Deck positions of cards with a status, in deck order
    pub fn reviewed_indices(&self, deck: &Deck) -> Vec<usize> {
        deck.cards()
            .iter()
            .enumerate()
            .filter(|(_, card)| self.statuses.contains_key(&card.id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Deck positions of cards without a status, in deck order
    pub fn unreviewed_indices(&self, deck: &Deck) -> Vec<usize> {
        deck.cards()
            .iter()
            .enumerate()
            .filter(|(_, card)| !self.statuses.contains_key(&card.id))
            .map(|(i, _)| i)
            .collect()
    }

    /// The first `n` unreviewed positions, in deck order
    pub fn n_new_indices(&self, deck: &Deck, n: usize) -> Vec<usize> {
        let mut indices = self.unreviewed_indices(deck);
        indices.truncate(n);
        indices
    }

    /// Index sequence for a new session
    pub fn session_indices(&self, deck: &Deck, now: DateTime<Utc>) -> Vec<usize> {
        self.session_indices_with(deck, now, &mut rand::thread_rng())
    }

    pub fn session_indices_with<R: Rng + ?Sized>(&self, deck: &Deck, now: DateTime<Utc>, rng: &mut R) -> Vec<usize> {
        match self.order {
            SessionOrder::WholeDeck => (0..deck.len()).collect(),
            SessionOrder::WholeDeckShuffled => {
                let mut indices: Vec<usize> = (0..deck.len()).collect();
                indices.shuffle(rng);
                indices
            }
            SessionOrder::DueThenNew { new_cards_per_session } => {
                let mut indices = self.due_indices(deck, now);
                indices.shuffle(rng);
                indices.extend(self.n_new_indices(deck, new_cards_per_session));
                indices
            }
        }
    }

    /// Start a sitting over `deck`
    pub fn start_session<'a>(&'a mut self, deck: &'a Deck, num_options: usize) -> Result<ReviewSession<'a>> {
        self.start_session_with(deck, num_options, &mut rand::thread_rng())
    }

    pub fn start_session_with<'a, R: Rng + ?Sized>(
        &'a mut self,
        deck: &'a Deck,
        num_options: usize,
        rng: &mut R,
    ) -> Result<ReviewSession<'a>> {
        if deck.id != self.deck_id {
            return Err(FlashcardError::DeckMismatch {
                expected: self.deck_id,
                found: deck.id,
            });
        }
        let indices = self.session_indices_with(deck, Utc::now(), rng);
        log::info!(
            "Starting {} session over {} cards (cap {})",
            self.kind,
            indices.len(),
            self.max_cards_per_session
        );
        ReviewSession::new(self, deck, indices, num_options)
    }

    pub fn stats(&self, deck: &Deck, now: DateTime<Utc>) -> ReviewStats {
        let mut stats = ReviewStats {
            total_cards: deck.len(),
            ..ReviewStats::default()
        };

        for card in deck.cards() {
            match self.statuses.get(&card.id) {
                Some(record) => {
                    stats.reviewed_cards += 1;
                    *stats.by_status.entry(record.status).or_insert(0) += 1;
                    if self.scheme.is_due_at(record.status, record.last_update, now) {
                        stats.due_cards += 1;
                    }
                }
                None => stats.unreviewed_cards += 1,
            }
        }

        stats
    }
}
