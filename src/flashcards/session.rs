//! One sitting over a review
//!
//! A session walks a fixed sequence of deck positions, at most
//! `max_cards_per_session` of them. It borrows its review mutably, so only
//! one session can write statuses at a time.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use super::deck::Deck;
use super::errors::{FlashcardError, Result};
use super::models::{Card, ReviewKind, Side, Status};
use super::review::Review;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No card drawn yet
    Ready,
    Active,
    /// Cap reached, sequence consumed or deactivated; terminal
    Exhausted,
}

#[derive(Debug)]
enum Modality {
    Simple,
    MultipleChoice {
        num_options: usize,
        /// Distinct rendered backs of the deck
        pool: Vec<String>,
        current: Vec<String>,
    },
    Input,
}

#[derive(Debug)]
pub struct ReviewSession<'a> {
    review: &'a mut Review,
    deck: &'a Deck,
    indices: Vec<usize>,
    cursor: Option<usize>,
    max_cards: usize,
    state: SessionState,
    modality: Modality,
}

impl<'a> ReviewSession<'a> {
    pub fn new(review: &'a mut Review, deck: &'a Deck, indices: Vec<usize>, num_options: usize) -> Result<Self> {
        if deck.id != review.deck_id() {
            return Err(FlashcardError::DeckMismatch {
                expected: review.deck_id(),
                found: deck.id,
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= deck.len()) {
            return Err(FlashcardError::IndexOutOfRange {
                index,
                len: deck.len(),
            });
        }

        let modality = match review.kind() {
            ReviewKind::Simple => Modality::Simple,
            ReviewKind::Input => Modality::Input,
            ReviewKind::MultipleChoice => {
                if num_options < 2 {
                    return Err(FlashcardError::TooFewOptions(num_options));
                }
                Modality::MultipleChoice {
                    num_options,
                    pool: deck.rendered_values(Side::Back),
                    current: Vec::new(),
                }
            }
        };

        Ok(Self {
            max_cards: review.max_cards_per_session(),
            review,
            deck,
            indices,
            cursor: None,
            state: SessionState::Ready,
            modality,
        })
    }

    /// Move to the next card.
    ///
    /// Returns `None` once the cap or the end of the sequence is reached, or
    /// after `deactivate`, and on every call after that.
    pub fn advance(&mut self) -> Option<&'a Card> {
        if self.state == SessionState::Exhausted {
            return None;
        }
        let next = self.cursor.map_or(0, |c| c + 1);
        if next >= self.max_cards || next >= self.indices.len() {
            self.deactivate();
            return None;
        }

        let deck = self.deck;
        let Some(card) = deck.card(self.indices[next]) else {
            self.deactivate();
            return None;
        };
        self.cursor = Some(next);
        self.state = SessionState::Active;
        if let Modality::MultipleChoice { current, .. } = &mut self.modality {
            current.clear();
        }
        Some(card)
    }

    pub fn deactivate(&mut self) {
        if self.state != SessionState::Exhausted {
            log::debug!("Session ended after {} cards", self.cursor.map_or(0, |c| c + 1));
        }
        self.state = SessionState::Exhausted;
    }

    pub fn current(&self) -> Result<&'a Card> {
        if self.state != SessionState::Active {
            return Err(FlashcardError::NoCurrentCard);
        }
        let deck = self.deck;
        self.cursor
            .and_then(|c| self.indices.get(c))
            .and_then(|&i| deck.card(i))
            .ok_or(FlashcardError::NoCurrentCard)
    }

    pub fn current_front(&self) -> Result<String> {
        Ok(self.deck.render_front(self.current()?))
    }

    pub fn current_back(&self) -> Result<String> {
        Ok(self.deck.render_back(self.current()?))
    }

    /// The answer `submit` compares against
    pub fn correct_answer(&self) -> Result<String> {
        self.current_back()
    }

    /// Status of the current card, `None` if it was never reviewed
    pub fn current_status(&self) -> Result<Option<Status>> {
        let card = self.current()?;
        Ok(self.review.status_of(card.id).map(|s| s.status))
    }

    // ==================== Multiple Choice ====================

    /// Draw answer options for the current card
    pub fn generate_options(&mut self) -> Result<&[String]> {
        self.generate_options_with(&mut rand::thread_rng())
    }

    /// Correct answer plus up to `num_options - 1` distinct distractors,
    /// shuffled. Fewer options come back when the deck has fewer distinct
    /// back values.
    pub fn generate_options_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&[String]> {
        let found = self.kind();
        let correct = self.correct_answer()?;
        let Modality::MultipleChoice {
            num_options,
            pool,
            current,
        } = &mut self.modality
        else {
            return Err(FlashcardError::WrongReviewKind {
                expected: ReviewKind::MultipleChoice,
                found,
            });
        };

        let candidates: Vec<&String> = pool.iter().filter(|v| **v != correct).collect();
        let mut options: Vec<String> = candidates
            .choose_multiple(rng, *num_options - 1)
            .map(|v| (*v).clone())
            .collect();
        options.push(correct);
        options.shuffle(rng);

        *current = options;
        Ok(current.as_slice())
    }

    /// Options drawn for the current card, empty until generated
    pub fn options(&self) -> &[String] {
        match &self.modality {
            Modality::MultipleChoice { current, .. } => current,
            _ => &[],
        }
    }

    // ==================== Answers ====================

    pub fn submit(&mut self, answer: &str) -> Result<bool> {
        self.submit_at(answer, Utc::now())
    }

    /// Grade an answer for the current card.
    ///
    /// Simple sessions accept anything and leave statuses alone. Graded
    /// sessions apply exactly one status transition.
    pub fn submit_at(&mut self, answer: &str, now: DateTime<Utc>) -> Result<bool> {
        let card = self.current()?;
        let expected = self.deck.render_back(card);
        let correct = match self.modality {
            Modality::Simple => return Ok(true),
            Modality::MultipleChoice { .. } => answer == expected,
            Modality::Input => normalize_answer(answer) == normalize_answer(&expected),
        };
        self.review.record_outcome(card.id, correct, now);
        Ok(correct)
    }

    /// Overwrite the current card's status
    pub fn set_current_status(&mut self, status: Status) -> Result<()> {
        let card = self.current()?;
        self.review.set_status(card.id, status, Utc::now());
        Ok(())
    }

    // ==================== Progress ====================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn kind(&self) -> ReviewKind {
        self.review.kind()
    }

    /// Zero-based position of the current card within the session
    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of cards this session yields in total
    pub fn len(&self) -> usize {
        self.indices.len().min(self.max_cards)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cards still to come after the current one
    pub fn remaining(&self) -> usize {
        if self.state == SessionState::Exhausted {
            return 0;
        }
        let seen = self.cursor.map_or(0, |c| c + 1);
        self.len().saturating_sub(seen)
    }
}

/// Lowercase and drop whitespace, periods and commas
pub fn normalize_answer(answer: &str) -> String {
    answer
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != ',')
        .flat_map(char::to_lowercase)
        .collect()
}
