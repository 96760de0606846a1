//! Decks: ordered cards materialized from a data set
//!
//! A regular deck pulls from its data set: two fields are zipped row-wise
//! into (front, back) pairs. An independent deck owns its cards instead and
//! its data set mirrors them back to the source.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::errors::Result;
use super::models::{Card, Side};
use crate::data::{DataError, DataSet, Table};

pub type RenderFn = Arc<dyn Fn(&str) -> String + Send + Sync>;
pub type FilterFn = Arc<dyn Fn(&Card) -> bool + Send + Sync>;

/// Turns raw card values into what the user sees
#[derive(Clone)]
pub struct CardDisplay {
    front: RenderFn,
    back: RenderFn,
}

impl CardDisplay {
    pub fn new<F, B>(front: F, back: B) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
        B: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            front: Arc::new(front),
            back: Arc::new(back),
        }
    }

    pub fn render_front(&self, value: &str) -> String {
        (self.front)(value)
    }

    pub fn render_back(&self, value: &str) -> String {
        (self.back)(value)
    }
}

impl Default for CardDisplay {
    fn default() -> Self {
        Self::new(|v| v.to_string(), |v| v.to_string())
    }
}

impl fmt::Debug for CardDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CardDisplay")
    }
}

/// What a refresh changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub added: usize,
    pub updated: usize,
    pub dropped: usize,
}

impl RefreshSummary {
    pub fn merge(&mut self, other: RefreshSummary) {
        self.added += other.added;
        self.updated += other.updated;
        self.dropped += other.dropped;
    }
}

#[derive(Clone)]
pub struct Deck {
    pub id: Uuid,
    data_set_id: Uuid,
    front_field: String,
    back_field: String,
    independent: bool,
    cards: Vec<Card>,
    display: CardDisplay,
    filter: Option<FilterFn>,
}

impl fmt::Debug for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deck")
            .field("id", &self.id)
            .field("data_set_id", &self.data_set_id)
            .field("front_field", &self.front_field)
            .field("back_field", &self.back_field)
            .field("independent", &self.independent)
            .field("cards", &self.cards.len())
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

impl Deck {
    /// Create a deck over two fields of a data set and materialize its cards
    pub fn new(data_set: &DataSet, front_field: impl Into<String>, back_field: impl Into<String>) -> Result<Self> {
        Self::restore(data_set, front_field, back_field, false)
    }

    /// Create an empty independent deck; cards are added by hand
    pub fn independent(data_set: &DataSet, front_field: impl Into<String>, back_field: impl Into<String>) -> Self {
        Self::bare(data_set.id, front_field.into(), back_field.into(), true)
    }

    /// Rebuild a deck from saved configuration.
    ///
    /// Both regular and independent decks materialize from the data set's
    /// current table here.
    pub fn restore(
        data_set: &DataSet,
        front_field: impl Into<String>,
        back_field: impl Into<String>,
        independent: bool,
    ) -> Result<Self> {
        let mut deck = Self::bare(data_set.id, front_field.into(), back_field.into(), independent);
        deck.materialize(data_set.table())?;
        Ok(deck)
    }

    fn bare(data_set_id: Uuid, front_field: String, back_field: String, independent: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            data_set_id,
            front_field,
            back_field,
            independent,
            cards: Vec::new(),
            display: CardDisplay::default(),
            filter: None,
        }
    }

    /// Restrict the deck to cards passing `filter`; current cards are re-checked
    pub fn set_filter<F>(&mut self, filter: F)
    where
        F: Fn(&Card) -> bool + Send + Sync + 'static,
    {
        let filter: FilterFn = Arc::new(filter);
        self.cards.retain(|card| filter(card));
        self.filter = Some(filter);
    }

    pub fn set_display(&mut self, display: CardDisplay) {
        self.display = display;
    }

    fn passes_filter(&self, card: &Card) -> bool {
        self.filter.as_ref().map_or(true, |f| f(card))
    }

    /// Pull the latest rows from the data set.
    ///
    /// Independent decks own their cards and are left untouched.
    pub fn refresh(&mut self, data_set: &DataSet) -> Result<RefreshSummary> {
        if self.independent {
            return Ok(RefreshSummary::default());
        }
        let summary = self.materialize(data_set.table())?;
        log::info!(
            "Refreshed deck {}/{}: {} added, {} updated, {} dropped",
            self.front_field,
            self.back_field,
            summary.added,
            summary.updated,
            summary.dropped
        );
        Ok(summary)
    }

    /// Diff the current cards against the table rows.
    ///
    /// Each card claims one unconsumed row, preferring an identical
    /// (front, back) row over one with only the same front. Claimed cards
    /// take the row's back value; unclaimed cards are dropped; unconsumed
    /// rows become new cards. The filter applies to both kept and new cards.
    fn materialize(&mut self, table: &Table) -> Result<RefreshSummary> {
        let fronts = table
            .field(&self.front_field)
            .ok_or_else(|| DataError::MissingField(self.front_field.clone()))?;
        let backs = table
            .field(&self.back_field)
            .ok_or_else(|| DataError::MissingField(self.back_field.clone()))?;

        let old_cards = std::mem::take(&mut self.cards);
        let mut consumed = vec![false; fronts.len()];
        let mut claims: Vec<Option<usize>> = vec![None; old_cards.len()];

        for (card, claim) in old_cards.iter().zip(claims.iter_mut()) {
            let exact = (0..fronts.len())
                .find(|&row| !consumed[row] && fronts[row] == card.front && backs[row] == card.back);
            if let Some(row) = exact {
                consumed[row] = true;
                *claim = Some(row);
            }
        }
        for (card, claim) in old_cards.iter().zip(claims.iter_mut()) {
            if claim.is_some() {
                continue;
            }
            let by_front = (0..fronts.len()).find(|&row| !consumed[row] && fronts[row] == card.front);
            if let Some(row) = by_front {
                consumed[row] = true;
                *claim = Some(row);
            }
        }

        let mut summary = RefreshSummary::default();
        for (mut card, claim) in old_cards.into_iter().zip(claims) {
            let Some(row) = claim else {
                summary.dropped += 1;
                continue;
            };
            if card.back != backs[row] {
                card.back = backs[row].clone();
                summary.updated += 1;
            }
            if self.passes_filter(&card) && self.find_card_by_sides(&card.front, &card.back).is_none() {
                self.cards.push(card);
            } else {
                summary.dropped += 1;
            }
        }

        for row in 0..fronts.len() {
            if !consumed[row] && self.add_card(fronts[row].clone(), backs[row].clone()).is_some() {
                summary.added += 1;
            }
        }

        Ok(summary)
    }

    /// Add a card unless it is filtered out or already present
    pub fn add_card(&mut self, front: String, back: String) -> Option<Uuid> {
        if self.find_card_by_sides(&front, &back).is_some() {
            return None;
        }
        let card = Card::new(front, back);
        if !self.passes_filter(&card) {
            return None;
        }
        let id = card.id;
        self.cards.push(card);
        Some(id)
    }

    pub fn remove_card(&mut self, card_id: Uuid) -> Option<Card> {
        let pos = self.position(card_id)?;
        Some(self.cards.remove(pos))
    }

    /// Flatten the cards into the two mapped fields
    pub fn to_table(&self) -> Result<Table> {
        let fronts = self.cards.iter().map(|c| c.front.clone()).collect();
        let backs = self.cards.iter().map(|c| c.back.clone()).collect();
        let table = Table::from_columns(vec![
            (self.front_field.clone(), fronts),
            (self.back_field.clone(), backs),
        ])?;
        Ok(table)
    }

    // ==================== Rendering ====================

    pub fn render_front(&self, card: &Card) -> String {
        self.display.render_front(&card.front)
    }

    pub fn render_back(&self, card: &Card) -> String {
        self.display.render_back(&card.back)
    }

    /// Distinct rendered values of one side, in deck order
    pub fn rendered_values(&self, side: Side) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for card in &self.cards {
            let rendered = match side {
                Side::Front => self.render_front(card),
                Side::Back => self.render_back(card),
            };
            if !values.contains(&rendered) {
                values.push(rendered);
            }
        }
        values
    }

    // ==================== Lookup ====================

    pub fn find_card_by_sides(&self, front: &str, back: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.has_sides(front, back))
    }

    pub fn position(&self, card_id: Uuid) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }

    /// Card id -> position, for mapping many statuses back to the deck
    pub fn position_index(&self) -> HashMap<Uuid, usize> {
        self.cards.iter().enumerate().map(|(i, c)| (c.id, i)).collect()
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn data_set_id(&self) -> Uuid {
        self.data_set_id
    }

    pub fn front_field(&self) -> &str {
        &self.front_field
    }

    pub fn back_field(&self) -> &str {
        &self.back_field
    }

    pub fn is_independent(&self) -> bool {
        self.independent
    }

    /// Display name, e.g. `countries.csv (city/country)`
    pub fn name(&self, data_set: &DataSet) -> String {
        format!("{} ({}/{})", data_set.name(), self.front_field, self.back_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemorySource;
    use crate::flashcards::FlashcardError;

    fn table(rows: &[(&str, &str)]) -> Table {
        Table::from_columns(vec![
            ("city", rows.iter().map(|r| r.0.to_string()).collect()),
            ("country", rows.iter().map(|r| r.1.to_string()).collect()),
        ])
        .unwrap()
    }

    fn data_set(rows: &[(&str, &str)]) -> DataSet {
        let source = MemorySource::new("capitals", table(rows), false);
        DataSet::load(Box::new(source), false).unwrap()
    }

    fn sides(deck: &Deck) -> Vec<(String, String)> {
        deck.cards().iter().map(|c| (c.front.clone(), c.back.clone())).collect()
    }

    #[test]
    fn test_materialize_rows() {
        let ds = data_set(&[("Paris", "France"), ("Rome", "Italy")]);
        let deck = Deck::new(&ds, "city", "country").unwrap();

        assert_eq!(deck.len(), 2);
        assert_eq!(deck.cards()[0].front, "Paris");
        assert_eq!(deck.cards()[1].back, "Italy");
        assert_eq!(deck.name(&ds), "capitals (city/country)");
    }

    #[test]
    fn test_missing_field() {
        let ds = data_set(&[("Paris", "France")]);
        let result = Deck::new(&ds, "city", "capital");
        assert!(matches!(
            result,
            Err(FlashcardError::Data(DataError::MissingField(f))) if f == "capital"
        ));
    }

    #[test]
    fn test_refresh_idempotent() {
        let ds = data_set(&[("Paris", "France"), ("Rome", "Italy"), ("Rome", "Italy")]);
        let mut deck = Deck::new(&ds, "city", "country").unwrap();
        let ids: Vec<Uuid> = deck.cards().iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 2);

        let summary = deck.refresh(&ds).unwrap();
        assert_eq!(summary, RefreshSummary::default());
        let summary = deck.refresh(&ds).unwrap();
        assert_eq!(summary, RefreshSummary::default());

        let after: Vec<Uuid> = deck.cards().iter().map(|c| c.id).collect();
        assert_eq!(ids, after);
    }

    #[test]
    fn test_refresh_updates_adds_and_drops() {
        let mut ds = data_set(&[("Paris", "France"), ("Rome", "Italy"), ("Bern", "Swiss")]);
        let mut deck = Deck::new(&ds, "city", "country").unwrap();
        let bern_id = deck.find_card_by_sides("Bern", "Swiss").unwrap().id;

        ds.push(table(&[("Bern", "Switzerland"), ("Paris", "France"), ("Oslo", "Norway")]))
            .unwrap();
        let summary = deck.refresh(&ds).unwrap();

        assert_eq!(summary, RefreshSummary { added: 1, updated: 1, dropped: 1 });
        assert_eq!(
            sides(&deck),
            vec![
                ("Paris".to_string(), "France".to_string()),
                ("Bern".to_string(), "Switzerland".to_string()),
                ("Oslo".to_string(), "Norway".to_string()),
            ]
        );
        // Updated in place keeps the card's id
        assert_eq!(deck.find_card_by_sides("Bern", "Switzerland").unwrap().id, bern_id);
    }

    #[test]
    fn test_filter_applies_on_creation_and_refresh() {
        let mut ds = data_set(&[("11", "12"), ("21", "22")]);
        let mut deck = Deck::new(&ds, "city", "country").unwrap();
        deck.set_filter(|card| card.back.starts_with('1'));
        assert_eq!(deck.len(), 1);

        // A kept card whose new back fails the filter is dropped
        ds.push(table(&[("11", "99"), ("31", "13")])).unwrap();
        deck.refresh(&ds).unwrap();
        assert_eq!(sides(&deck), vec![("31".to_string(), "13".to_string())]);
    }

    #[test]
    fn test_independent_deck_does_not_pull() {
        let ds = data_set(&[("Paris", "France")]);
        let mut deck = Deck::independent(&ds, "city", "country");
        assert!(deck.is_empty());

        deck.add_card("Rome".to_string(), "Italy".to_string()).unwrap();
        assert!(deck.add_card("Rome".to_string(), "Italy".to_string()).is_none());
        deck.refresh(&ds).unwrap();
        assert_eq!(sides(&deck), vec![("Rome".to_string(), "Italy".to_string())]);

        let flattened = deck.to_table().unwrap();
        assert_eq!(flattened.header(), vec!["city", "country"]);
        assert_eq!(flattened.row(0).unwrap(), vec!["Rome", "Italy"]);
    }

    #[test]
    fn test_rendering_and_distinct_values() {
        let ds = data_set(&[("Paris", "France"), ("Lyon", "France"), ("Rome", "Italy")]);
        let mut deck = Deck::new(&ds, "city", "country").unwrap();
        deck.set_display(CardDisplay::new(|v| v.to_string(), |v| v.to_uppercase()));

        let first = deck.card(0).unwrap().clone();
        assert_eq!(deck.render_front(&first), "Paris");
        assert_eq!(deck.render_back(&first), "FRANCE");
        assert_eq!(deck.rendered_values(Side::Back), vec!["FRANCE", "ITALY"]);
        assert_eq!(deck.rendered_values(Side::Front).len(), 3);
    }

    #[test]
    fn test_remove_card() {
        let ds = data_set(&[("Paris", "France"), ("Rome", "Italy")]);
        let mut deck = Deck::new(&ds, "city", "country").unwrap();
        let rome = deck.find_card_by_sides("Rome", "Italy").unwrap().id;

        let removed = deck.remove_card(rome).unwrap();
        assert_eq!(removed.front, "Rome");
        assert!(deck.position(rome).is_none());
        assert!(deck.remove_card(rome).is_none());
    }
}
