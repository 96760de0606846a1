use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use cardbox_lib::data::DataSet;
use cardbox_lib::flashcards::Deck;
use cardbox_lib::{Collection, CollectionStorage, Config};

/// Shared application state for CLI commands
pub struct App {
    pub config: Config,
    pub storage: CollectionStorage,
    pub collection: Collection,
}

impl App {
    /// Load config and the save file (`--save-file` wins over the config)
    pub fn new(save_file: Option<PathBuf>) -> Result<Self> {
        let config = Config::load().context("Failed to load config")?;
        let path = match save_file.or_else(|| config.save_file.clone()) {
            Some(path) => path,
            None => CollectionStorage::default_path().context("Failed to get data directory")?,
        };

        let storage = CollectionStorage::new(path);
        let collection = storage
            .load()
            .with_context(|| format!("Failed to load {}", storage.path().display()))?;

        Ok(Self {
            config,
            storage,
            collection,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.storage
            .save(&self.collection)
            .with_context(|| format!("Failed to save {}", self.storage.path().display()))
    }

    /// Find a data set by list number (1-based) or name (case-insensitive prefix match)
    pub fn find_data_set(&self, query: &str) -> Result<Uuid> {
        let data_sets = self.collection.data_sets();
        let names: Vec<String> = data_sets.iter().map(DataSet::name).collect();
        let index = resolve(query, &names, "data set")?;
        Ok(data_sets[index].id)
    }

    /// Find a deck by list number (1-based) or name (case-insensitive prefix match)
    pub fn find_deck(&self, query: &str) -> Result<Uuid> {
        let decks = self.collection.decks();
        let names: Vec<String> = decks.iter().map(|d| self.deck_name(d)).collect();
        let index = resolve(query, &names, "deck")?;
        Ok(decks[index].id)
    }

    pub fn deck_name(&self, deck: &Deck) -> String {
        self.collection
            .deck_name(deck.id)
            .unwrap_or_else(|| format!("({}/{})", deck.front_field(), deck.back_field()))
    }
}

fn resolve(query: &str, names: &[String], what: &str) -> Result<usize> {
    if let Ok(number) = query.parse::<usize>() {
        if number >= 1 && number <= names.len() {
            return Ok(number - 1);
        }
        bail!("No {} number {} (there are {})", what, number, names.len());
    }

    let query_lower = query.to_lowercase();

    // Exact match first
    if let Some(i) = names.iter().position(|n| n.to_lowercase() == query_lower) {
        return Ok(i);
    }

    // Prefix match
    let matches: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.to_lowercase().starts_with(&query_lower))
        .map(|(i, _)| i)
        .collect();

    match matches.len() {
        0 => bail!(
            "No {} matching '{}'. Available:\n{}",
            what,
            query,
            names.iter().map(|n| format!("  - {}", n)).collect::<Vec<_>>().join("\n")
        ),
        1 => Ok(matches[0]),
        _ => bail!(
            "Ambiguous {} name '{}'. Matches:\n{}",
            what,
            query,
            matches.iter().map(|&i| format!("  - {}", names[i])).collect::<Vec<_>>().join("\n")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec![
            "capitals.csv (city/country)".to_string(),
            "capitals.csv (country/city)".to_string(),
            "verbs.tsv (infinitive/past)".to_string(),
        ]
    }

    #[test]
    fn test_resolve_by_number_and_name() {
        assert_eq!(resolve("2", &names(), "deck").unwrap(), 1);
        assert_eq!(resolve("VERBS", &names(), "deck").unwrap(), 2);
        assert_eq!(resolve("capitals.csv (country/city)", &names(), "deck").unwrap(), 1);
        assert!(resolve("capitals", &names(), "deck").is_err());
        assert!(resolve("4", &names(), "deck").is_err());
        assert!(resolve("nouns", &names(), "deck").is_err());
    }
}
