use anyhow::{bail, Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let decks = app.collection.decks();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = decks
                .iter()
                .enumerate()
                .map(|(i, deck)| {
                    serde_json::json!({
                        "number": i + 1,
                        "id": deck.id.to_string(),
                        "name": app.deck_name(deck),
                        "frontField": deck.front_field(),
                        "backField": deck.back_field(),
                        "cards": deck.len(),
                        "independent": deck.is_independent(),
                        "reviews": app.collection.reviews_for_deck(deck.id).count(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("No decks. Create one with `cardbox decks add <source> <front> <back>`.");
                return Ok(());
            }
            for (i, deck) in decks.iter().enumerate() {
                let reviews = app.collection.reviews_for_deck(deck.id).count();
                let independent = if deck.is_independent() { " [independent]" } else { "" };
                println!(
                    "{:>3}. {} {}{}",
                    i + 1,
                    paint(&app.deck_name(deck), Color::BOLD, use_color),
                    paint(&format!("{} cards, {} reviews", deck.len(), reviews), Color::DIM, use_color),
                    independent
                );
            }
        }
    }

    Ok(())
}

/// Build a deck from two fields of a data source
pub fn run_add(app: &mut App, source: &str, front: &str, back: &str) -> Result<()> {
    let ds_id = app.find_data_set(source)?;
    let deck_id = app
        .collection
        .create_deck(ds_id, front, back)
        .context("Failed to create deck")?;
    app.save()?;

    let deck = app.collection.deck(deck_id).context("Deck vanished after adding")?;
    println!("Created {} with {} cards", app.deck_name(deck), deck.len());
    Ok(())
}

/// Create an empty deck written to a new file
pub fn run_new(app: &mut App, location: &str, front: &str, back: &str) -> Result<()> {
    if std::path::Path::new(location).exists() {
        bail!("{} already exists; use `cardbox sources add` to build a deck from it", location);
    }
    let deck_id = app
        .collection
        .create_independent_deck(location, front, back)
        .with_context(|| format!("Failed to create {}", location))?;
    app.save()?;

    let deck = app.collection.deck(deck_id).context("Deck vanished after adding")?;
    println!("Created {}", app.deck_name(deck));
    Ok(())
}

pub fn run_remove(app: &mut App, query: &str) -> Result<()> {
    let deck_id = app.find_deck(query)?;
    let name = app.collection.deck_name(deck_id).unwrap_or_default();
    app.collection.remove_deck(deck_id)?;
    app.save()?;
    println!("Removed {} and its reviews", name);
    Ok(())
}

pub fn run_show(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck_id = app.find_deck(query)?;
    let deck = app.collection.deck(deck_id).context("Deck not found")?;

    match format {
        OutputFormat::Json => {
            let cards: Vec<serde_json::Value> = deck
                .cards()
                .iter()
                .map(|card| {
                    serde_json::json!({
                        "front": deck.render_front(card),
                        "back": deck.render_back(card),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "name": app.deck_name(deck),
                "frontField": deck.front_field(),
                "backField": deck.back_field(),
                "cards": cards,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint(&app.deck_name(deck), Color::BOLD, use_color));
            if deck.is_empty() {
                println!("(no cards)");
                return Ok(());
            }

            let fronts: Vec<String> = deck.cards().iter().map(|c| deck.render_front(c)).collect();
            let front_width = fronts
                .iter()
                .map(|f| f.chars().count())
                .max()
                .unwrap_or(5)
                .clamp(5, 40);

            println!(
                "{:<w$}  {}",
                deck.front_field(),
                deck.back_field(),
                w = front_width
            );
            println!("{}  {}", "\u{2500}".repeat(front_width), "\u{2500}".repeat(20));
            for (card, front) in deck.cards().iter().zip(&fronts) {
                println!("{:<w$}  {}", front, deck.render_back(card), w = front_width);
            }
            println!("\n{} cards total", deck.len());
        }
    }

    Ok(())
}

pub fn run_add_card(app: &mut App, query: &str, front: &str, back: &str) -> Result<()> {
    let deck_id = app.find_deck(query)?;
    match app.collection.add_card(deck_id, front, back)? {
        Some(_) => {
            app.save()?;
            println!("Added {} / {}", front, back);
        }
        None => println!("{} / {} is already in the deck or filtered out", front, back),
    }
    Ok(())
}

pub fn run_remove_card(app: &mut App, query: &str, front: &str, back: &str) -> Result<()> {
    let deck_id = app.find_deck(query)?;
    let card_id = app
        .collection
        .deck(deck_id)
        .and_then(|deck| deck.find_card_by_sides(front, back))
        .map(|card| card.id)
        .with_context(|| format!("No card {} / {} in this deck", front, back))?;

    app.collection.remove_card(deck_id, card_id)?;
    app.save()?;
    println!("Removed {} / {}", front, back);
    Ok(())
}
