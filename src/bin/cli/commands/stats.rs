use anyhow::{Context, Result};
use chrono::Utc;

use cardbox_lib::flashcards::format_interval;

use crate::app::App;
use crate::render::terminal::{paint, render_histogram, Color};
use crate::OutputFormat;

pub fn run(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck_id = app.find_deck(query)?;
    let deck = app.collection.deck(deck_id).context("Deck not found")?;
    let now = Utc::now();

    match format {
        OutputFormat::Json => {
            let reviews: Vec<serde_json::Value> = app
                .collection
                .reviews_for_deck(deck_id)
                .map(|review| {
                    serde_json::json!({
                        "id": review.id.to_string(),
                        "scheme": review.scheme().name(),
                        "reviewType": review.kind(),
                        "stats": review.stats(deck, now),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "deck": app.deck_name(deck),
                "cards": deck.len(),
                "reviews": reviews,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!(
                "{} ({} cards)",
                paint(&app.deck_name(deck), Color::BOLD, use_color),
                deck.len()
            );

            let mut any = false;
            for review in app.collection.reviews_for_deck(deck_id) {
                any = true;
                let stats = review.stats(deck, now);
                println!(
                    "\n{} / {}",
                    paint(review.scheme().name(), Color::CYAN, use_color),
                    review.kind()
                );
                println!(
                    "  {} reviewed, {} new, {} due",
                    stats.reviewed_cards, stats.unreviewed_cards, stats.due_cards
                );
                for line in render_histogram(&stats, use_color) {
                    println!("{}", line);
                }
                if let Some(settings) = review.scheme().settings() {
                    let top = stats.by_status.keys().next_back().copied().unwrap_or(1);
                    let days = review.scheme().interval_days(top).unwrap_or(0);
                    println!(
                        "  {}",
                        paint(
                            &format!(
                                "{} day(s) per status, longest interval {}",
                                settings.days_per_status,
                                format_interval(days)
                            ),
                            Color::DIM,
                            use_color
                        )
                    );
                }
            }
            if !any {
                println!("No reviews yet. Start one with `cardbox review <deck>`.");
            }
        }
    }

    Ok(())
}
