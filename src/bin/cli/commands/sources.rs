use anyhow::{Context, Result};

use cardbox_lib::flashcards::RefreshSummary;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let data_sets = app.collection.data_sets();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = data_sets
                .iter()
                .enumerate()
                .map(|(i, ds)| {
                    serde_json::json!({
                        "number": i + 1,
                        "id": ds.id.to_string(),
                        "name": ds.name(),
                        "location": ds.location(),
                        "kind": ds.source().kind(),
                        "fields": ds.header(),
                        "rows": ds.num_rows(),
                        "readOnly": ds.is_read_only(),
                        "mirrorsDeck": ds.mirrors_deck(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if data_sets.is_empty() {
                println!("No data sources. Add one with `cardbox sources add <file>`.");
                return Ok(());
            }
            for (i, ds) in data_sets.iter().enumerate() {
                let mut flags = Vec::new();
                if ds.is_read_only() {
                    flags.push("read-only");
                }
                if ds.mirrors_deck() {
                    flags.push("deck copy");
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };
                println!(
                    "{:>3}. {} ({} rows){}",
                    i + 1,
                    paint(&ds.name(), Color::BOLD, use_color),
                    ds.num_rows(),
                    flags
                );
                println!(
                    "     {}",
                    paint(&format!("{}  fields: {}", ds.location(), ds.header().join(", ")), Color::DIM, use_color)
                );
            }
        }
    }

    Ok(())
}

pub fn run_add(app: &mut App, location: &str, read_only: bool, format: &OutputFormat) -> Result<()> {
    let id = app
        .collection
        .open_data_set(location, read_only)
        .with_context(|| format!("Failed to open {}", location))?;
    app.save()?;

    let ds = app
        .collection
        .data_set(id)
        .context("Data set vanished after adding")?;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "id": id.to_string(),
                    "name": ds.name(),
                    "fields": ds.header(),
                    "rows": ds.num_rows(),
                }))?
            );
        }
        OutputFormat::Plain => {
            println!("Added {} ({} rows)", ds.name(), ds.num_rows());
            println!("Fields: {}", ds.header().join(", "));
        }
    }
    Ok(())
}

pub fn run_remove(app: &mut App, query: &str) -> Result<()> {
    let id = app.find_data_set(query)?;
    let removed = app.collection.remove_data_set(id)?;
    app.save()?;
    println!("Removed {} and its decks", removed.name());
    Ok(())
}

/// Refresh one data set, or all of them
pub fn run_refresh(app: &mut App, query: Option<&str>, format: &OutputFormat) -> Result<()> {
    let ids = match query {
        Some(q) => vec![app.find_data_set(q)?],
        None => app.collection.data_sets().iter().map(|ds| ds.id).collect(),
    };

    let mut results = Vec::new();
    for id in ids {
        let summary = app.collection.refresh_data_set(id)?;
        let name = app.collection.data_set(id).map(|ds| ds.name()).unwrap_or_default();
        results.push((name, summary));
    }
    app.save()?;

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = results
                .iter()
                .map(|(name, summary)| serde_json::json!({ "name": name, "changes": summary }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            for (name, summary) in &results {
                println!("{}: {}", name, describe(summary));
            }
        }
    }
    Ok(())
}

fn describe(summary: &RefreshSummary) -> String {
    if *summary == RefreshSummary::default() {
        return "up to date".to_string();
    }
    format!(
        "{} added, {} updated, {} dropped",
        summary.added, summary.updated, summary.dropped
    )
}
