mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cardbox_lib::flashcards::ReviewKind;

#[derive(Parser)]
#[command(name = "cardbox", about = "Spaced repetition flashcards from CSV files", version)]
struct Cli {
    /// Save file to use (default: config, then the data directory)
    #[arg(long, global = true)]
    save_file: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Manage data sources (CSV/TSV files)
    #[command(subcommand)]
    Sources(SourcesCommand),

    /// Manage decks
    #[command(subcommand)]
    Decks(DecksCommand),

    /// Review a deck interactively
    Review {
        /// Deck number or name (case-insensitive prefix match)
        deck: String,
        /// simple, multiple-choice or input
        #[arg(long, default_value = "input")]
        mode: ReviewKind,
        /// default, leitner or streak
        #[arg(long, default_value = "leitner")]
        scheme: String,
    },

    /// Show review statistics for a deck
    Stats {
        /// Deck number or name
        deck: String,
    },

    /// Show the config file and the settings in use
    Config {
        /// Write the current settings to the config file if it does not exist
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
enum SourcesCommand {
    /// List data sources
    List,

    /// Add a CSV or TSV file
    Add {
        /// Path to the file
        path: String,
        /// Never write to this file
        #[arg(long)]
        read_only: bool,
    },

    /// Remove a data source with its decks and reviews
    Remove {
        /// Source number or name
        source: String,
    },

    /// Re-read sources and update their decks
    Refresh {
        /// Source number or name (default: all)
        source: Option<String>,
    },
}

#[derive(Subcommand)]
enum DecksCommand {
    /// List decks
    List,

    /// Build a deck from two fields of a data source
    Add {
        /// Source number or name
        source: String,
        /// Field shown on the front
        front: String,
        /// Field shown on the back
        back: String,
    },

    /// Create an empty deck saved to a new CSV/TSV file
    New {
        /// Path of the file to create
        path: String,
        /// Front field name
        front: String,
        /// Back field name
        back: String,
    },

    /// Remove a deck and its reviews
    Remove {
        /// Deck number or name
        deck: String,
    },

    /// List the cards of a deck
    Show {
        /// Deck number or name
        deck: String,
    },

    /// Add a card to a deck created with `decks new`
    AddCard {
        deck: String,
        front: String,
        back: String,
    },

    /// Remove a card from a deck created with `decks new`
    RemoveCard {
        deck: String,
        front: String,
        back: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let mut app = app::App::new(cli.save_file)?;

    match cli.command {
        Command::Sources(subcmd) => match subcmd {
            SourcesCommand::List => commands::sources::run_list(&app, &cli.format, use_color)?,
            SourcesCommand::Add { path, read_only } => {
                commands::sources::run_add(&mut app, &path, read_only, &cli.format)?
            }
            SourcesCommand::Remove { source } => commands::sources::run_remove(&mut app, &source)?,
            SourcesCommand::Refresh { source } => {
                commands::sources::run_refresh(&mut app, source.as_deref(), &cli.format)?
            }
        },
        Command::Decks(subcmd) => match subcmd {
            DecksCommand::List => commands::decks::run_list(&app, &cli.format, use_color)?,
            DecksCommand::Add { source, front, back } => {
                commands::decks::run_add(&mut app, &source, &front, &back)?
            }
            DecksCommand::New { path, front, back } => {
                commands::decks::run_new(&mut app, &path, &front, &back)?
            }
            DecksCommand::Remove { deck } => commands::decks::run_remove(&mut app, &deck)?,
            DecksCommand::Show { deck } => commands::decks::run_show(&app, &deck, &cli.format, use_color)?,
            DecksCommand::AddCard { deck, front, back } => {
                commands::decks::run_add_card(&mut app, &deck, &front, &back)?
            }
            DecksCommand::RemoveCard { deck, front, back } => {
                commands::decks::run_remove_card(&mut app, &deck, &front, &back)?
            }
        },
        Command::Review { deck, mode, scheme } => {
            commands::review::run(&mut app, &deck, mode, &scheme, use_color)?;
        }
        Command::Stats { deck } => {
            commands::stats::run(&app, &deck, &cli.format, use_color)?;
        }
        Command::Config { init } => {
            commands::config::run(&app, init, &cli.format, use_color)?;
        }
    }

    Ok(())
}
