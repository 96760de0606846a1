use std::io::{self, BufRead, Write};

use anyhow::Result;

use cardbox_lib::flashcards::{ReviewKind, ReviewSession};

use crate::app::App;
use crate::render::terminal::{paint, render_card, render_verdict, Color};

/// Typed on its own line, ends the session early
const QUIT: &str = ":q";

#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    seen: usize,
    correct: usize,
}

pub fn run(app: &mut App, query: &str, kind: ReviewKind, scheme: &str, use_color: bool) -> Result<()> {
    let deck_id = app.find_deck(query)?;
    let settings = app.config.review;
    let num_options = app.config.num_options;
    let review_id = app
        .collection
        .find_or_create_review(deck_id, kind, scheme, settings)?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let tally = {
        let (review, deck) = app.collection.review_with_deck(review_id)?;
        let mut session = review.start_session(deck, num_options)?;
        if session.is_empty() {
            println!("Nothing to review right now.");
            return Ok(());
        }
        println!(
            "{}",
            paint(
                &format!("{} cards, {} to quit", session.len(), QUIT),
                Color::DIM,
                use_color
            )
        );
        run_session(&mut session, &mut input, use_color)?
    };

    // Statuses changed even if the user quit early
    app.save()?;

    if kind.is_graded() {
        println!("\nReviewed {} cards, {} correct", tally.seen, tally.correct);
    } else {
        println!("\nReviewed {} cards", tally.seen);
    }
    Ok(())
}

fn run_session<R: BufRead>(session: &mut ReviewSession<'_>, input: &mut R, use_color: bool) -> Result<Tally> {
    let mut tally = Tally::default();

    while session.advance().is_some() {
        let number = session.position().map_or(0, |p| p + 1);
        let status = match session.current_status()? {
            Some(status) => format!("status {}", status),
            None => "new".to_string(),
        };
        println!(
            "\n{} {}",
            paint(&format!("[{}/{}]", number, session.len()), Color::YELLOW, use_color),
            paint(&status, Color::DIM, use_color)
        );
        println!("{}", render_card("front", &session.current_front()?, use_color));

        let answer = match session.kind() {
            ReviewKind::Simple => {
                if prompt(input, "(enter to flip)")?.is_none() {
                    break;
                }
                println!("{}", render_card("back", &session.current_back()?, use_color));
                String::new()
            }
            ReviewKind::MultipleChoice => {
                let options = session.generate_options()?.to_vec();
                for (i, option) in options.iter().enumerate() {
                    println!("  {}) {}", i + 1, option);
                }
                match choose(input, &options)? {
                    Some(choice) => choice,
                    None => break,
                }
            }
            ReviewKind::Input => match prompt(input, ">")? {
                Some(answer) => answer,
                None => break,
            },
        };

        let expected = session.correct_answer()?;
        let correct = session.submit(&answer)?;
        tally.seen += 1;
        if correct {
            tally.correct += 1;
        }
        if session.kind().is_graded() {
            println!("{}", render_verdict(correct, &expected, use_color));
        }
    }

    session.deactivate();
    Ok(tally)
}

/// Read a line; `None` on end of input or the quit command
fn prompt<R: BufRead>(input: &mut R, label: &str) -> Result<Option<String>> {
    print!("{} ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if line.trim() == QUIT {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Ask for an option by number or by its text until one matches
fn choose<R: BufRead>(input: &mut R, options: &[String]) -> Result<Option<String>> {
    loop {
        let Some(line) = prompt(input, "choice:")? else {
            return Ok(None);
        };
        let line = line.trim();
        if let Ok(n) = line.parse::<usize>() {
            if (1..=options.len()).contains(&n) {
                return Ok(Some(options[n - 1].clone()));
            }
        }
        if let Some(option) = options.iter().find(|o| o.eq_ignore_ascii_case(line)) {
            return Ok(Some(option.clone()));
        }
        println!("Pick 1-{}", options.len());
    }
}
