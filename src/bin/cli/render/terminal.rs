use cardbox_lib::flashcards::ReviewStats;

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";
    pub const RED: &'static str = "\x1b[31m";
    pub const GREEN: &'static str = "\x1b[32m";
    pub const YELLOW: &'static str = "\x1b[33m";
    pub const CYAN: &'static str = "\x1b[36m";
}

/// Wrap `text` in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Draw one side of a card in a box
pub fn render_card(label: &str, text: &str, use_color: bool) -> String {
    let lines = wrap_lines(text, 60);
    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(label.chars().count() + 2);

    let mut out = Vec::with_capacity(lines.len() + 2);
    let top_rule = "\u{2500}".repeat(width + 1 - label.chars().count());
    out.push(format!(
        "\u{250c}\u{2500}{}{}\u{2510}",
        paint(label, Color::DIM, use_color),
        top_rule
    ));
    for line in &lines {
        let pad = width - line.chars().count();
        out.push(format!(
            "\u{2502} {}{} \u{2502}",
            paint(line, Color::BOLD, use_color),
            " ".repeat(pad)
        ));
    }
    out.push(format!("\u{2514}{}\u{2518}", "\u{2500}".repeat(width + 2)));
    out.join("\n")
}

/// One-line verdict after an answer
pub fn render_verdict(correct: bool, expected: &str, use_color: bool) -> String {
    if correct {
        paint("\u{2713} correct", Color::GREEN, use_color)
    } else {
        format!(
            "{} {}",
            paint("\u{2717} wrong, answer:", Color::RED, use_color),
            paint(expected, Color::BOLD, use_color)
        )
    }
}

/// Horizontal bar of how many reviewed cards sit at each status
pub fn render_histogram(stats: &ReviewStats, use_color: bool) -> Vec<String> {
    let peak = stats.by_status.values().copied().max().unwrap_or(0);
    if peak == 0 {
        return Vec::new();
    }
    stats
        .by_status
        .iter()
        .map(|(status, count)| {
            let len = (count * 30).div_ceil(peak);
            format!(
                "  {:>3} {} {}",
                status,
                paint(&"\u{2588}".repeat(len), Color::CYAN, use_color),
                count
            )
        })
        .collect()
}

/// Simple word-wrapping for terminal output
fn wrap_lines(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for line in text.lines() {
        if line.chars().count() <= max_width {
            lines.push(line.to_string());
            continue;
        }
        let mut current_line = String::new();
        for word in line.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.chars().count() + 1 + word.chars().count() <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = word.to_string();
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lines() {
        let text = "the quick brown fox jumps over the lazy dog";
        let lines = wrap_lines(text, 15);
        assert!(lines.iter().all(|l| l.chars().count() <= 15));
        assert_eq!(lines.join(" "), text);
        assert_eq!(wrap_lines("", 10), vec![String::new()]);
    }

    #[test]
    fn test_card_box_is_rectangular() {
        let card = render_card("front", "Paris", false);
        let widths: Vec<usize> = card.lines().map(|l| l.chars().count()).collect();
        assert_eq!(widths.len(), 3);
        assert!(widths.iter().all(|w| *w == widths[0]));
        assert!(card.contains("Paris"));
    }

    #[test]
    fn test_no_color_is_plain() {
        assert_eq!(paint("x", Color::RED, false), "x");
        assert_eq!(render_verdict(true, "France", false), "\u{2713} correct");
    }
}
