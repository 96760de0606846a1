use std::path::Path;

use anyhow::{Context, Result};

use cardbox_lib::Config;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

/// Show the effective config; with `init`, write it out if no file exists yet
pub fn run(app: &App, init: bool, format: &OutputFormat, use_color: bool) -> Result<()> {
    let path = Config::default_path().context("Failed to get config directory")?;
    let written = if init { write_if_missing(&app.config, &path)? } else { false };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "path": path.display().to_string(),
                "exists": path.exists(),
                "written": written,
                "saveFile": app.storage.path().display().to_string(),
                "config": app.config,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let note = match (written, path.exists()) {
                (true, _) => "written",
                (false, true) => "exists",
                (false, false) => "not created, defaults in use",
            };
            println!(
                "{} {}",
                paint(&path.display().to_string(), Color::BOLD, use_color),
                paint(&format!("({})", note), Color::DIM, use_color)
            );
            println!("save file: {}\n", app.storage.path().display());
            print!("{}", toml::to_string_pretty(&app.config)?);
        }
    }

    Ok(())
}

/// Write `config` to `path` unless a file is already there
fn write_if_missing(config: &Config, path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    config
        .save_to(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_init_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cardbox").join("config.toml");
        let config = Config {
            num_options: 6,
            ..Config::default()
        };

        assert!(write_if_missing(&config, &path).unwrap());
        assert_eq!(Config::load_from(&path).unwrap().num_options, 6);

        fs::write(&path, "num_options = 3\n").unwrap();
        assert!(!write_if_missing(&config, &path).unwrap());
        assert_eq!(Config::load_from(&path).unwrap().num_options, 3);
    }
}
