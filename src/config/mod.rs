use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::terminal::TerminalSettings;
use crate::tui::theme::ThemeConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Name shown in tab titles and attached to shared commands.
    #[serde(default = "default_user")]
    pub user: String,

    /// Starting directory for new tabs. Default: the home directory.
    #[serde(default)]
    pub initial_directory: Option<String>,

    /// Run fixes for well-known typos such as `gti`. Fuzzy matches stay hints. Default: true
    #[serde(default = "default_true")]
    pub auto_correct: bool,

    /// Persist every submitted command. Default: true
    #[serde(default = "default_true")]
    pub record_history: bool,

    /// `tracing` filter for the log file, e.g. `"debug"` or `"pandora=trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub theme: ThemeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            user: default_user(),
            initial_directory: None,
            auto_correct: true,
            record_history: true,
            log_level: default_log_level(),
            theme: ThemeConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "user".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn terminal_settings(&self) -> TerminalSettings {
        TerminalSettings {
            user: self.user.clone(),
            initial_directory: self.initial_directory.clone(),
            auto_correct: self.auto_correct,
        }
    }
}

/// Returns the base pandora directory: ~/.pandora/
pub fn base_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".pandora"))
}

/// Returns the path to the `SQLite` database
pub fn db_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("pandora.db"))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("pandora.log"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("config.toml"))
}

/// Ensure all required directories exist
pub fn ensure_dirs() -> Result<()> {
    let base = base_dir()?;
    fs::create_dir_all(&base).context("failed to create ~/.pandora/")?;
    Ok(())
}

/// Load config from ~/.pandora/config.toml (or return defaults if it doesn't exist)
pub fn load() -> Result<Config> {
    let path = config_path()?;
    if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse(&content).with_context(|| format!("failed to parse {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

fn parse(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

/// Send `tracing` output to ~/.pandora/pandora.log. The TUI owns stdout.
pub fn init_logging(level: &str) -> Result<()> {
    ensure_dirs()?;
    let path = log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert!(config.auto_correct);
        assert!(config.record_history);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.initial_directory, None);
        assert!(!config.user.is_empty());
    }

    #[test]
    fn fields_override_defaults() {
        let config = parse(
            r#"
            user = "ada"
            initial_directory = "/srv"
            auto_correct = false

            [theme]
            line_error = "magenta"
            "#,
        )
        .unwrap();
        assert_eq!(config.user, "ada");
        assert!(!config.auto_correct);
        assert!(config.record_history);
        assert_eq!(config.theme.line_error.as_deref(), Some("magenta"));

        let settings = config.terminal_settings();
        assert_eq!(settings.user, "ada");
        assert_eq!(settings.initial_directory.as_deref(), Some("/srv"));
        assert!(!settings.auto_correct);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(parse("auto_correct = \"sometimes\"").is_err());
    }
}
