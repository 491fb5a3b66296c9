//! CLI argument definitions for the Heritage application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use heritage_core::types::Language;

/// Heritage - site chatbot and content tools for a heritage museum.
#[derive(Parser, Debug)]
#[command(name = "heritage", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for the SQLite database and uploads.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Chat language (en, fr, ar).
    #[arg(long = "language")]
    pub language: Option<Language>,

    /// Insert the stock chatbot rules if the rule table is empty.
    #[arg(long = "seed")]
    pub seed: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HERITAGE_CONFIG env var > ~/.heritage/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("HERITAGE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory, expanding a leading `~`.
    pub fn resolve_data_dir(&self, config_data_dir: &str) -> PathBuf {
        match self.data_dir {
            Some(ref p) => p.clone(),
            None => expand_home(config_data_dir),
        }
    }

    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    pub fn resolve_language(&self, config_language: Language) -> Language {
        self.language.unwrap_or(config_language)
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".heritage").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_flags() {
        let args = CliArgs::try_parse_from([
            "heritage",
            "--config",
            "/etc/heritage.toml",
            "-d",
            "/srv/data",
            "-l",
            "debug",
            "--language",
            "fr",
            "--seed",
        ])
        .unwrap();
        assert_eq!(args.resolve_config_path(), PathBuf::from("/etc/heritage.toml"));
        assert_eq!(args.resolve_data_dir("~/.heritage/data"), PathBuf::from("/srv/data"));
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert_eq!(args.resolve_language(Language::En), Language::Fr);
        assert!(args.seed);
    }

    #[test]
    fn test_defaults_come_from_config() {
        let args = CliArgs::try_parse_from(["heritage"]).unwrap();
        assert_eq!(args.resolve_log_level("warn"), "warn");
        assert_eq!(args.resolve_language(Language::Ar), Language::Ar);
        assert_eq!(args.resolve_data_dir("/var/lib/heritage"), PathBuf::from("/var/lib/heritage"));
        assert!(!args.seed);
    }

    #[test]
    fn test_invalid_language_rejected() {
        assert!(CliArgs::try_parse_from(["heritage", "--language", "de"]).is_err());
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home("~/.heritage/data");
        assert!(expanded.ends_with(".heritage/data"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
