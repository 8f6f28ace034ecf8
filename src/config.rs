use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Default configuration, checked for valid TOML by `build.rs`.
const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

static COMPILED_DEFAULT: LazyLock<Config> =
    LazyLock::new(|| toml::from_str(DEFAULT_CONFIG).unwrap_or_default());

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
}

/// Markdown extensions recognized by the parser
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub tables: bool,
    pub task_lists: bool,
    pub strikethrough: bool,
    /// `||text||` spoiler spans
    pub spoilers: bool,
    /// Bare `http://`, `https://`, `ftp://`, `mailto:` and `www.` URLs
    pub autolinks: bool,
    pub definition_lists: bool,
    /// GitHub-style `> [!NOTE]` blockquotes
    pub alerts: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            tables: true,
            task_lists: true,
            strikethrough: true,
            spoilers: true,
            autolinks: true,
            definition_lists: true,
            alerts: true,
        }
    }
}

impl Config {
    /// The configuration bundled with the crate, parsed once.
    pub fn compiled_default() -> &'static Self {
        &COMPILED_DEFAULT
    }

    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load config from a TOML file, or return the compiled default if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::compiled_default().clone())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_default_enables_everything() {
        let parser = &Config::compiled_default().parser;
        assert!(parser.tables);
        assert!(parser.task_lists);
        assert!(parser.strikethrough);
        assert!(parser.spoilers);
        assert!(parser.autolinks);
        assert!(parser.definition_lists);
        assert!(parser.alerts);
    }

    #[test]
    fn compiled_default_is_parsed_once() {
        assert!(std::ptr::eq(Config::compiled_default(), Config::compiled_default()));
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config: Config = toml::from_str("[parser]\nspoilers = false\n").unwrap();
        assert!(!config.parser.spoilers);
        assert!(config.parser.tables);
    }

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.parser.autolinks);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let path = std::env::temp_dir().join(format!("tgmd-invalid-{}.toml", std::process::id()));
        fs::write(&path, "[parser\ntables = ").unwrap();
        let result = Config::load(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn missing_config_falls_back_to_default() {
        let path = Path::new("/nonexistent/tgmd/config.toml");
        assert!(matches!(Config::load(path), Err(crate::Error::Io(_))));
        let config = Config::load_or_default(path).unwrap();
        assert!(config.parser.tables);
    }
}
