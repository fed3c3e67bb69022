use std::path::PathBuf;

use thiserror::Error;

/// Overrides the data directory
pub const HOME_ENV: &str = "CROCHET_DIARY_HOME";
/// Log filter directives (same syntax as RUST_LOG)
pub const LOG_ENV: &str = "CROCHET_DIARY_LOG";

const APP_DIR: &str = "crochet-diary";
const DB_FILE: &str = "preferences.db";
const DEFAULT_LOG_FILTER: &str = "crochet_diary=info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a data directory; set CROCHET_DIARY_HOME")]
    NoDataDir,
}

/// Runtime configuration resolved at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the preference database
    pub data_dir: PathBuf,
    pub log_filter: String,
}

impl Config {
    /// Resolve from the process environment.
    ///
    /// The data directory is `$CROCHET_DIARY_HOME` when set, otherwise the
    /// platform data directory:
    /// - Linux: ~/.local/share/crochet-diary
    /// - macOS: ~/Library/Application Support/crochet-diary
    /// - Windows: %APPDATA%\crochet-diary
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(
            std::env::var_os(HOME_ENV).map(PathBuf::from),
            std::env::var(LOG_ENV).ok(),
        )
    }

    fn resolve(home: Option<PathBuf>, log_filter: Option<String>) -> Result<Self, ConfigError> {
        let data_dir = match home.filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => dir,
            None => dirs::data_dir()
                .or_else(dirs::home_dir)
                .map(|dir| dir.join(APP_DIR))
                .ok_or(ConfigError::NoDataDir)?,
        };

        Ok(Self {
            data_dir,
            log_filter: log_filter
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    /// Path of the preference database
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_override() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/diary")), None).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/diary"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/diary/preferences.db"));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_log_filter_override() {
        let config = Config::resolve(
            Some(PathBuf::from("/tmp/diary")),
            Some("crochet_diary=debug".into()),
        )
        .unwrap();
        assert_eq!(config.log_filter, "crochet_diary=debug");

        let config = Config::resolve(Some(PathBuf::from("/tmp/diary")), Some("  ".into())).unwrap();
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }
}
