//! User settings (catalogue URL, cache placement, staleness window).
//!
//! Stored at `~/.config/emoji-list/settings.toml`. Every field is optional;
//! a missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheLocations;
use crate::error::EmojiError;

/// Where the Unicode Consortium publishes the current emoji test list.
pub const DEFAULT_SOURCE_URL: &str = "https://unicode.org/Public/emoji/latest/emoji-test.txt";

/// Default staleness window before a refresh is attempted.
pub const DEFAULT_MAX_AGE_DAYS: u32 = 30;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// URL of the emoji test list.
    pub source_url: String,
    /// Save the cache next to the executable instead of the per-user data dir.
    pub portable: bool,
    /// Cached data older than this is refreshed by `auto_initialize`.
    pub max_age_days: u32,
    /// Give up on a download after this many seconds.
    pub timeout_secs: u64,
    /// Overrides the directory holding the portable cache file.
    pub portable_dir: Option<PathBuf>,
    /// Overrides the directory holding the per-user cache file.
    pub user_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            portable: false,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            portable_dir: None,
            user_dir: None,
        }
    }
}

/// Canonical path to the settings file: `~/.config/emoji-list/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("emoji-list").join("settings.toml")
}

impl Settings {
    /// Load settings from the canonical path, falling back to defaults if absent.
    pub fn load() -> Result<Self, EmojiError> {
        Self::load_from(&settings_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, EmojiError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
            .map_err(|e| EmojiError::config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, EmojiError> {
        toml::from_str(contents).map_err(|e| EmojiError::config(e.to_string()))
    }

    /// Staleness window. Zero forces a refresh.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(u64::from(self.max_age_days) * 24 * 60 * 60)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the two cache file paths, honouring directory overrides.
    pub fn cache_locations(&self) -> Result<CacheLocations, EmojiError> {
        CacheLocations::resolve(self.portable_dir.as_deref(), self.user_dir.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(settings.max_age(), Duration::from_secs(30 * 86_400));
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::from_toml_str(
            r#"
portable = true
max_age_days = 7
user_dir = "/tmp/emoji"
"#,
        )
        .unwrap();
        assert!(settings.portable);
        assert_eq!(settings.max_age_days, 7);
        assert_eq!(settings.user_dir.as_deref(), Some(Path::new("/tmp/emoji")));
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_malformed_is_config_error() {
        let err = Settings::from_toml_str("max_age_days = \"soon\"").unwrap_err();
        assert!(matches!(err, EmojiError::Config(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = Settings::load_from(Path::new("/nonexistent/emoji-list/settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
