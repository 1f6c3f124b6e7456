//! Desktop configuration loaded from the user's config directory.
//!
//! Everything here is optional: a missing or malformed file falls back
//! to defaults so the applications always start.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Follow the system preference.
    #[default]
    Auto,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Autosave {
    pub debounce_secs: u64,
    pub interval_secs: u64,
}

impl Default for Autosave {
    fn default() -> Self {
        Self {
            debounce_secs: 2,
            interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub autosave: Autosave,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            autosave: Autosave::default(),
            request_timeout_secs: 30,
        }
    }
}

/// `$XDG_CONFIG_HOME/codebench/config.toml` or the platform equivalent.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("codebench").join("config.toml"))
}

/// Load configuration from `path`, or from [`default_path`] when no path
/// is given. Never fails: a missing file is normal, and a file that does
/// not parse is logged and ignored.
pub fn load(path: Option<&Path>) -> Config {
    let path = match path.map(Path::to_path_buf).or_else(default_path) {
        Some(path) => path,
        None => {
            tracing::debug!("no config directory on this platform, using defaults");
            return Config::default();
        }
    };
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no config file, using defaults");
            return Config::default();
        }
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(Some(&dir.path().join("nope.toml")));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = \"dark\"\n\n[autosave]\ndebounce_secs = 5\n").unwrap();

        let config = load(Some(&path));
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.autosave.debounce_secs, 5);
        assert_eq!(config.autosave.interval_secs, 30);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = [this is not toml").unwrap();

        assert_eq!(load(Some(&path)), Config::default());
    }
}
