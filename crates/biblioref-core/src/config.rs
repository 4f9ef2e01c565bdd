//! Persisted user configuration: a small flat JSON object. Loading is
//! lenient by contract, an absent or corrupt file yields defaults.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Style selector, e.g. "builtin:default" or "csl:/path/style.csl".
    pub last_style: String,
    /// Sort mode tag, e.g. "author_year".
    pub last_sort: String,
    /// User-chosen folder scanned for style files.
    pub style_folder: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            last_style: "builtin:default".to_string(),
            last_sort: "author_year".to_string(),
            style_folder: String::new(),
        }
    }
}

/// Load the config, falling back to defaults on any problem.
pub fn load_config(path: &Path) -> AppConfig {
    let Ok(text) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };
    match serde_json::from_str(&text) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "corrupt config, using defaults");
            AppConfig::default()
        }
    }
}

/// Write the config, creating parent folders as needed.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(config)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            last_style: "csl:/styles/apa.csl".to_string(),
            last_sort: "title".to_string(),
            style_folder: "/styles".to_string(),
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn absent_and_corrupt_files_yield_defaults() {
        assert_eq!(
            load_config(Path::new("/no/such/config.json")),
            AppConfig::default()
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"last_sort": "year_author"}"#).unwrap();
        let config = load_config(&path);
        assert_eq!(config.last_sort, "year_author");
        assert_eq!(config.last_style, "builtin:default");
    }
}
