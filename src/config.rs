use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// File looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "electro-browser.json";

/// Desktop application settings. Missing fields take their defaults.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
    /// Format tags offered in the top bar.
    pub file_formats: Vec<String>,
    /// Data type tags offered in the top bar.
    pub data_types: Vec<String>,
    /// Folder listed at startup.
    pub initial_folder: Option<PathBuf>,
    /// Pixel scale factor applied to exported images.
    pub export_scale: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_size: [1280.0, 720.0],
            min_window_size: [800.0, 480.0],
            file_formats: vec![".mpt".into(), ".txt".into(), ".parquet".into()],
            data_types: vec!["cv".into(), "eis".into()],
            initial_folder: None,
            export_scale: 2.0,
        }
    }
}

impl AppConfig {
    /// Read `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_or_default(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "data_types": ["cv"], "export_scale": 3.0 }"#).unwrap();

        let cfg = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(cfg.data_types, vec!["cv".to_string()]);
        assert_eq!(cfg.export_scale, 3.0);
        assert_eq!(cfg.window_size, AppConfig::default().window_size);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load_or_default(&path).is_err());
    }
}
