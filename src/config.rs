//! Conversion settings file.
//!
//! A plain deserialized structure; option handling lives in the CLI. The
//! file is JSON with all keys optional.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Settings recognized by the converter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub author: String,
    /// Cover image path; embedding requires `thumb` as well.
    pub cover: Option<PathBuf>,
    pub thumb: Option<PathBuf>,
    /// Maximum heading level that starts a chapter. 0 keeps each source
    /// file as a single chapter.
    pub max_level: u8,
    /// Compress the body with PalmDoc LZ77.
    pub compress: bool,
    /// Source file stem to display chapter name.
    pub names: HashMap<String, String>,
}

impl Config {
    /// Load settings from a JSON file, reporting the offending path on
    /// parse failure.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_full_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "title": "My Book",
                "author": "Someone",
                "max_level": 2,
                "names": {{"intro": "Introduction"}}
            }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.title, "My Book");
        assert_eq!(config.author, "Someone");
        assert_eq!(config.max_level, 2);
        assert!(config.cover.is_none());
        assert_eq!(config.names["intro"], "Introduction");
    }

    #[test]
    fn defaults_apply_to_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.title.is_empty());
        assert_eq!(config.max_level, 0);
        assert!(!config.compress);
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("invalid settings file"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::load("/nonexistent/settings.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
