// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file loading: search-path resolution and TOML
//! deserialization for the `auto-rx.toml` daemon config.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

/// Trait for loading a TOML configuration file with a fixed name and a
/// fallback search order.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Config filename, e.g. `"auto-rx.toml"`.
    fn config_filename() -> &'static str;

    /// Load config from a specific file path.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Default search paths, in order: current directory, `$XDG_CONFIG_HOME`
    /// (or its platform equivalent via `dirs::config_dir()`), then `/etc`.
    fn default_search_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(Self::config_filename()),
            dirs::config_dir()
                .map(|d| d.join("auto-rx").join(Self::config_filename()))
                .unwrap_or_else(|| PathBuf::from(Self::config_filename())),
            PathBuf::from("/etc/auto-rx").join(Self::config_filename()),
        ]
    }

    /// Search default paths and load the first one found.
    ///
    /// Returns `(config, path_where_found)`; if nothing is found, returns
    /// `(Self::default(), None)` rather than erroring — an absent config
    /// file is not itself a configuration error.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in Self::default_search_paths() {
            if path.exists() {
                let cfg = Self::load_from_file(&path)?;
                return Ok((cfg, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Load from an explicit `--config` path if given, else search the
    /// default paths.
    fn load(explicit_path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match explicit_path {
            Some(path) => Ok((Self::load_from_file(path)?, Some(path.to_path_buf()))),
            None => Self::load_from_default_paths(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct TestConfig {
        #[serde(default)]
        min_freq: f64,
    }

    impl ConfigFile for TestConfig {
        fn config_filename() -> &'static str {
            "auto-rx.toml"
        }
    }

    #[test]
    fn explicit_path_that_does_not_exist_errors() {
        let err = TestConfig::load(Some(Path::new("/nonexistent/auto-rx.toml")));
        assert!(err.is_err());
    }

    #[test]
    fn missing_default_paths_yield_default_config() {
        // None of these paths should exist in a test sandbox.
        let (cfg, path) = TestConfig::load(None).unwrap();
        assert_eq!(cfg, TestConfig::default());
        // If none of the default search paths exist, path is None; if the
        // test host happens to have /etc/auto-rx/auto-rx.toml this still
        // returns a value so we only assert the shape, not absence.
        let _ = path;
    }

    #[test]
    fn loads_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto-rx.toml");
        std::fs::write(&path, "min_freq = 400.5\n").unwrap();
        let (cfg, found) = TestConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.min_freq, 400.5);
        assert_eq!(found.as_deref(), Some(path.as_path()));
    }
}
