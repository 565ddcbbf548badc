//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use super::PackConfig;
use crate::error::PackError;
use crate::result::Result;

/// Config file names in priority order
const CONFIG_FILE_NAMES: &[&str] = &["mdk.toml", "mdk.yaml", "mdk.yml", "mdk.json"];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// Starts from the given directory and moves up the directory tree until
    /// a config is found or the filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| PackError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<PackConfig> {
        PackConfig::load(path)
    }

    /// Load config from an explicit path or auto-discover it
    ///
    /// An explicit path that does not exist is an error; a project without a
    /// discoverable config yields the empty configuration.
    pub fn load(custom_path: Option<&Path>, start_dir: &Path) -> Result<PackConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(PackError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        match Self::auto_discover(start_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!(
                    "No config file found above {}, using defaults",
                    start_dir.display()
                );
                Ok(PackConfig::default())
            }
        }
    }
}
