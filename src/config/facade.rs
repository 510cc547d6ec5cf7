//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::AppConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the standard files and environment.
    pub fn load(working_dir: &Path) -> Result<AppConfig, ApiError> {
        let config = MergeService::load(working_dir)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, skipping the standard files.
    pub fn load_from_file(path: &Path) -> Result<AppConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Either of the above, depending on whether a file was given.
    pub fn load_with_override(
        config_path: Option<&Path>,
        working_dir: &Path,
    ) -> Result<AppConfig, ApiError> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(working_dir),
        }
    }
}
