//! Local config file: `rostersync.toml` in the working directory

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;

pub const LOCAL_CONFIG_FILE: &str = "rostersync.toml";

/// Add the local file if present.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    working_dir: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = working_dir.join(LOCAL_CONFIG_FILE);
    Ok(builder.add_source(File::from(path).required(false)))
}
