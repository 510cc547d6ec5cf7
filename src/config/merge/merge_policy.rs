//! Built-in defaults every merge starts from.

use crate::config::AppConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the serialized `AppConfig::default()`.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&AppConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
