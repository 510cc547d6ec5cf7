//! Configuration
//!
//! Layered settings for both runtimes. Sources merge in this order, later ones
//! winning: built-in defaults, the global file, the local `rostersync.toml`, then
//! `ROSTERSYNC__SECTION__KEY` environment variables.

pub mod facade;
pub mod merge {
    pub mod merge_policy;
    pub mod service;
}
pub mod paths {
    pub mod xdg_root;
}
pub mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod local_file;
}

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::channel::{ChannelEndpoint, COMMAND_CHANNEL, NOTIFICATION_CHANNEL};
use crate::error::ApiError;
use crate::ids::{DeclinePolicy, IdAllocator, DEFAULT_ID_SPAN, DEFAULT_ID_THRESHOLD};
use crate::logging::LoggingConfig;
use crate::selection::SelectionFile;
use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How the Editor reaches the command channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandMode {
    /// Fresh connection per command
    #[default]
    OneShot,
    /// One connection held while the Editor runs
    Persistent,
}

fn default_notification_channel() -> String {
    NOTIFICATION_CHANNEL.to_string()
}

fn default_command_channel() -> String {
    COMMAND_CHANNEL.to_string()
}

fn default_retry_interval_ms() -> u64 {
    500
}

fn default_command_connect_wait_ms() -> u64 {
    5000
}

/// Channel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Directory holding the channel sockets; None means the runtime default
    #[serde(default)]
    pub socket_dir: Option<PathBuf>,

    #[serde(default = "default_notification_channel")]
    pub notification: String,

    #[serde(default = "default_command_channel")]
    pub command: String,

    /// Delay between connect or accept retries
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// How long a one-shot send waits for the Directory; 0 waits forever
    #[serde(default = "default_command_connect_wait_ms")]
    pub command_connect_wait_ms: u64,

    #[serde(default)]
    pub command_mode: CommandMode,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            socket_dir: None,
            notification: default_notification_channel(),
            command: default_command_channel(),
            retry_interval_ms: default_retry_interval_ms(),
            command_connect_wait_ms: default_command_connect_wait_ms(),
            command_mode: CommandMode::default(),
        }
    }
}

impl ChannelsConfig {
    pub fn resolve_socket_dir(&self) -> PathBuf {
        match &self.socket_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => xdg::runtime_dir(),
        }
    }

    pub fn notification_endpoint(&self) -> ChannelEndpoint {
        ChannelEndpoint::new(&self.resolve_socket_dir(), &self.notification)
    }

    pub fn command_endpoint(&self) -> ChannelEndpoint {
        ChannelEndpoint::new(&self.resolve_socket_dir(), &self.command)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms.max(1))
    }

    pub fn command_connect_wait(&self) -> Option<Duration> {
        match self.command_connect_wait_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("staff.csv")
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Record file (relative paths resolve against the working directory)
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

fn default_threshold() -> RecordId {
    DEFAULT_ID_THRESHOLD
}

fn default_span() -> RecordId {
    DEFAULT_ID_SPAN
}

/// Id allocation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdsConfig {
    #[serde(default = "default_threshold")]
    pub threshold: RecordId,

    #[serde(default = "default_span")]
    pub span: RecordId,

    #[serde(default)]
    pub on_decline: DeclinePolicy,
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            span: default_span(),
            on_decline: DeclinePolicy::default(),
        }
    }
}

impl IdsConfig {
    pub fn allocator(&self) -> IdAllocator {
        IdAllocator::new(self.threshold, self.span, self.on_decline)
    }
}

fn default_true() -> bool {
    true
}

/// Selection snapshot configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Snapshot path; None means `<Documents>/SelectedStaff.json`
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: None,
        }
    }
}

impl SelectionConfig {
    /// The snapshot file, or None when disabled or no location is known.
    pub fn selection_file(&self) -> Option<SelectionFile> {
        if !self.enabled {
            return None;
        }
        self.file
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(SelectionFile::default_path)
            .map(SelectionFile::new)
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub channels: ChannelsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ids: IdsConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.ids.threshold <= 0 {
            return Err(ApiError::ConfigError(format!(
                "ids.threshold must be positive, got {}",
                self.ids.threshold
            )));
        }
        if self.ids.span <= 0 {
            return Err(ApiError::ConfigError(format!(
                "ids.span must be positive, got {}",
                self.ids.span
            )));
        }
        if self.ids.threshold.checked_add(self.ids.span).is_none() {
            return Err(ApiError::ConfigError(
                "ids.threshold + ids.span overflows".to_string(),
            ));
        }
        for (key, name) in [
            ("channels.notification", &self.channels.notification),
            ("channels.command", &self.channels.command),
        ] {
            validate_channel_name(key, name)?;
        }
        if self.channels.notification == self.channels.command {
            return Err(ApiError::ConfigError(
                "channels.notification and channels.command must differ".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_channel_name(key: &str, name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::ConfigError(format!("{} must not be empty", key)));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ApiError::ConfigError(format!(
            "{} must be a plain name, got '{}'",
            key, name
        )));
    }
    Ok(())
}
