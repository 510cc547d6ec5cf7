//! Channel names and their socket paths.

use std::path::{Path, PathBuf};

/// Directory -> Editor selection notifications
pub const NOTIFICATION_CHANNEL: &str = "MainAppPipe";

/// Editor -> Directory commands
pub const COMMAND_CHANNEL: &str = "AdminToMainPipe";

/// A named channel resolved to a socket path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEndpoint {
    name: String,
    path: PathBuf,
}

impl ChannelEndpoint {
    /// Resolve `<socket_dir>/<name>.sock`
    pub fn new(socket_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: socket_dir.join(format!("{}.sock", name)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
