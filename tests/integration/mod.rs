//! Integration tests for the rostersync Directory and Editor runtimes

mod channel_links;
mod directory_flow;
mod editor_flow;

use parking_lot::Mutex;
use rostersync::config::AppConfig;
use rostersync::dispatch::DisplayRefresh;
use rostersync::editor::EditorView;
use rostersync::types::Record;
use rostersync::views::RecordView;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Configuration confined to a temporary directory
pub fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.channels.socket_dir = Some(root.join("sockets"));
    config.channels.retry_interval_ms = 10;
    config.channels.command_connect_wait_ms = 2000;
    config.storage.csv_path = root.join("staff.csv");
    config.selection.file = Some(root.join("SelectedStaff.json"));
    config
}

/// Poll `condition` until it holds, failing after a few seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[derive(Clone, Default)]
pub struct RecordingDisplay {
    pub views: Arc<Mutex<Vec<RecordView>>>,
    pub notices: Arc<Mutex<Vec<String>>>,
}

impl RecordingDisplay {
    pub fn last_view(&self) -> Option<RecordView> {
        self.views.lock().last().cloned()
    }

    pub fn has_notice(&self, prefix: &str) -> bool {
        self.notices.lock().iter().any(|n| n.starts_with(prefix))
    }
}

impl DisplayRefresh for RecordingDisplay {
    fn refresh(&mut self, view: &RecordView) {
        self.views.lock().push(view.clone());
    }

    fn notice(&mut self, message: &str) {
        self.notices.lock().push(message.to_string());
    }
}

#[derive(Clone, Default)]
pub struct RecordingView {
    pub shown: Arc<Mutex<Vec<Option<Record>>>>,
    pub notices: Arc<Mutex<Vec<String>>>,
}

impl RecordingView {
    pub fn last_shown(&self) -> Option<Record> {
        self.shown.lock().last().cloned().flatten()
    }
}

impl EditorView for RecordingView {
    fn show_selection(&mut self, selection: Option<&Record>) {
        self.shown.lock().push(selection.cloned());
    }

    fn notice(&mut self, message: &str) {
        self.notices.lock().push(message.to_string());
    }
}
