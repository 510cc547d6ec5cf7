//! Selection notifications from the Directory.

use crate::channel::LineNotifier;
use crate::error::ChannelError;
use crate::protocol::Selection;
use crate::types::Record;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Receives selection changes from the Directory runtime
#[async_trait]
pub trait SelectionSink: Send {
    /// Push the selected record. Returns whether a peer received it.
    async fn publish(&self, record: &Record) -> bool;
}

/// Pushes `<id>,<name>` frames to the connected Editor, if any
pub struct NotificationLink {
    notifier: LineNotifier,
}

impl NotificationLink {
    pub fn new(notifier: LineNotifier) -> Self {
        Self { notifier }
    }

    pub async fn is_connected(&self) -> bool {
        self.notifier.is_connected().await
    }
}

#[async_trait]
impl SelectionSink for NotificationLink {
    async fn publish(&self, record: &Record) -> bool {
        match self.notifier.send(&Selection::to_frame(record)).await {
            Ok(()) => {
                debug!(id = record.id, "Selection pushed");
                true
            }
            Err(ChannelError::NotConnected(_)) => {
                debug!(id = record.id, "No editor connected, selection not pushed");
                false
            }
            Err(e) => {
                warn!(id = record.id, error = %e, "Selection push failed");
                false
            }
        }
    }
}
