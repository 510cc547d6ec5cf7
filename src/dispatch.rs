//! Command Dispatcher
//!
//! Parses inbound command frames, validates them against the store and applies
//! them. Malformed frames are logged and dropped; domain failures come back as
//! [`DispatchOutcome::Rejected`] for the caller to report.

use crate::error::DomainError;
use crate::ids::{Allocation, Confirm, IdAllocator};
use crate::protocol::Command;
use crate::store::{RecordPersistence, RecordStore};
use crate::types::{Record, RecordId};
use crate::views::RecordView;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Display-refresh collaborator for the Directory
pub trait DisplayRefresh: Send {
    /// Re-render the listing.
    fn refresh(&mut self, view: &RecordView);

    /// Show a message to the user.
    fn notice(&mut self, message: &str);
}

/// Result of applying one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Created {
        record: Record,
        allocation: Allocation,
    },
    Updated {
        id: RecordId,
        previous: String,
        name: String,
    },
    Deleted(Record),
    Saved {
        count: usize,
    },
    Rejected(DomainError),
    SaveFailed(String),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(
            self,
            DispatchOutcome::Rejected(_) | DispatchOutcome::SaveFailed(_)
        )
    }

    /// Message for the user when the outcome deserves one
    pub fn notice(&self) -> Option<String> {
        match self {
            DispatchOutcome::Created {
                record,
                allocation: Allocation::Regenerated { requested, .. },
            } => Some(format!(
                "Created {} (id {} replaced by {})",
                record.name, requested, record.id
            )),
            DispatchOutcome::Created { .. }
            | DispatchOutcome::Updated { .. }
            | DispatchOutcome::Deleted(_) => None,
            DispatchOutcome::Saved { count } => Some(format!("Saved {} records", count)),
            DispatchOutcome::Rejected(e) => Some(e.to_string()),
            DispatchOutcome::SaveFailed(e) => Some(format!("Error saving records: {}", e)),
        }
    }
}

/// Applies commands to a store it borrows per call
pub struct CommandDispatcher {
    allocator: IdAllocator,
    persistence: Arc<dyn RecordPersistence>,
    confirm: Arc<dyn Confirm>,
}

impl CommandDispatcher {
    pub fn new(
        allocator: IdAllocator,
        persistence: Arc<dyn RecordPersistence>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            allocator,
            persistence,
            confirm,
        }
    }

    /// Parse and apply a frame. `None` means the frame was malformed and ignored.
    pub async fn dispatch_frame(
        &mut self,
        store: &mut RecordStore,
        frame: &str,
    ) -> Option<DispatchOutcome> {
        match Command::parse(frame) {
            Ok(command) => Some(self.dispatch(store, command).await),
            Err(e) => {
                warn!(frame = %frame, error = %e, "Ignoring malformed command frame");
                None
            }
        }
    }

    pub async fn dispatch(&mut self, store: &mut RecordStore, command: Command) -> DispatchOutcome {
        let outcome = match command {
            Command::Create { id, name } => {
                match self.allocator.allocate(id, store, self.confirm.as_ref()).await {
                    Ok(allocation) => {
                        let record = Record::new(allocation.id(), name);
                        match store.insert(record.clone()) {
                            Ok(()) => DispatchOutcome::Created { record, allocation },
                            Err(e) => DispatchOutcome::Rejected(e),
                        }
                    }
                    Err(e) => DispatchOutcome::Rejected(e),
                }
            }
            Command::Update { id, name } => match store.update(id, name.clone()) {
                Ok(previous) => DispatchOutcome::Updated { id, previous, name },
                Err(e) => DispatchOutcome::Rejected(e),
            },
            Command::Delete { id } => match store.remove(id) {
                Ok(record) => DispatchOutcome::Deleted(record),
                Err(e) => DispatchOutcome::Rejected(e),
            },
            Command::Save => match self.persistence.save(store.as_map()) {
                Ok(()) => DispatchOutcome::Saved { count: store.len() },
                Err(e) => {
                    error!(error = %e, "Failed to save records");
                    DispatchOutcome::SaveFailed(e.to_string())
                }
            },
        };

        match &outcome {
            DispatchOutcome::Rejected(e) => info!(reason = %e, "Command rejected"),
            DispatchOutcome::SaveFailed(_) => {}
            other => info!(outcome = ?other, records = store.len(), "Command applied"),
        }
        outcome
    }
}
