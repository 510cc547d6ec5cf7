//! Directory runtime
//!
//! Owns the record store and is its only writer. Command frames, console input
//! and shutdown are multiplexed onto one loop, so dispatch never races with
//! selection changes or display refreshes.

use crate::dispatch::{CommandDispatcher, DispatchOutcome, DisplayRefresh};
use crate::error::DomainError;
use crate::input::InputLines;
use crate::links::SelectionSink;
use crate::protocol::Command;
use crate::selection::SelectionFile;
use crate::store::{RecordPersistence, RecordStore};
use crate::types::{Record, RecordId};
use crate::views::{RecordFilter, RecordView};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const DIRECTORY_USAGE: &str = "Commands: list | filter <text> | select <id> | clear | save | quit";

/// Console command for the Directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryInput {
    List,
    /// Empty text clears the filter
    Filter(String),
    Select(RecordId),
    Clear,
    Save,
    Quit,
}

impl DirectoryInput {
    /// Parse a console line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let input = match word.to_ascii_lowercase().as_str() {
            "list" | "ls" => DirectoryInput::List,
            "filter" => DirectoryInput::Filter(rest.to_string()),
            "select" => {
                let id = rest
                    .parse::<RecordId>()
                    .map_err(|_| format!("Not a record id: '{}'", rest))?;
                DirectoryInput::Select(id)
            }
            "clear" => DirectoryInput::Clear,
            "save" => DirectoryInput::Save,
            "quit" | "exit" => DirectoryInput::Quit,
            other => return Err(format!("Unknown command '{}'. {}", other, DIRECTORY_USAGE)),
        };
        Ok(Some(input))
    }
}

pub struct Directory {
    store: RecordStore,
    dispatcher: CommandDispatcher,
    sink: Box<dyn SelectionSink>,
    display: Box<dyn DisplayRefresh>,
    filter: RecordFilter,
    selected: Option<RecordId>,
    selection_file: Option<SelectionFile>,
}

impl Directory {
    pub fn new(
        store: RecordStore,
        dispatcher: CommandDispatcher,
        sink: Box<dyn SelectionSink>,
        display: Box<dyn DisplayRefresh>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            sink,
            display,
            filter: RecordFilter::default(),
            selected: None,
            selection_file: None,
        }
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Mirror selection changes into a snapshot file.
    pub fn with_selection_file(mut self, file: SelectionFile) -> Self {
        self.selection_file = Some(file);
        self
    }

    /// Replace the store with the persisted records.
    ///
    /// A load failure is reported and leaves the store empty.
    pub fn load_store(&mut self, persistence: &dyn RecordPersistence) {
        match persistence.load() {
            Ok(records) => {
                self.store = RecordStore::from(records);
                info!(records = self.store.len(), "Records loaded");
            }
            Err(e) => {
                error!(error = %e, "Failed to load records");
                self.store = RecordStore::new();
                self.display
                    .notice(&format!("Error loading records: {}", e));
            }
        }
        self.selected = None;
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn selected(&self) -> Option<Record> {
        self.selected.and_then(|id| self.store.record(id))
    }

    pub fn view(&self) -> RecordView {
        RecordView::project(&self.store, &self.filter)
    }

    /// Apply one inbound command frame.
    ///
    /// Malformed frames are dropped and return `None`. Every dispatched command
    /// refreshes the display, whether it succeeded or was rejected.
    pub async fn handle_frame(&mut self, frame: &str) -> Option<DispatchOutcome> {
        let outcome = self.dispatcher.dispatch_frame(&mut self.store, frame).await?;
        self.after_dispatch(&outcome).await;
        Some(outcome)
    }

    async fn dispatch_local(&mut self, command: Command) -> DispatchOutcome {
        let outcome = self.dispatcher.dispatch(&mut self.store, command).await;
        self.after_dispatch(&outcome).await;
        outcome
    }

    async fn after_dispatch(&mut self, outcome: &DispatchOutcome) {
        if let Some(message) = outcome.notice() {
            self.display.notice(&message);
        }

        match outcome {
            DispatchOutcome::Updated { id, name, .. } if self.selected == Some(*id) => {
                let record = Record::new(*id, name.clone());
                debug!(id = *id, "Selected record renamed, pushing update");
                self.publish_selection(&record).await;
            }
            DispatchOutcome::Deleted(record) if self.selected == Some(record.id) => {
                debug!(id = record.id, "Selected record deleted");
                self.clear_selection();
            }
            _ => {}
        }

        let view = self.view();
        self.display.refresh(&view);
    }

    /// Select a record and push it to the Editor.
    pub async fn select(&mut self, id: RecordId) -> Result<Record, DomainError> {
        let record = self.store.record(id).ok_or(DomainError::MissingId(id))?;
        self.selected = Some(id);
        info!(id, "Record selected");
        self.publish_selection(&record).await;
        Ok(record)
    }

    /// Forget the selection. Nothing is pushed to the Editor.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.write_selection_file(None);
    }

    pub fn set_filter(&mut self, filter: RecordFilter) {
        self.filter = filter;
        let view = self.view();
        self.display.refresh(&view);
    }

    async fn publish_selection(&mut self, record: &Record) {
        self.write_selection_file(Some(record));
        self.sink.publish(record).await;
    }

    fn write_selection_file(&self, record: Option<&Record>) {
        if let Some(file) = &self.selection_file {
            if let Err(e) = file.save(record) {
                warn!(path = %file.path().display(), error = %e, "Failed to write selection file");
            }
        }
    }

    /// Handle one console line. Returns `true` when the user asked to quit.
    pub async fn handle_input(&mut self, line: &str) -> bool {
        let input = match DirectoryInput::parse(line) {
            Ok(Some(input)) => input,
            Ok(None) => return false,
            Err(message) => {
                self.display.notice(&message);
                return false;
            }
        };

        match input {
            DirectoryInput::List => {
                let view = self.view();
                self.display.refresh(&view);
            }
            DirectoryInput::Filter(text) => self.set_filter(RecordFilter::new(text)),
            DirectoryInput::Select(id) => match self.select(id).await {
                Ok(record) => self.display.notice(&format!("Selected {}", record)),
                Err(e) => self.display.notice(&e.to_string()),
            },
            DirectoryInput::Clear => {
                self.clear_selection();
                self.display.notice("Selection cleared");
            }
            DirectoryInput::Save => {
                self.dispatch_local(Command::Save).await;
            }
            DirectoryInput::Quit => return true,
        }
        false
    }

    /// Run until shutdown, the frame source closes, or the user quits.
    ///
    /// Returns the final store so callers can inspect it.
    pub async fn run(
        mut self,
        mut frames: mpsc::Receiver<String>,
        mut input: Option<InputLines>,
        shutdown: CancellationToken,
    ) -> RecordStore {
        let view = self.view();
        self.display.refresh(&view);
        info!(records = self.store.len(), "Directory running");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                frame = frames.recv() => match frame {
                    Some(frame) => {
                        self.handle_frame(&frame).await;
                    }
                    None => {
                        debug!("Command frame source closed");
                        break;
                    }
                },
                line = next_console_line(&input) => match line {
                    Some(line) => {
                        if self.handle_input(&line).await {
                            shutdown.cancel();
                            break;
                        }
                    }
                    None => {
                        debug!("Console input closed");
                        input = None;
                    }
                },
            }
        }

        info!(records = self.store.len(), "Directory stopped");
        self.store
    }
}

/// Next console line, or never when there is no console.
pub(crate) async fn next_console_line(input: &Option<InputLines>) -> Option<String> {
    match input {
        Some(input) => input.next_line().await,
        None => std::future::pending().await,
    }
}
