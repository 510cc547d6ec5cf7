//! Editor runtime
//!
//! Keeps a transient snapshot of the record selected in the Directory and turns
//! console input into command frames. The Editor never holds the store.

use crate::directory::next_console_line;
use crate::error::ChannelError;
use crate::input::InputLines;
use crate::links::CommandLink;
use crate::protocol::{Command, Selection};
use crate::types::{Record, RecordId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const EDITOR_USAGE: &str =
    "Commands: create <id> <name> | update [<id>] <name> | delete [<id>] | save | show | quit";

/// Presentation collaborator for the Editor
pub trait EditorView: Send {
    fn show_selection(&mut self, selection: Option<&Record>);

    fn notice(&mut self, message: &str);
}

/// Console command for the Editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorInput {
    Create { id: RecordId, name: String },
    /// Without an id the displayed record is updated
    Update { id: Option<RecordId>, name: String },
    /// Without an id the displayed record is deleted
    Delete { id: Option<RecordId> },
    Save,
    Show,
    Quit,
}

impl EditorInput {
    /// Parse a console line. Blank lines yield `Ok(None)`.
    ///
    /// For `update`, a leading integer is taken as the id when a name follows it.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = split_word(line);
        let input = match word.to_ascii_lowercase().as_str() {
            "create" | "add" => {
                let (id, name) = split_word(rest);
                let id = id
                    .parse::<RecordId>()
                    .map_err(|_| format!("Not a record id: '{}'", id))?;
                if name.is_empty() {
                    return Err("A name is required".to_string());
                }
                EditorInput::Create {
                    id,
                    name: name.to_string(),
                }
            }
            "update" | "rename" => {
                let (first, tail) = split_word(rest);
                match first.parse::<RecordId>() {
                    Ok(id) if !tail.is_empty() => EditorInput::Update {
                        id: Some(id),
                        name: tail.to_string(),
                    },
                    _ if rest.is_empty() => return Err("A name is required".to_string()),
                    _ => EditorInput::Update {
                        id: None,
                        name: rest.to_string(),
                    },
                }
            }
            "delete" | "rm" => {
                if rest.is_empty() {
                    EditorInput::Delete { id: None }
                } else {
                    let id = rest
                        .parse::<RecordId>()
                        .map_err(|_| format!("Not a record id: '{}'", rest))?;
                    EditorInput::Delete { id: Some(id) }
                }
            }
            "save" => EditorInput::Save,
            "show" => EditorInput::Show,
            "quit" | "exit" => EditorInput::Quit,
            other => return Err(format!("Unknown command '{}'. {}", other, EDITOR_USAGE)),
        };
        Ok(Some(input))
    }
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

pub struct Editor {
    link: CommandLink,
    view: Box<dyn EditorView>,
    displayed: Option<Record>,
}

impl Editor {
    pub fn new(link: CommandLink, view: Box<dyn EditorView>) -> Self {
        Self {
            link,
            view,
            displayed: None,
        }
    }

    /// Seed the displayed snapshot, e.g. from the selection file.
    pub fn with_initial(mut self, initial: Option<Record>) -> Self {
        self.displayed = initial;
        self
    }

    pub fn displayed(&self) -> Option<&Record> {
        self.displayed.as_ref()
    }

    /// Apply a selection frame from the Directory. Malformed frames are dropped.
    pub fn apply_notification(&mut self, frame: &str) {
        let selection = match Selection::parse(frame) {
            Ok(selection) => selection,
            Err(e) => {
                warn!(frame = %frame, error = %e, "Ignoring malformed selection frame");
                return;
            }
        };
        let record = match selection {
            Selection::Record(record) => record,
            Selection::Id(id) => {
                let name = self
                    .displayed
                    .as_ref()
                    .map(|r| r.name.clone())
                    .unwrap_or_default();
                Record::new(id, name)
            }
        };
        debug!(id = record.id, "Selection received");
        self.displayed = Some(record);
        self.view.show_selection(self.displayed.as_ref());
    }

    /// Resolve console input into a command, filling in the displayed id.
    pub fn command_for(&self, input: &EditorInput) -> Result<Command, String> {
        let displayed_id = || {
            self.displayed
                .as_ref()
                .map(|r| r.id)
                .ok_or_else(|| "No record selected".to_string())
        };
        match input {
            EditorInput::Create { id, name } => Ok(Command::Create {
                id: *id,
                name: name.clone(),
            }),
            EditorInput::Update { id, name } => Ok(Command::Update {
                id: match id {
                    Some(id) => *id,
                    None => displayed_id()?,
                },
                name: name.clone(),
            }),
            EditorInput::Delete { id } => Ok(Command::Delete {
                id: match id {
                    Some(id) => *id,
                    None => displayed_id()?,
                },
            }),
            EditorInput::Save => Ok(Command::Save),
            EditorInput::Show | EditorInput::Quit => {
                Err("Not a directory command".to_string())
            }
        }
    }

    /// Send a command to the Directory, reporting failures to the user.
    pub async fn submit(&mut self, command: &Command) -> Result<(), ChannelError> {
        match self.link.submit(command).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let message = match &e {
                    ChannelError::NotConnected(_) => "Directory is not running".to_string(),
                    other => format!("Failed to send command: {}", other),
                };
                self.view.notice(&message);
                Err(e)
            }
        }
    }

    /// Handle one console line. Returns `true` when the user asked to quit.
    pub async fn handle_input(&mut self, line: &str) -> bool {
        let input = match EditorInput::parse(line) {
            Ok(Some(input)) => input,
            Ok(None) => return false,
            Err(message) => {
                self.view.notice(&message);
                return false;
            }
        };
        match input {
            EditorInput::Quit => return true,
            EditorInput::Show => self.view.show_selection(self.displayed.as_ref()),
            other => match self.command_for(&other) {
                Ok(command) => {
                    let _ = self.submit(&command).await;
                }
                Err(message) => self.view.notice(&message),
            },
        }
        false
    }

    /// Run until shutdown or the user quits.
    pub async fn run(
        mut self,
        mut notifications: mpsc::Receiver<String>,
        mut input: Option<InputLines>,
        shutdown: CancellationToken,
    ) {
        self.view.show_selection(self.displayed.as_ref());
        info!("Editor running");
        let mut notifications_open = true;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                frame = notifications.recv(), if notifications_open => match frame {
                    Some(frame) => self.apply_notification(&frame),
                    None => {
                        debug!("Notification source closed");
                        notifications_open = false;
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
                        if !notifications_open {
                            break;
                        }
                    }
                },
            }
        }
        info!("Editor stopped");
    }
}
