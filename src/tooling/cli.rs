//! CLI Tooling
//!
//! Command-line interface for the Directory and Editor runtimes plus the offline
//! helpers (`list`, `send`, `config`).

use crate::channel::{Acceptor, Connector, LineListener, LineNotifier, LineSender, OneShotSender};
use crate::config::{AppConfig, CommandMode, ConfigLoader};
use crate::directory::Directory;
use crate::dispatch::{CommandDispatcher, DisplayRefresh};
use crate::editor::{Editor, EditorView};
use crate::error::{ApiError, ChannelError, StorageError};
use crate::ids::{AutoConfirm, Confirm};
use crate::input::InputLines;
use crate::links::{CommandLink, NotificationLink};
use crate::logging::LogOverrides;
use crate::protocol::Command;
use crate::store::persistence::CsvRecordFile;
use crate::store::{RecordPersistence, RecordStore};
use crate::tooling::console::{format_record_view, ConsoleDisplay, LineConfirm};
use crate::types::RecordId;
use crate::views::{RecordFilter, RecordView};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Frames buffered between a channel listener and its runtime loop
const FRAME_BUFFER: usize = 64;

/// rostersync - keep a staff directory and its editor in sync over local channels
#[derive(Parser)]
#[command(name = "rostersync")]
#[command(about = "Staff directory and editor synchronized over local sockets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the channel sockets
    #[arg(long)]
    pub socket_dir: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn log_overrides(&self) -> LogOverrides {
        LogOverrides {
            level: self.log_level.clone(),
            format: self.log_format.clone(),
            output: self.log_output.clone(),
            file: self.log_file.clone(),
            verbose: self.verbose,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the Directory: own the records and apply incoming commands
    Directory {
        /// Record file (overrides storage.csv_path)
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Initial listing filter
        #[arg(long)]
        filter: Option<String>,
        /// Answer yes to id regeneration prompts instead of asking on the console
        #[arg(long)]
        yes: bool,
    },
    /// Run the Editor: follow the Directory's selection and send commands
    Editor,
    /// Send a single command to a running Directory
    Send {
        #[command(subcommand)]
        command: SendCommands,
    },
    /// Print the stored records without running a Directory
    List {
        /// Record file (overrides storage.csv_path)
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Id or name prefix
        #[arg(long)]
        filter: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SendCommands {
    /// Create a record
    Create {
        #[arg(allow_negative_numbers = true)]
        id: RecordId,
        name: String,
    },
    /// Rename a record
    Update {
        #[arg(allow_negative_numbers = true)]
        id: RecordId,
        name: String,
    },
    /// Delete a record
    Delete {
        #[arg(allow_negative_numbers = true)]
        id: RecordId,
    },
    /// Ask the Directory to save its records
    Save,
}

impl SendCommands {
    /// Build the wire command, rejecting names the Directory would drop.
    pub fn to_command(&self) -> Result<Command, ApiError> {
        let checked_name = |name: &str| -> Result<String, ApiError> {
            if name.trim().is_empty() {
                return Err(ApiError::ConfigError("Name must not be empty".to_string()));
            }
            Ok(name.to_string())
        };
        Ok(match self {
            SendCommands::Create { id, name } => Command::Create {
                id: *id,
                name: checked_name(name)?,
            },
            SendCommands::Update { id, name } => Command::Update {
                id: *id,
                name: checked_name(name)?,
            },
            SendCommands::Delete { id } => Command::Delete { id: *id },
            SendCommands::Save => Command::Save,
        })
    }
}

/// Options for a Directory run
#[derive(Debug, Clone, Default)]
pub struct DirectoryOptions {
    pub csv: Option<PathBuf>,
    pub filter: Option<String>,
    /// Accept id regeneration without prompting, even with a console attached
    pub auto_confirm: bool,
}

/// CLI context holding the effective configuration
pub struct CliContext {
    config: AppConfig,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(config_path: Option<PathBuf>, socket_dir: Option<PathBuf>) -> Result<Self, ApiError> {
        let working_dir = std::env::current_dir()
            .map_err(|e| ApiError::ConfigError(format!("Cannot read working directory: {}", e)))?;
        let mut config = ConfigLoader::load_with_override(config_path.as_deref(), &working_dir)?;
        if socket_dir.is_some() {
            config.channels.socket_dir = socket_dir;
        }
        Ok(Self { config })
    }

    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Directory { csv, filter, yes } => {
                let shutdown = shutdown_on_ctrl_c();
                let options = DirectoryOptions {
                    csv: csv.clone(),
                    filter: filter.clone(),
                    auto_confirm: *yes,
                };
                let input = InputLines::stdin();
                let store = run_directory(
                    &self.config,
                    options,
                    Box::new(ConsoleDisplay),
                    Some(input),
                    shutdown,
                )
                .await?;
                Ok(format!("Directory stopped with {} records", store.len()))
            }
            Commands::Editor => {
                let shutdown = shutdown_on_ctrl_c();
                run_editor(
                    &self.config,
                    Box::new(ConsoleDisplay),
                    Some(InputLines::stdin()),
                    shutdown,
                )
                .await?;
                Ok("Editor stopped".to_string())
            }
            Commands::Send { command } => {
                let command = command.to_command()?;
                send_command(&self.config, &command).await?;
                Ok(format!("Sent {}", command.to_frame()))
            }
            Commands::List {
                csv,
                filter,
                format,
            } => list_records(&self.config, csv.clone(), filter.as_deref(), format),
            Commands::Config => serde_json::to_string_pretty(&self.config)
                .map_err(|e| ApiError::ConfigError(format!("Cannot render config: {}", e))),
        }
    }
}

fn shutdown_on_ctrl_c() -> CancellationToken {
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Cannot listen for Ctrl-C");
                    return;
                }
                info!("Interrupted, shutting down");
                token.cancel();
            }
        }
    });
    shutdown
}

fn csv_file(config: &AppConfig, csv: Option<PathBuf>) -> CsvRecordFile {
    CsvRecordFile::new(csv.unwrap_or_else(|| config.storage.csv_path.clone()))
}

/// Print the records in `text` or `json`.
pub fn list_records(
    config: &AppConfig,
    csv: Option<PathBuf>,
    filter: Option<&str>,
    format: &str,
) -> Result<String, ApiError> {
    let file = csv_file(config, csv);
    let store = RecordStore::from(file.load()?);
    let view = RecordView::project(&store, &RecordFilter::new(filter.unwrap_or_default()));
    match format {
        "json" => serde_json::to_string_pretty(&view)
            .map_err(|e| ApiError::StorageError(StorageError::Serialization(e.to_string()))),
        "text" => Ok(format_record_view(&view).trim_end().to_string()),
        other => Err(ApiError::ConfigError(format!(
            "Invalid format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

/// Send one command over a fresh connection.
pub async fn send_command(config: &AppConfig, command: &Command) -> Result<(), ApiError> {
    let channels = &config.channels;
    let link = CommandLink::one_shot(OneShotSender::new(
        channels.command_endpoint(),
        channels.retry_interval(),
        channels.command_connect_wait(),
    ));
    link.submit(command).await?;
    Ok(())
}

/// Run a Directory until shutdown or `quit`, returning its final records.
pub async fn run_directory(
    config: &AppConfig,
    options: DirectoryOptions,
    display: Box<dyn DisplayRefresh>,
    input: Option<InputLines>,
    shutdown: CancellationToken,
) -> Result<RecordStore, ApiError> {
    let channels = &config.channels;
    let persistence = Arc::new(csv_file(config, options.csv));
    let confirm: Arc<dyn Confirm> = match &input {
        _ if options.auto_confirm => Arc::new(AutoConfirm(true)),
        Some(input) => Arc::new(LineConfirm::new(input.clone(), shutdown.clone())),
        None => Arc::new(AutoConfirm(false)),
    };
    let dispatcher = CommandDispatcher::new(
        config.ids.allocator(),
        Arc::clone(&persistence) as Arc<dyn RecordPersistence>,
        confirm,
    );

    // Command channel first: a running Directory is detected there before the
    // liveness check can touch its notification peer.
    let acceptor = Acceptor::bind(channels.command_endpoint()).map_err(ChannelError::from)?;
    let notifier = LineNotifier::bind(
        channels.notification_endpoint(),
        channels.retry_interval(),
        shutdown.clone(),
    )?;
    let (frames_tx, frames_rx) = mpsc::channel(FRAME_BUFFER);
    let listener = tokio::spawn(
        LineListener::new(acceptor, channels.retry_interval()).run(frames_tx, shutdown.clone()),
    );

    let mut directory = Directory::new(
        RecordStore::new(),
        dispatcher,
        Box::new(NotificationLink::new(notifier)),
        display,
    );
    if let Some(filter) = options.filter {
        directory = directory.with_filter(RecordFilter::new(filter));
    }
    if let Some(file) = config.selection.selection_file() {
        directory = directory.with_selection_file(file);
    }
    directory.load_store(persistence.as_ref());

    let store = directory.run(frames_rx, input, shutdown.clone()).await;
    shutdown.cancel();
    join_listener("command", listener).await;
    Ok(store)
}

/// Run an Editor until shutdown or `quit`.
pub async fn run_editor(
    config: &AppConfig,
    view: Box<dyn EditorView>,
    input: Option<InputLines>,
    shutdown: CancellationToken,
) -> Result<(), ApiError> {
    let channels = &config.channels;
    let (link, keeper) = match channels.command_mode {
        CommandMode::OneShot => (
            CommandLink::one_shot(OneShotSender::new(
                channels.command_endpoint(),
                channels.retry_interval(),
                channels.command_connect_wait(),
            )),
            None,
        ),
        CommandMode::Persistent => {
            let sender = Arc::new(LineSender::new(
                channels.command_endpoint(),
                channels.retry_interval(),
            ));
            let keeper = tokio::spawn(keep_connected(
                Arc::clone(&sender),
                channels.retry_interval(),
                shutdown.clone(),
            ));
            (CommandLink::persistent(sender), Some(keeper))
        }
    };

    let (notifications_tx, notifications_rx) = mpsc::channel(FRAME_BUFFER);
    let listener = tokio::spawn(
        LineListener::new(
            Connector::new(channels.notification_endpoint(), channels.retry_interval()),
            channels.retry_interval(),
        )
        .run(notifications_tx, shutdown.clone()),
    );

    let initial = match config.selection.selection_file() {
        Some(file) => file.load().unwrap_or_else(|e| {
            warn!(path = %file.path().display(), error = %e, "Ignoring unreadable selection file");
            None
        }),
        None => None,
    };

    Editor::new(link, view)
        .with_initial(initial)
        .run(notifications_rx, input, shutdown.clone())
        .await;

    shutdown.cancel();
    join_listener("notification", listener).await;
    if let Some(keeper) = keeper {
        let _ = keeper.await;
    }
    Ok(())
}

/// Reconnect a persistent sender whenever its connection drops.
async fn keep_connected(
    sender: Arc<LineSender>,
    retry_interval: std::time::Duration,
    shutdown: CancellationToken,
) {
    loop {
        if !sender.is_connected().await && sender.connect(&shutdown).await.is_err() {
            if shutdown.is_cancelled() {
                break;
            }
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(retry_interval) => {}
        }
    }
    sender.close().await;
    debug!("Command sender stopped");
}

async fn join_listener(channel: &str, listener: JoinHandle<Result<(), ChannelError>>) {
    match listener.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(channel, error = %e, "Listener ended with error"),
        Err(e) => warn!(channel, error = %e, "Listener task failed"),
    }
}
