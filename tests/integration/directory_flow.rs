use super::{test_config, wait_until, RecordingDisplay};
use rostersync::channel::{Connector, LineListener};
use rostersync::config::AppConfig;
use rostersync::input::InputLines;
use rostersync::protocol::Command;
use rostersync::selection::SelectionFile;
use rostersync::store::persistence::parse_records;
use rostersync::store::RecordStore;
use rostersync::tooling::cli::{run_directory, send_command, DirectoryOptions};
use rostersync::types::Record;
use std::collections::BTreeMap;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

fn spawn_directory(
    config: &AppConfig,
    options: DirectoryOptions,
    display: &RecordingDisplay,
    input: Option<InputLines>,
    shutdown: &CancellationToken,
) -> JoinHandle<RecordStore> {
    let config = config.clone();
    let display = display.clone();
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        run_directory(&config, options, Box::new(display), input, shutdown)
            .await
            .unwrap()
    })
}

#[tokio::test]
async fn sent_commands_are_applied_in_order_and_saved() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    std::fs::write(&config.storage.csv_path, "770000001,Alice\n").unwrap();

    let display = RecordingDisplay::default();
    let (input_tx, input) = InputLines::channel(8);
    let shutdown = CancellationToken::new();
    let directory = spawn_directory(
        &config,
        DirectoryOptions::default(),
        &display,
        Some(input),
        &shutdown,
    );

    for command in [
        Command::Create { id: 770000002, name: "Bob".to_string() },
        Command::Update { id: 770000001, name: "Alicia".to_string() },
        Command::Delete { id: 999 },
        Command::Create { id: 770000002, name: "Bobby".to_string() },
        Command::Save,
    ] {
        send_command(&config, &command).await.unwrap();
    }
    wait_until(|| display.has_notice("Saved")).await;

    assert!(display.has_notice("No record with id 999"));
    assert!(display.has_notice("A record with id 770000002 already exists"));

    input_tx.send("quit".to_string()).await.unwrap();
    let store = directory.await.unwrap();
    assert!(shutdown.is_cancelled());

    let expected: BTreeMap<_, _> = [
        (770000001, "Alicia".to_string()),
        (770000002, "Bob".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(store.as_map(), &expected);
    let saved = std::fs::read_to_string(&config.storage.csv_path).unwrap();
    assert_eq!(parse_records(&saved), expected);
    assert!(!config.channels.command_endpoint().path().exists());
}

#[tokio::test]
async fn malformed_frames_do_not_stop_the_directory() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let display = RecordingDisplay::default();
    let shutdown = CancellationToken::new();
    let directory = spawn_directory(
        &config,
        DirectoryOptions::default(),
        &display,
        None,
        &shutdown,
    );

    let sender = rostersync::channel::OneShotSender::new(
        config.channels.command_endpoint(),
        config.channels.retry_interval(),
        Some(Duration::from_secs(2)),
    );
    for frame in ["X|1", "C|abc|Alice", "U|1|2|Bob", "C|770000001|Alice"] {
        sender.send(frame).await.unwrap();
    }
    wait_until(|| display.last_view().map(|v| v.total) == Some(1)).await;

    shutdown.cancel();
    let store = directory.await.unwrap();
    assert_eq!(store.get(770000001), Some("Alice"));
}

#[tokio::test]
async fn out_of_range_id_is_regenerated_when_confirmed() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let display = RecordingDisplay::default();
    let shutdown = CancellationToken::new();
    let options = DirectoryOptions {
        auto_confirm: true,
        ..Default::default()
    };
    let directory = spawn_directory(&config, options, &display, None, &shutdown);

    send_command(&config, &Command::Create { id: 12, name: "Carol".to_string() })
        .await
        .unwrap();
    wait_until(|| display.last_view().map(|v| v.total) == Some(1)).await;

    shutdown.cancel();
    let store = directory.await.unwrap();
    let record = store.records().next().unwrap();
    assert_eq!(record.name, "Carol");
    assert!((770_000_000..771_000_000).contains(&record.id));
    assert!(display.has_notice("Created Carol (id 12 replaced by"));
}

#[tokio::test]
async fn yes_flag_regenerates_even_with_a_console_attached() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let display = RecordingDisplay::default();
    let (input_tx, input) = InputLines::channel(8);
    drop(input_tx);
    let shutdown = CancellationToken::new();
    let options = DirectoryOptions {
        auto_confirm: true,
        ..Default::default()
    };
    let directory = spawn_directory(&config, options, &display, Some(input), &shutdown);

    send_command(&config, &Command::Create { id: 12, name: "Carol".to_string() })
        .await
        .unwrap();
    wait_until(|| display.last_view().map(|v| v.total) == Some(1)).await;

    shutdown.cancel();
    let store = directory.await.unwrap();
    assert_eq!(store.get(12), None);
    let record = store.records().next().unwrap();
    assert!((770_000_000..771_000_000).contains(&record.id));
}

#[tokio::test]
async fn shutdown_interrupts_pending_regeneration_prompt() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let display = RecordingDisplay::default();
    let (_input_tx, input) = InputLines::channel(8);
    let shutdown = CancellationToken::new();
    let directory = spawn_directory(
        &config,
        DirectoryOptions::default(),
        &display,
        Some(input),
        &shutdown,
    );

    send_command(&config, &Command::Create { id: 12, name: "Carol".to_string() })
        .await
        .unwrap();
    // Nobody answers the prompt.
    tokio::time::sleep(Duration::from_millis(200)).await;

    shutdown.cancel();
    let stopped = tokio::time::timeout(Duration::from_secs(2), directory).await;
    assert!(stopped.is_ok(), "directory kept waiting on the prompt after shutdown");
    assert!(!config.channels.command_endpoint().path().exists());
}

#[tokio::test]
async fn declined_regeneration_keeps_requested_id() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let display = RecordingDisplay::default();
    let shutdown = CancellationToken::new();
    let directory = spawn_directory(&config, DirectoryOptions::default(), &display, None, &shutdown);

    send_command(&config, &Command::Create { id: 12, name: "Carol".to_string() })
        .await
        .unwrap();
    wait_until(|| display.last_view().map(|v| v.total) == Some(1)).await;

    shutdown.cancel();
    let store = directory.await.unwrap();
    assert_eq!(store.get(12), Some("Carol"));
}

#[tokio::test]
async fn selection_is_pushed_to_editor_channel_and_mirrored_to_file() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    std::fs::write(&config.storage.csv_path, "770000001,Bob\n").unwrap();
    let display = RecordingDisplay::default();
    let (input_tx, input) = InputLines::channel(8);
    let shutdown = CancellationToken::new();
    let directory = spawn_directory(
        &config,
        DirectoryOptions::default(),
        &display,
        Some(input),
        &shutdown,
    );

    let (tx, mut rx) = mpsc::channel(8);
    let editor_listener = tokio::spawn(
        LineListener::new(
            Connector::new(
                config.channels.notification_endpoint(),
                config.channels.retry_interval(),
            ),
            config.channels.retry_interval(),
        )
        .run(tx, shutdown.clone()),
    );

    // The editor side may not be connected yet; reselect until a frame arrives.
    let frame = loop {
        input_tx.send("select 770000001".to_string()).await.unwrap();
        match tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
            Ok(Some(frame)) => break frame,
            Ok(None) => panic!("listener stopped"),
            Err(_) => continue,
        }
    };
    assert_eq!(frame, "770000001,Bob");

    let file = SelectionFile::new(config.selection.file.clone().unwrap());
    assert_eq!(file.load().unwrap(), Some(Record::new(770000001, "Bob")));

    send_command(&config, &Command::Delete { id: 770000001 }).await.unwrap();
    wait_until(|| !file.path().exists()).await;

    input_tx.send("quit".to_string()).await.unwrap();
    directory.await.unwrap();
    editor_listener.await.unwrap().unwrap();
}

#[tokio::test]
async fn second_directory_does_not_take_over_running_one() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let display = RecordingDisplay::default();
    let shutdown = CancellationToken::new();
    let first = spawn_directory(&config, DirectoryOptions::default(), &display, None, &shutdown);
    wait_until(|| config.channels.command_endpoint().path().exists()).await;

    let second = run_directory(
        &config,
        DirectoryOptions::default(),
        Box::new(RecordingDisplay::default()),
        None,
        CancellationToken::new(),
    )
    .await;
    assert!(second.is_err());

    send_command(&config, &Command::Create { id: 770000001, name: "Alice".to_string() })
        .await
        .unwrap();
    wait_until(|| display.last_view().map(|v| v.total) == Some(1)).await;

    shutdown.cancel();
    let store = first.await.unwrap();
    assert_eq!(store.get(770000001), Some("Alice"));
}
