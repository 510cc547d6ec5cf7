use super::{test_config, wait_until, RecordingDisplay, RecordingView};
use rostersync::config::CommandMode;
use rostersync::input::InputLines;
use rostersync::selection::SelectionFile;
use rostersync::tooling::cli::{run_directory, run_editor, DirectoryOptions};
use rostersync::types::Record;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

async fn editor_round_trip(mode: CommandMode) {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(temp.path());
    config.channels.command_mode = mode;
    std::fs::write(&config.storage.csv_path, "770000001,Bob\n770000002,Dana\n").unwrap();

    let display = RecordingDisplay::default();
    let (directory_tx, directory_input) = InputLines::channel(8);
    let directory_shutdown = CancellationToken::new();
    let directory = tokio::spawn({
        let config = config.clone();
        let display = display.clone();
        let shutdown = directory_shutdown.clone();
        async move {
            run_directory(
                &config,
                DirectoryOptions::default(),
                Box::new(display),
                Some(directory_input),
                shutdown,
            )
            .await
            .unwrap()
        }
    });

    let view = RecordingView::default();
    let (editor_tx, editor_input) = InputLines::channel(8);
    let editor_shutdown = CancellationToken::new();
    let editor = tokio::spawn({
        let config = config.clone();
        let view = view.clone();
        let shutdown = editor_shutdown.clone();
        async move {
            run_editor(&config, Box::new(view), Some(editor_input), shutdown)
                .await
                .unwrap()
        }
    });

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while view.last_shown() != Some(Record::new(770000002, "Dana")) {
        assert!(tokio::time::Instant::now() < deadline, "selection never reached the editor");
        directory_tx.send("select 770000002".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // A persistent link may still be connecting; resending the same rename is harmless.
    let renamed = Some(Record::new(770000002, "Danielle"));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while view.last_shown() != renamed {
        assert!(tokio::time::Instant::now() < deadline, "rename never came back");
        editor_tx.send("update Danielle".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let last = display.last_view().unwrap();
    assert!(last.records.contains(&Record::new(770000002, "Danielle")));

    editor_tx.send("quit".to_string()).await.unwrap();
    editor.await.unwrap();
    assert!(editor_shutdown.is_cancelled());

    directory_tx.send("quit".to_string()).await.unwrap();
    let store = directory.await.unwrap();
    assert_eq!(store.get(770000002), Some("Danielle"));
    assert_eq!(store.get(770000001), Some("Bob"));
}

#[tokio::test]
async fn editor_updates_selected_record_over_one_shot_link() {
    editor_round_trip(CommandMode::OneShot).await;
}

#[tokio::test]
async fn editor_updates_selected_record_over_persistent_link() {
    editor_round_trip(CommandMode::Persistent).await;
}

#[tokio::test]
async fn editor_starts_from_selection_file_and_reports_missing_directory() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(temp.path());
    config.channels.command_connect_wait_ms = 50;
    SelectionFile::new(config.selection.file.clone().unwrap())
        .save(Some(&Record::new(770000042, "Eve")))
        .unwrap();

    let view = RecordingView::default();
    let (editor_tx, editor_input) = InputLines::channel(8);
    let shutdown = CancellationToken::new();
    let editor = tokio::spawn({
        let config = config.clone();
        let view = view.clone();
        let shutdown = shutdown.clone();
        async move {
            run_editor(&config, Box::new(view), Some(editor_input), shutdown)
                .await
                .unwrap()
        }
    });

    wait_until(|| view.last_shown() == Some(Record::new(770000042, "Eve"))).await;
    editor_tx.send("delete".to_string()).await.unwrap();
    wait_until(|| {
        view.notices
            .lock()
            .iter()
            .any(|n| n == "Directory is not running")
    })
    .await;

    editor_tx.send("quit".to_string()).await.unwrap();
    editor.await.unwrap();
}
