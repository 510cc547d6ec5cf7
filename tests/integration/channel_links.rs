use rostersync::channel::{Acceptor, ChannelEndpoint, Connector, LineListener, LineNotifier, LineSender};
use rostersync::links::{CommandLink, NotificationLink, SelectionSink};
use rostersync::protocol::Command;
use rostersync::types::Record;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const RETRY: Duration = Duration::from_millis(10);

#[tokio::test]
async fn notification_without_editor_is_a_silent_no_op() {
    let temp = TempDir::new().unwrap();
    let shutdown = CancellationToken::new();
    let notifier = LineNotifier::bind(
        ChannelEndpoint::new(temp.path(), "MainAppPipe"),
        RETRY,
        shutdown.clone(),
    )
    .unwrap();
    let link = NotificationLink::new(notifier);

    assert!(!link.publish(&Record::new(770000001, "Bob")).await);
    shutdown.cancel();
}

#[tokio::test]
async fn notification_reaches_connected_editor_and_newest_editor_wins() {
    let temp = TempDir::new().unwrap();
    let endpoint = ChannelEndpoint::new(temp.path(), "MainAppPipe");
    let shutdown = CancellationToken::new();
    let link = NotificationLink::new(
        LineNotifier::bind(endpoint.clone(), RETRY, shutdown.clone()).unwrap(),
    );

    let first_shutdown = CancellationToken::new();
    let (first_tx, mut first_rx) = mpsc::channel(8);
    let first = tokio::spawn(
        LineListener::new(Connector::new(endpoint.clone(), RETRY), RETRY)
            .run(first_tx, first_shutdown.clone()),
    );
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !link.is_connected().await {
        assert!(tokio::time::Instant::now() < deadline, "editor never connected");
        tokio::time::sleep(RETRY).await;
    }
    assert!(link.publish(&Record::new(770000001, "Bob, Jr.")).await);
    assert_eq!(first_rx.recv().await.unwrap(), "770000001,Bob, Jr.");
    first_shutdown.cancel();
    first.await.unwrap().unwrap();

    let (second_tx, mut second_rx) = mpsc::channel(8);
    let second = tokio::spawn(
        LineListener::new(Connector::new(endpoint, RETRY), RETRY).run(second_tx, shutdown.clone()),
    );
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !link.publish(&Record::new(770000002, "Dana")).await {
        assert!(tokio::time::Instant::now() < deadline, "second editor never connected");
        tokio::time::sleep(RETRY).await;
    }
    assert_eq!(second_rx.recv().await.unwrap(), "770000002,Dana");

    shutdown.cancel();
    second.await.unwrap().unwrap();
}

#[tokio::test]
async fn persistent_command_link_delivers_in_call_order() {
    let temp = TempDir::new().unwrap();
    let endpoint = ChannelEndpoint::new(temp.path(), "AdminToMainPipe");
    let shutdown = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(64);
    let listener = tokio::spawn(
        LineListener::new(Acceptor::bind(endpoint.clone()).unwrap(), RETRY).run(tx, shutdown.clone()),
    );

    let sender = Arc::new(LineSender::new(endpoint, RETRY));
    sender.connect(&shutdown).await.unwrap();
    let link = CommandLink::persistent(Arc::clone(&sender));

    let commands = vec![
        Command::Create { id: 770000001, name: "Alice".to_string() },
        Command::Update { id: 770000001, name: "Alicia".to_string() },
        Command::Delete { id: 770000001 },
        Command::Save,
    ];
    for command in &commands {
        link.submit(command).await.unwrap();
    }
    for command in &commands {
        assert_eq!(rx.recv().await.unwrap(), command.to_frame());
    }

    sender.close().await;
    shutdown.cancel();
    listener.await.unwrap().unwrap();
}
