use rostersync::config::AppConfig;
use rostersync::error::{ApiError, ChannelError};
use rostersync::tooling::cli::{CliContext, Commands, SendCommands};
use tempfile::TempDir;

fn context(temp: &TempDir) -> CliContext {
    let mut config = AppConfig::default();
    config.channels.socket_dir = Some(temp.path().join("sockets"));
    config.channels.retry_interval_ms = 10;
    config.channels.command_connect_wait_ms = 50;
    config.storage.csv_path = temp.path().join("staff.csv");
    config.selection.enabled = false;
    std::fs::write(
        &config.storage.csv_path,
        "770000002,alice\n770000001,Bob\nbroken line\n770000010,Albert\n",
    )
    .unwrap();
    CliContext::from_config(config)
}

#[tokio::test]
async fn list_prints_sorted_text_table() {
    let temp = TempDir::new().unwrap();
    let output = context(&temp)
        .execute(&Commands::List {
            csv: None,
            filter: None,
            format: "text".to_string(),
        })
        .await
        .unwrap();

    assert!(output.contains("3 records"));
    let bob = output.find("Bob").unwrap();
    let alice = output.find("alice").unwrap();
    let albert = output.find("Albert").unwrap();
    assert!(bob < alice && alice < albert);
}

#[tokio::test]
async fn list_filters_and_renders_json() {
    let temp = TempDir::new().unwrap();
    let output = context(&temp)
        .execute(&Commands::List {
            csv: None,
            filter: Some("AL".to_string()),
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["total"], 3);
    assert_eq!(value["filter"], "AL");
    let ids: Vec<i64> = value["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![770000002, 770000010]);
}

#[tokio::test]
async fn list_rejects_unknown_format() {
    let temp = TempDir::new().unwrap();
    let result = context(&temp)
        .execute(&Commands::List {
            csv: None,
            filter: None,
            format: "yaml".to_string(),
        })
        .await;
    assert!(matches!(result, Err(ApiError::ConfigError(_))));
}

#[tokio::test]
async fn config_prints_effective_settings() {
    let temp = TempDir::new().unwrap();
    let output = context(&temp).execute(&Commands::Config).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["channels"]["command"], "AdminToMainPipe");
    assert_eq!(value["channels"]["command_mode"], "one_shot");
    assert_eq!(value["ids"]["on_decline"], "pass_through");
}

#[tokio::test]
async fn send_without_directory_is_not_connected() {
    let temp = TempDir::new().unwrap();
    let result = context(&temp)
        .execute(&Commands::Send {
            command: SendCommands::Save,
        })
        .await;
    assert!(matches!(
        result,
        Err(ApiError::ChannelError(ChannelError::NotConnected(_)))
    ));
}

#[tokio::test]
async fn config_file_overrides_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");
    std::fs::write(
        &path,
        "[channels]\ncommand = \"CustomPipe\"\ncommand_mode = \"persistent\"\n\n[ids]\non_decline = \"reject\"\n",
    )
    .unwrap();

    let context = CliContext::new(Some(path), Some(temp.path().join("sockets"))).unwrap();
    let config = context.config();
    assert_eq!(config.channels.command, "CustomPipe");
    assert_eq!(config.channels.notification, "MainAppPipe");
    assert_eq!(config.channels.socket_dir, Some(temp.path().join("sockets")));
    assert_eq!(
        config.ids.on_decline,
        rostersync::ids::DeclinePolicy::Reject
    );
}

#[test]
fn invalid_config_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.toml");
    std::fs::write(&path, "[ids]\nspan = 0\n").unwrap();
    assert!(matches!(
        CliContext::new(Some(path), None),
        Err(ApiError::ConfigError(_))
    ));
}
