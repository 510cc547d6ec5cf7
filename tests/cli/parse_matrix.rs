use clap::{CommandFactory, Parser};
use rostersync::tooling::cli::{Cli, Commands, SendCommands};

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["rostersync", "directory"],
        vec!["rostersync", "directory", "--csv", "staff.csv", "--filter", "al", "--yes"],
        vec!["rostersync", "editor"],
        vec!["rostersync", "--socket-dir", "/tmp/rs", "editor"],
        vec!["rostersync", "send", "create", "770000001", "Alice"],
        vec!["rostersync", "send", "update", "770000001", "Alice Smith"],
        vec!["rostersync", "send", "delete", "770000001"],
        vec!["rostersync", "send", "save"],
        vec!["rostersync", "list", "--format", "json"],
        vec!["rostersync", "--log-level", "debug", "--log-format", "json", "config"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_incomplete_commands() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["rostersync"],
        vec!["rostersync", "send"],
        vec!["rostersync", "send", "create", "770000001"],
        vec!["rostersync", "send", "delete", "abc"],
        vec!["rostersync", "send", "update", "770000001"],
        vec!["rostersync", "serve"],
    ];

    for args in cases {
        assert!(
            Cli::try_parse_from(args.clone()).is_err(),
            "expected parse failure for args: {args:?}"
        );
    }
}

#[test]
fn send_delete_parses_negative_id() {
    let cli = Cli::try_parse_from(["rostersync", "send", "delete", "-5"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Send {
            command: SendCommands::Delete { id: -5 }
        }
    );
}

#[test]
fn help_lists_every_subcommand() {
    let help = Cli::command().render_help().to_string();
    for name in ["directory", "editor", "send", "list", "config"] {
        assert!(help.contains(name), "help is missing {name}: {help}");
    }
}
