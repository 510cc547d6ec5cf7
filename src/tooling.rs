//! Tooling & Integration Layer
//!
//! The `rostersync` command line and the console frontends it drives.

pub mod cli;
pub mod console;

pub use cli::{Cli, CliContext, Commands, SendCommands};
pub use console::{ConsoleDisplay, LineConfirm};
