//! rostersync: a staff directory kept in sync between two processes
//!
//! A Directory process owns the authoritative `id -> name` records and applies
//! commands an Editor process sends over a local channel. Selection changes flow
//! the other way on a second channel.

pub mod channel;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod ids;
pub mod input;
pub mod links;
pub mod logging;
pub mod protocol;
pub mod selection;
pub mod store;
pub mod tooling;
pub mod types;
pub mod views;
