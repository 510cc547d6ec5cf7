//! Error types
//!
//! One enum per failure class: storage, channel, protocol and domain errors, with
//! `ApiError` as the umbrella the CLI and runtimes return.

use crate::types::RecordId;
use thiserror::Error;

/// Persistence failures (CSV snapshot, selection file)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Connection-level failures on a channel
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel {0} is not connected")]
    NotConnected(String),

    #[error("Frame contains an embedded line break")]
    EmbeddedNewline,

    #[error("Frame exceeds the maximum length of {0} bytes")]
    FrameTooLong(usize),

    #[error("Channel I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed or unrecognized frames
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown command tag: {0}")]
    UnknownTag(String),

    #[error("Frame {tag} is missing field {field}")]
    MissingField { tag: char, field: &'static str },

    #[error("Field {field} is not a numeric id: {value:?}")]
    InvalidId { field: &'static str, value: String },

    #[error("Frame {0} carries an empty name")]
    EmptyName(char),

    #[error("Update frame ids disagree: {0} vs {1}")]
    MismatchedIds(RecordId, RecordId),
}

/// Domain rule violations surfaced to the Directory's user
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("A record with id {0} already exists")]
    DuplicateId(RecordId),

    #[error("No record with id {0}")]
    MissingId(RecordId),

    #[error("Id {0} is outside the reserved range")]
    InvalidId(RecordId),

    #[error("No free id left in the reserved range")]
    IdSpaceExhausted,
}

/// Umbrella error for runtimes and CLI commands
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Channel error: {0}")]
    ChannelError(#[from] ChannelError),

    #[error("Protocol error: {0}")]
    ProtocolError(#[from] ProtocolError),

    #[error("{0}")]
    DomainError(#[from] DomainError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
