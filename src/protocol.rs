//! Wire protocol
//!
//! Command frames (Editor -> Directory) are `|`-delimited with a one-letter tag:
//!
//! | Tag | Fields              |
//! |-----|---------------------|
//! | `C` | id, name            |
//! | `U` | id, id, name        |
//! | `D` | id                  |
//! | `S` | none                |
//!
//! Selection frames (Directory -> Editor) are `<id>,<name>`, or a bare `<id>`.
//! Framing (newline termination) is the channel's job, not this module's.

use crate::error::ProtocolError;
use crate::types::{Record, RecordId};

/// Command sent by the Editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create { id: RecordId, name: String },
    Update { id: RecordId, name: String },
    Delete { id: RecordId },
    Save,
}

impl Command {
    pub fn tag(&self) -> char {
        match self {
            Command::Create { .. } => 'C',
            Command::Update { .. } => 'U',
            Command::Delete { .. } => 'D',
            Command::Save => 'S',
        }
    }

    /// Parse one frame (without its line terminator).
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let frame = frame.trim();
        if frame.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let (tag, rest) = match frame.split_once('|') {
            Some((tag, rest)) => (tag, Some(rest)),
            None => (frame, None),
        };

        match tag {
            "C" => {
                let mut fields = rest.unwrap_or_default().splitn(2, '|');
                let id = parse_id(fields.next(), 'C', "id")?;
                let name = parse_name(fields.next(), 'C')?;
                Ok(Command::Create { id, name })
            }
            "U" => {
                let mut fields = rest.unwrap_or_default().splitn(3, '|');
                let id = parse_id(fields.next(), 'U', "id")?;
                let repeated = parse_id(fields.next(), 'U', "repeated id")?;
                if id != repeated {
                    return Err(ProtocolError::MismatchedIds(id, repeated));
                }
                let name = parse_name(fields.next(), 'U')?;
                Ok(Command::Update { id, name })
            }
            "D" => {
                let id = parse_id(rest.map(|r| r.split('|').next().unwrap_or(r)), 'D', "id")?;
                Ok(Command::Delete { id })
            }
            "S" => Ok(Command::Save),
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }

    /// Render as a frame (without line terminator).
    pub fn to_frame(&self) -> String {
        match self {
            Command::Create { id, name } => format!("C|{}|{}", id, name),
            Command::Update { id, name } => format!("U|{}|{}|{}", id, id, name),
            Command::Delete { id } => format!("D|{}", id),
            Command::Save => "S".to_string(),
        }
    }
}

fn parse_id(
    field: Option<&str>,
    tag: char,
    name: &'static str,
) -> Result<RecordId, ProtocolError> {
    let raw = field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ProtocolError::MissingField { tag, field: name })?;
    raw.parse::<RecordId>().map_err(|_| ProtocolError::InvalidId {
        field: name,
        value: raw.to_string(),
    })
}

fn parse_name(field: Option<&str>, tag: char) -> Result<String, ProtocolError> {
    let raw = field.ok_or(ProtocolError::MissingField { tag, field: "name" })?;
    if raw.trim().is_empty() {
        return Err(ProtocolError::EmptyName(tag));
    }
    Ok(raw.to_string())
}

/// Selection pushed by the Directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Full `(id, name)` pair
    Record(Record),
    /// Id only; the receiver keeps its current name
    Id(RecordId),
}

impl Selection {
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let frame = frame.trim_end_matches(['\r', '\n']);
        if frame.trim().is_empty() {
            return Err(ProtocolError::Empty);
        }
        match frame.split_once(',') {
            Some((id, name)) => {
                let id = id.trim().parse::<RecordId>().map_err(|_| ProtocolError::InvalidId {
                    field: "id",
                    value: id.to_string(),
                })?;
                Ok(Selection::Record(Record::new(id, name)))
            }
            None => {
                let id = frame.trim().parse::<RecordId>().map_err(|_| ProtocolError::InvalidId {
                    field: "id",
                    value: frame.to_string(),
                })?;
                Ok(Selection::Id(id))
            }
        }
    }

    pub fn to_frame(record: &Record) -> String {
        format!("{},{}", record.id, record.name)
    }
}
