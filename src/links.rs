//! Logical links built on channels.
//!
//! - `NotificationLink`: Directory -> Editor selection pushes, best effort.
//! - `CommandLink`: Editor -> Directory command frames.

mod command;
mod notification;

pub use command::CommandLink;
pub use notification::{NotificationLink, SelectionSink};
