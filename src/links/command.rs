//! Command submission from the Editor.

use crate::channel::{LineSender, OneShotSender};
use crate::error::ChannelError;
use crate::protocol::Command;
use std::sync::Arc;
use tracing::info;

/// Carries command frames to the Directory
pub enum CommandLink {
    /// New connection per command
    OneShot(OneShotSender),
    /// One held connection; the caller drives `LineSender::connect`
    Persistent(Arc<LineSender>),
}

impl CommandLink {
    pub fn one_shot(sender: OneShotSender) -> Self {
        CommandLink::OneShot(sender)
    }

    pub fn persistent(sender: Arc<LineSender>) -> Self {
        CommandLink::Persistent(sender)
    }

    pub async fn submit(&self, command: &Command) -> Result<(), ChannelError> {
        let frame = command.to_frame();
        match self {
            CommandLink::OneShot(sender) => sender.send(&frame).await?,
            CommandLink::Persistent(sender) => sender.send(&frame).await?,
        }
        info!(tag = %command.tag(), "Command sent");
        Ok(())
    }
}

