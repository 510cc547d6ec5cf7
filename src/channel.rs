//! Channels: duplex, newline-framed local socket links.
//!
//! A named channel maps to a Unix domain socket. Listeners read frames until the
//! peer goes away and then wait for the next peer; senders write one frame per
//! call and report `NotConnected` instead of blocking when no peer is attached.

mod endpoint;
mod frame;
mod listener;
mod notifier;
mod sender;
mod source;

pub use endpoint::{ChannelEndpoint, COMMAND_CHANNEL, NOTIFICATION_CHANNEL};
pub use frame::{check_frame, line_codec, FrameDecoder, MAX_FRAME_LEN};
pub use listener::LineListener;
pub use notifier::LineNotifier;
pub use sender::{LineSender, OneShotSender};
pub use source::{Acceptor, Connector, StreamSource};
