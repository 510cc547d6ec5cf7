//! Outbound side of a channel: persistent and one-shot senders.

use super::endpoint::ChannelEndpoint;
use super::frame::{check_frame, line_codec, map_codec_error};
use super::source::Connector;
use crate::error::ChannelError;
use futures::SinkExt;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Persistent sender: one connection held for the endpoint's lifetime.
///
/// Sends are serialized, so frames arrive in call order, and each frame is
/// flushed before `send` returns.
pub struct LineSender {
    connector: Connector,
    writer: Mutex<Option<FramedWrite<UnixStream, LinesCodec>>>,
}

impl LineSender {
    pub fn new(endpoint: ChannelEndpoint, retry_interval: Duration) -> Self {
        Self {
            connector: Connector::new(endpoint, retry_interval),
            writer: Mutex::new(None),
        }
    }

    fn channel(&self) -> &str {
        self.connector.endpoint().name()
    }

    /// Wait until the peer is listening, then hold the connection.
    pub async fn connect(&self, shutdown: &CancellationToken) -> Result<(), ChannelError> {
        let stream = tokio::select! {
            _ = shutdown.cancelled() => {
                return Err(ChannelError::NotConnected(self.channel().to_string()));
            }
            stream = self.connector.connect() => stream?,
        };
        *self.writer.lock().await = Some(FramedWrite::new(stream, line_codec()));
        info!(channel = self.channel(), "Sender connected");
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    /// Write one frame. Fails with `NotConnected` if there is no live connection.
    pub async fn send(&self, frame: &str) -> Result<(), ChannelError> {
        check_frame(frame)?;
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(ChannelError::NotConnected(self.channel().to_string()));
        };
        if let Err(e) = writer.send(frame).await {
            warn!(channel = self.channel(), error = %map_codec_error(e), "Write failed, dropping connection");
            *guard = None;
            return Err(ChannelError::NotConnected(self.channel().to_string()));
        }
        Ok(())
    }

    /// Close the connection; later sends fail with `NotConnected`.
    pub async fn close(&self) {
        if let Some(writer) = self.writer.lock().await.take() {
            let mut stream = writer.into_inner();
            let _ = stream.shutdown().await;
            debug!(channel = self.channel(), "Sender closed");
        }
    }
}

/// Opens a fresh connection per frame, writes it, and closes.
#[derive(Debug, Clone)]
pub struct OneShotSender {
    connector: Connector,
    connect_wait: Option<Duration>,
}

impl OneShotSender {
    /// `connect_wait` bounds how long to wait for the peer; `None` waits forever.
    pub fn new(
        endpoint: ChannelEndpoint,
        retry_interval: Duration,
        connect_wait: Option<Duration>,
    ) -> Self {
        Self {
            connector: Connector::new(endpoint, retry_interval),
            connect_wait,
        }
    }

    fn channel(&self) -> &str {
        self.connector.endpoint().name()
    }

    pub async fn send(&self, frame: &str) -> Result<(), ChannelError> {
        check_frame(frame)?;

        let connected = match self.connect_wait {
            Some(wait) => match tokio::time::timeout(wait, self.connector.connect()).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(channel = self.channel(), wait_ms = wait.as_millis() as u64, "Peer never listened");
                    return Err(ChannelError::NotConnected(self.channel().to_string()));
                }
            },
            None => self.connector.connect().await,
        };
        let stream = connected.map_err(|e| {
            debug!(channel = self.channel(), error = %e, "Connect failed");
            ChannelError::NotConnected(self.channel().to_string())
        })?;

        let mut writer = FramedWrite::new(stream, line_codec());
        writer.send(frame).await.map_err(map_codec_error)?;
        let mut stream = writer.into_inner();
        stream.shutdown().await?;
        Ok(())
    }
}
