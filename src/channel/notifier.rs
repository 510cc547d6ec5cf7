//! Accepting pusher: binds a channel, accepts a peer, and writes frames to it.
//!
//! The Directory owns the notification socket but is the side that writes. The
//! newest peer replaces any previous one; a background watcher notices when the
//! peer hangs up so `send` reports `NotConnected` without having to write first.

use super::endpoint::ChannelEndpoint;
use super::frame::{check_frame, line_codec, map_codec_error};
use super::source::{Acceptor, StreamSource};
use crate::error::ChannelError;
use futures::SinkExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Peer {
    generation: u64,
    frames: FramedWrite<OwnedWriteHalf, LinesCodec>,
}

type PeerSlot = Arc<Mutex<Option<Peer>>>;

pub struct LineNotifier {
    endpoint: ChannelEndpoint,
    peer: PeerSlot,
    accept_task: JoinHandle<()>,
}

impl LineNotifier {
    /// Bind the endpoint and start accepting peers in the background.
    pub fn bind(
        endpoint: ChannelEndpoint,
        retry_interval: Duration,
        shutdown: CancellationToken,
    ) -> Result<Self, ChannelError> {
        let acceptor = Acceptor::bind(endpoint.clone())?;
        let peer: PeerSlot = Arc::new(Mutex::new(None));
        let accept_task = tokio::spawn(accept_loop(
            acceptor,
            Arc::clone(&peer),
            retry_interval,
            shutdown,
        ));
        Ok(Self {
            endpoint,
            peer,
            accept_task,
        })
    }

    pub fn endpoint(&self) -> &ChannelEndpoint {
        &self.endpoint
    }

    pub async fn is_connected(&self) -> bool {
        self.peer.lock().await.is_some()
    }

    /// Write one frame to the current peer.
    pub async fn send(&self, frame: &str) -> Result<(), ChannelError> {
        check_frame(frame)?;
        let mut slot = self.peer.lock().await;
        let Some(peer) = slot.as_mut() else {
            return Err(ChannelError::NotConnected(self.endpoint.name().to_string()));
        };
        if let Err(e) = peer.frames.send(frame).await {
            warn!(channel = self.endpoint.name(), error = %map_codec_error(e), "Write failed, dropping peer");
            *slot = None;
            return Err(ChannelError::NotConnected(self.endpoint.name().to_string()));
        }
        Ok(())
    }
}

impl Drop for LineNotifier {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(
    mut acceptor: Acceptor,
    peer: PeerSlot,
    retry_interval: Duration,
    shutdown: CancellationToken,
) {
    let channel = acceptor.endpoint().name().to_string();
    let mut generation: u64 = 0;
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = acceptor.next_stream() => next,
        };
        match next {
            Ok(stream) => {
                generation += 1;
                let (read, write) = stream.into_split();
                let replaced = peer
                    .lock()
                    .await
                    .replace(Peer {
                        generation,
                        frames: FramedWrite::new(write, line_codec()),
                    })
                    .is_some();
                info!(channel = %channel, replaced, "Peer connected");
                tokio::spawn(watch_hangup(
                    read,
                    generation,
                    Arc::clone(&peer),
                    channel.clone(),
                    shutdown.clone(),
                ));
            }
            Err(e) => {
                warn!(channel = %channel, error = %e, "Accept failed");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(retry_interval) => {}
                }
            }
        }
    }
    peer.lock().await.take();
    debug!(channel = %channel, "Notifier stopped");
}

/// Clear the slot once the peer of `generation` closes its end.
async fn watch_hangup(
    mut read: OwnedReadHalf,
    generation: u64,
    peer: PeerSlot,
    channel: String,
    shutdown: CancellationToken,
) {
    let mut buf = [0u8; 256];
    loop {
        let read_result = tokio::select! {
            _ = shutdown.cancelled() => return,
            n = read.read(&mut buf) => n,
        };
        match read_result {
            Ok(0) | Err(_) => break,
            // Peers never write on this channel; ignore stray bytes.
            Ok(_) => continue,
        }
    }

    let mut slot = peer.lock().await;
    if slot.as_ref().map(|p| p.generation) == Some(generation) {
        *slot = None;
        info!(channel = %channel, "Peer disconnected");
    }
}
