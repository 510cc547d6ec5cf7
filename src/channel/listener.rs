//! Inbound side of a channel.

use super::frame::FrameDecoder;
use super::source::StreamSource;
use crate::error::ChannelError;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reads frames from one peer at a time and forwards them, in order, to a sink.
///
/// A disconnect or read error only ends the current peer; the listener then waits
/// for the next one. It stops on shutdown or when the sink is closed.
pub struct LineListener<S: StreamSource> {
    source: S,
    retry_interval: Duration,
}

impl<S: StreamSource> LineListener<S> {
    pub fn new(source: S, retry_interval: Duration) -> Self {
        Self {
            source,
            retry_interval,
        }
    }

    pub async fn run(
        mut self,
        sink: mpsc::Sender<String>,
        shutdown: CancellationToken,
    ) -> Result<(), ChannelError> {
        let channel = self.source.endpoint().name().to_string();
        info!(channel = %channel, "Listener started");

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = self.source.next_stream() => next,
            };

            let stream = match next {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(channel = %channel, error = %e, "Failed to obtain connection");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_interval) => continue,
                    }
                }
            };
            info!(channel = %channel, "Peer connected");

            let mut frames = FramedRead::new(stream, FrameDecoder::new());
            loop {
                let frame = tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!(channel = %channel, "Listener stopped");
                        return Ok(());
                    }
                    frame = frames.next() => frame,
                };

                match frame {
                    Some(Ok(line)) => {
                        if sink.send(line).await.is_err() {
                            debug!(channel = %channel, "Frame sink closed");
                            return Ok(());
                        }
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        warn!(channel = %channel, error = %e, "Read failed, dropping peer");
                        break;
                    }
                    // Over-long lines are skipped inside the decoder.
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => continue,
                    None => {
                        info!(channel = %channel, "Peer disconnected");
                        break;
                    }
                }
            }
        }

        info!(channel = %channel, "Listener stopped");
        Ok(())
    }
}
