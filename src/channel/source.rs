//! Where a listener gets its next connection from.

use super::endpoint::ChannelEndpoint;
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

/// Produces one connected stream at a time
#[async_trait]
pub trait StreamSource: Send {
    fn endpoint(&self) -> &ChannelEndpoint;

    /// Wait for the next peer. May suspend indefinitely.
    async fn next_stream(&mut self) -> io::Result<UnixStream>;
}

/// Server side: binds the channel socket and accepts peers
pub struct Acceptor {
    endpoint: ChannelEndpoint,
    listener: UnixListener,
}

impl Acceptor {
    /// Bind the endpoint, replacing a stale socket file left by a previous run.
    ///
    /// Fails with `AddrInUse` when another process is still accepting on it.
    pub fn bind(endpoint: ChannelEndpoint) -> io::Result<Self> {
        let path = endpoint.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if path.exists() {
            match std::os::unix::net::UnixStream::connect(path) {
                Ok(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("{} is in use by a running process", path.display()),
                    ));
                }
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                    debug!(path = %path.display(), "Removing stale socket file");
                    std::fs::remove_file(path)?;
                }
                Err(e) => return Err(e),
            }
        }
        let listener = UnixListener::bind(path)?;
        info!(channel = endpoint.name(), path = %path.display(), "Channel bound");
        Ok(Self { endpoint, listener })
    }
}

#[async_trait]
impl StreamSource for Acceptor {
    fn endpoint(&self) -> &ChannelEndpoint {
        &self.endpoint
    }

    async fn next_stream(&mut self) -> io::Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().await?;
        Ok(stream)
    }
}

impl Drop for Acceptor {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(self.endpoint.path()) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.endpoint.path().display(), error = %e, "Failed to remove socket file");
            }
        }
    }
}

/// Client side: connects to the channel socket, retrying until the peer listens
#[derive(Debug, Clone)]
pub struct Connector {
    endpoint: ChannelEndpoint,
    retry_interval: Duration,
}

impl Connector {
    pub fn new(endpoint: ChannelEndpoint, retry_interval: Duration) -> Self {
        Self {
            endpoint,
            retry_interval,
        }
    }

    pub fn endpoint(&self) -> &ChannelEndpoint {
        &self.endpoint
    }

    /// Connect, sleeping between attempts while the socket is absent or refusing.
    pub async fn connect(&self) -> io::Result<UnixStream> {
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            match UnixStream::connect(self.endpoint.path()).await {
                Ok(stream) => {
                    debug!(channel = self.endpoint.name(), attempts, "Connected");
                    return Ok(stream);
                }
                Err(e) if is_peer_absent(&e) => {
                    if attempts == 1 {
                        debug!(channel = self.endpoint.name(), "Waiting for peer to listen");
                    }
                    tokio::time::sleep(self.retry_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl StreamSource for Connector {
    fn endpoint(&self) -> &ChannelEndpoint {
        &self.endpoint
    }

    async fn next_stream(&mut self) -> io::Result<UnixStream> {
        self.connect().await
    }
}

fn is_peer_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
    )
}
