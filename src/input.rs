//! Shared console input.
//!
//! Console commands and confirmation prompts read from the same line stream, so
//! a prompt raised while the console loop is idle consumes the next typed line.

use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Cloneable handle to one stream of input lines
#[derive(Clone)]
pub struct InputLines {
    lines: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl InputLines {
    pub fn new(lines: mpsc::Receiver<String>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
        }
    }

    /// Input fed from a channel; used by tests and scripted frontends.
    pub fn channel(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }

    /// Lines typed on stdin.
    ///
    /// Reading happens on a plain thread so a blocked read never holds up
    /// runtime shutdown.
    pub fn stdin() -> Self {
        let (tx, input) = Self::channel(16);
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            debug!("Console input closed");
        });
        input
    }

    /// Next line, or `None` once input is closed. Cancel-safe.
    pub async fn next_line(&self) -> Option<String> {
        self.lines.lock().await.recv().await
    }
}
