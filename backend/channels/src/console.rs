/// Chat clients that stay on this machine.
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::debug;

use chatcmd_core::ChatClient;

/// Prints every outbound message to stdout.
#[derive(Debug, Default)]
pub struct ConsoleClient;

#[async_trait]
impl ChatClient for ConsoleClient {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_message(&self, peer_id: i64, text: &str) -> Result<()> {
        debug!(peer_id, "Sending reply");
        println!("[{peer_id}] {text}");
        Ok(())
    }
}

/// Records outbound messages in memory.
#[derive(Debug, Default)]
pub struct MemoryClient {
    sent: Mutex<Vec<(i64, String)>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Texts sent so far, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }
}

#[async_trait]
impl ChatClient for MemoryClient {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send_message(&self, peer_id: i64, text: &str) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("sent message log poisoned"))?
            .push((peer_id, text.to_string()));
        Ok(())
    }
}
