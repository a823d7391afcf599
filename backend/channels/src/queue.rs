/// In-process update source fed through a bounded channel.
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use chatcmd_core::{GroupUpdate, UpdateSource};

pub struct QueueSource {
    rx: mpsc::Receiver<Vec<GroupUpdate>>,
}

impl QueueSource {
    /// Create a source and the sender that feeds it. The source ends once
    /// every sender is dropped and the queue is drained.
    pub fn channel(buffer: usize) -> (mpsc::Sender<Vec<GroupUpdate>>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

#[async_trait]
impl UpdateSource for QueueSource {
    fn name(&self) -> &str {
        "queue"
    }

    async fn next_batch(&mut self) -> Result<Option<Vec<GroupUpdate>>> {
        Ok(self.rx.recv().await)
    }
}
