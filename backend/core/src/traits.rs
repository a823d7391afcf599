use anyhow::Result;
use async_trait::async_trait;

use crate::message::GroupUpdate;

/// Client capability injected into command handlers.
///
/// The engine never constructs one; the host application hands it to the
/// processor and every handler call receives a shared reference to it.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Human-readable client name for logging.
    fn name(&self) -> &str;

    /// Post a text message into the given conversation.
    async fn send_message(&self, peer_id: i64, text: &str) -> Result<()>;
}

/// Transport boundary: something that yields batches of updates.
#[async_trait]
pub trait UpdateSource: Send {
    /// Human-readable source name for logging.
    fn name(&self) -> &str;

    /// Wait for the next batch. `Ok(None)` means the source is exhausted.
    async fn next_batch(&mut self) -> Result<Option<Vec<GroupUpdate>>>;
}
