/// Line-oriented update source.
///
/// Each non-empty line becomes a one-update batch. A line holding a JSON
/// object is decoded as a raw [`GroupUpdate`]; anything else is wrapped as a
/// `message_new` update addressed to the configured peer.
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, warn};

use chatcmd_core::{GroupUpdate, Message, UpdateSource};

pub struct LineSource<R> {
    lines: Lines<R>,
    group_id: u64,
    peer_id: i64,
    from_id: i64,
    next_id: i64,
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R, group_id: u64, peer_id: i64) -> Self {
        Self {
            lines: reader.lines(),
            group_id,
            peer_id,
            from_id: peer_id,
            next_id: 1,
        }
    }

    /// Sender id stamped on plain-text messages. Defaults to the peer id.
    pub fn from_user(mut self, from_id: i64) -> Self {
        self.from_id = from_id;
        self
    }

    fn to_update(&mut self, line: &str) -> GroupUpdate {
        if line.starts_with('{') {
            match serde_json::from_str::<GroupUpdate>(line) {
                Ok(update) => return update,
                Err(e) => warn!(error = %e, "Line is not a valid update, treating it as text"),
            }
        }
        let mut message = Message::new(self.peer_id, line).from_user(self.from_id);
        message.id = self.next_id;
        self.next_id += 1;
        GroupUpdate::message_new(self.group_id, message)
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> UpdateSource for LineSource<R> {
    fn name(&self) -> &str {
        "lines"
    }

    async fn next_batch(&mut self) -> Result<Option<Vec<GroupUpdate>>> {
        loop {
            let Some(line) = self
                .lines
                .next_line()
                .await
                .context("Failed to read input line")?
            else {
                debug!("Line source reached end of input");
                return Ok(None);
            };
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(vec![self.to_update(line)]));
        }
    }
}
