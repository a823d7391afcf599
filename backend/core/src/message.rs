use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Update type carrying a freshly received message.
pub const MESSAGE_NEW: &str = "message_new";

/// An inbound chat message as delivered by the message source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: i64,
    /// Conversation the message was posted in; replies go here.
    #[serde(default)]
    pub peer_id: i64,
    #[serde(default)]
    pub from_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Legacy text field, used only when `text` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub date: DateTime<Utc>,
}

impl Message {
    pub fn new(peer_id: i64, text: impl Into<String>) -> Self {
        Self {
            peer_id,
            text: Some(text.into()),
            date: Utc::now(),
            ..Default::default()
        }
    }

    pub fn from_user(mut self, from_id: i64) -> Self {
        self.from_id = from_id;
        self
    }

    /// Text the command engine looks at: `text`, falling back to `body`.
    pub fn content(&self) -> &str {
        self.text
            .as_deref()
            .or(self.body.as_deref())
            .unwrap_or_default()
    }
}

/// One event from the message source's update stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupUpdate {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub group_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Message>,
}

impl GroupUpdate {
    pub fn message_new(group_id: u64, message: Message) -> Self {
        Self {
            kind: MESSAGE_NEW.to_string(),
            group_id,
            object: Some(message),
        }
    }

    /// The carried message, if this is a `message_new` update.
    pub fn new_message(&self) -> Option<&Message> {
        if self.kind != MESSAGE_NEW {
            return None;
        }
        self.object.as_ref()
    }
}
