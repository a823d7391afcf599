//! chatcmd configuration schema.
//!
//! The file schema is fully optional (`Option` everywhere) so partial files
//! parse; [`crate::defaults`] fills the gaps and [`BotConfig::commands_config`]
//! produces the resolved runtime view.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults::{DEFAULT_BACKOFF_INITIAL_SECS, DEFAULT_BACKOFF_MAX_SECS, DEFAULT_PREFIX};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root of the YAML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Command recognition settings
    #[serde(default)]
    pub commands: CommandsSection,

    /// Message source settings, passed through to the transport
    #[serde(default)]
    pub source: SourceConfig,

    /// Polling loop behaviour
    #[serde(default)]
    pub poll: PollConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandsSection {
    /// Accepted command prefixes, tried in order.
    #[serde(default)]
    pub prefixes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_mode: Option<PrefixMode>,
}

/// How the matched prefix is removed from the command word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrefixMode {
    /// Strip the prefix only from the start of the command word.
    #[default]
    Leading,
    /// Remove the first occurrence of the first prefix found anywhere in the
    /// command word. Kept for compatibility with older bots.
    FirstOccurrence,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// Group/channel id the updates are read for. Opaque to the engine.
    #[serde(default)]
    pub group_id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Conversation id stamped on messages read from a local line source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Poll
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_initial_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_max_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for daily-rolling JSON log files. Console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Emit console output as JSON instead of human-readable lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

// ---------------------------------------------------------------------------
// Runtime view
// ---------------------------------------------------------------------------

/// Resolved settings consumed by the command processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandsConfig {
    pub prefixes: Vec<String>,
    pub prefix_mode: PrefixMode,
    pub group_id: u64,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefixes: vec![DEFAULT_PREFIX.to_string()],
            prefix_mode: PrefixMode::Leading,
            group_id: 0,
            backoff_initial: Duration::from_secs(DEFAULT_BACKOFF_INITIAL_SECS),
            backoff_max: Duration::from_secs(DEFAULT_BACKOFF_MAX_SECS),
        }
    }
}

impl CommandsConfig {
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn prefix_mode(mut self, mode: PrefixMode) -> Self {
        self.prefix_mode = mode;
        self
    }

    pub fn group_id(mut self, group_id: u64) -> Self {
        self.group_id = group_id;
        self
    }
}

impl BotConfig {
    /// Resolve the processor settings, falling back to defaults for unset fields.
    pub fn commands_config(&self) -> CommandsConfig {
        let fallback = CommandsConfig::default();
        CommandsConfig {
            prefixes: if self.commands.prefixes.is_empty() {
                fallback.prefixes
            } else {
                self.commands.prefixes.clone()
            },
            prefix_mode: self.commands.prefix_mode.unwrap_or_default(),
            group_id: self.source.group_id,
            backoff_initial: self
                .poll
                .backoff_initial_secs
                .map(Duration::from_secs)
                .unwrap_or(fallback.backoff_initial),
            backoff_max: self
                .poll
                .backoff_max_secs
                .map(Duration::from_secs)
                .unwrap_or(fallback.backoff_max),
        }
    }
}
