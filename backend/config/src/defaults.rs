//! Config defaults: applies default values to a parsed config.

use crate::schema::BotConfig;

/// Prefix used when the config lists none.
pub const DEFAULT_PREFIX: &str = "/";

/// First retry delay after a failed poll.
pub const DEFAULT_BACKOFF_INITIAL_SECS: u64 = 1;

/// Upper bound for the poll retry delay.
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 60;

/// Default `tracing` level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: BotConfig) -> BotConfig {
    let config = apply_command_defaults(config);
    let config = apply_poll_defaults(config);
    apply_logging_defaults(config)
}

fn apply_command_defaults(mut config: BotConfig) -> BotConfig {
    if config.commands.prefixes.is_empty() {
        config.commands.prefixes = vec![DEFAULT_PREFIX.to_string()];
    }
    config.commands.prefix_mode.get_or_insert_with(Default::default);
    config
}

fn apply_poll_defaults(mut config: BotConfig) -> BotConfig {
    config
        .poll
        .backoff_initial_secs
        .get_or_insert(DEFAULT_BACKOFF_INITIAL_SECS);
    config.poll.backoff_max_secs.get_or_insert(DEFAULT_BACKOFF_MAX_SECS);
    config
}

fn apply_logging_defaults(mut config: BotConfig) -> BotConfig {
    if config.logging.level.is_none() {
        config.logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config.logging.json.get_or_insert(false);
    config
}
