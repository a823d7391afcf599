//! Config validation: checks with path-addressed error messages.

use std::collections::HashSet;

use crate::schema::BotConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_prefixes(config, &mut report);
    validate_source(config, &mut report);
    validate_poll(config, &mut report);
    report
}

fn validate_prefixes(config: &BotConfig, report: &mut ValidationReport) {
    let prefixes = &config.commands.prefixes;
    if prefixes.is_empty() {
        report.error("commands.prefixes", "At least one command prefix is required");
        return;
    }
    let mut seen = HashSet::new();
    for (i, prefix) in prefixes.iter().enumerate() {
        let path = format!("commands.prefixes[{i}]");
        if prefix.is_empty() {
            report.error(&path, "Prefix cannot be empty; it would match every message");
        } else if prefix.contains(' ') {
            report.error(&path, format!("Prefix '{prefix}' cannot contain spaces"));
        }
        if !seen.insert(prefix.as_str()) {
            report.warn(&path, format!("Duplicate prefix '{prefix}'"));
        }
    }
}

fn validate_source(config: &BotConfig, report: &mut ValidationReport) {
    if config.source.group_id == 0 {
        report.warn("source.groupId", "groupId is not set; transports that need it will fail");
    }
}

fn validate_poll(config: &BotConfig, report: &mut ValidationReport) {
    let poll = &config.poll;
    if poll.backoff_initial_secs == Some(0) {
        report.error("poll.backoffInitialSecs", "backoffInitialSecs must be >= 1");
    }
    if let (Some(initial), Some(max)) = (poll.backoff_initial_secs, poll.backoff_max_secs) {
        if max < initial {
            report.error(
                "poll.backoffMaxSecs",
                format!("backoffMaxSecs ({max}) must not be below backoffInitialSecs ({initial})"),
            );
        }
    }
}
