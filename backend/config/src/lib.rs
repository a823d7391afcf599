//! `chatcmd-config`: configuration for the chatcmd command engine.
//!
//! Provides:
//! - Typed YAML schema (command prefixes, message source, polling, logging)
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with path-addressed errors and warnings
//! - Redaction for safe logging

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_raw};
pub use redact::redact;
pub use schema::{
    BotConfig, CommandsConfig, CommandsSection, LoggingConfig, PollConfig, PrefixMode, SourceConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load, substitute env vars, apply defaults to and validate a config file.
///
/// A missing file yields the defaults. Validation warnings are logged;
/// validation errors fail the load.
pub async fn load_and_prepare(path: &Path) -> Result<BotConfig> {
    let config = match load_raw(path).await? {
        Some(raw) => {
            let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;
            serde_json::from_value(value)
                .with_context(|| format!("Invalid config structure in {}", path.display()))?
        }
        None => BotConfig::default(),
    };

    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        bail!(
            "config at {} has {} error(s): {}",
            path.display(),
            report.errors.len(),
            report.errors[0]
        );
    }

    Ok(config)
}
