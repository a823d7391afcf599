//! `chatcmd check`: load a config file the way `run` does and report on it.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chatcmd_config::{
    apply_all_defaults, collect_referenced_vars, load_raw, redact, resolve_env_vars, validate,
    BotConfig,
};

use crate::output::{paint, BOLD, GREEN, RED, YELLOW};

pub async fn run(path: &Path) -> Result<()> {
    println!("{}", paint(BOLD, format!("Checking {}", path.display())));

    let Some(raw) = load_raw(path).await? else {
        println!("  {}", paint(YELLOW, "no config file found, defaults apply"));
        return Ok(());
    };

    let vars = collect_referenced_vars(&raw);
    if !vars.is_empty() {
        println!("Environment variables:");
        for var in &vars {
            match std::env::var(var) {
                Ok(value) if !value.is_empty() => println!("  {} {var}", paint(GREEN, "set    ")),
                _ => println!("  {} {var}", paint(RED, "missing")),
            }
        }
    }

    let resolved = resolve_env_vars(&raw)?;
    let config: BotConfig = serde_json::from_value(resolved)
        .with_context(|| format!("Invalid config structure in {}", path.display()))?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        println!("  {} {}: {}", paint(YELLOW, "warning"), warning.path, warning.message);
    }
    for error in &report.errors {
        println!("  {} {}: {}", paint(RED, "error  "), error.path, error.message);
    }

    let shown = redact(&serde_json::to_value(&config)?);
    println!("{}", serde_json::to_string_pretty(&shown)?);

    if !report.is_valid() {
        bail!("{} config error(s)", report.errors.len());
    }
    println!("{}", paint(GREEN, "Config OK"));
    Ok(())
}
