mod check_cmd;
mod demo;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use chatcmd_channels::{ConsoleClient, LineSource};
use chatcmd_commands::{CommandFailure, CommandProcessor};
use chatcmd_config::{config_dir, config_file_path, load_and_prepare, redact, validate, BotConfig};
use chatcmd_logging::{init_logger, LogOptions};

use output::{paint, RED};

/// Conversation id used for stdin messages when none is configured.
const DEFAULT_PEER_ID: i64 = 1;

#[derive(Parser)]
#[command(name = "chatcmd")]
#[command(about = "Typed text commands for chat bots")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.chatcmd/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch commands read from stdin, one message per line
    Run {
        /// Conversation id stamped on each message
        #[arg(long)]
        peer_id: Option<i64>,
        /// Sender id stamped on each message (defaults to the peer id)
        #[arg(long)]
        from_id: Option<i64>,
    },
    /// Validate the config file and print it with secrets redacted
    Check,
    /// List the built-in commands
    Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::Run { peer_id, from_id } => {
            let config = load_and_prepare(&path).await?;
            init_logger(&log_options(&config));
            run(config, peer_id, from_id).await?;
        }
        Commands::Check => check_cmd::run(&path).await?,
        Commands::Commands => {
            for name in demo::catalog() {
                println!("{name}");
            }
        }
    }

    Ok(())
}

fn log_options(config: &BotConfig) -> LogOptions {
    let defaults = LogOptions::default();
    LogOptions {
        level: config.logging.level.clone().unwrap_or(defaults.level),
        dir: config.logging.dir.clone(),
        json: config.logging.json.unwrap_or(defaults.json),
    }
}

async fn run(config: BotConfig, peer_id: Option<i64>, from_id: Option<i64>) -> Result<()> {
    // Warnings were emitted before the subscriber existed.
    for warning in validate(&config).warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    debug!(config = %redact(&serde_json::to_value(&config)?), "Loaded config");

    let commands = config.commands_config();
    let peer_id = peer_id.or(config.source.peer_id).unwrap_or(DEFAULT_PEER_ID);
    let from_id = from_id.unwrap_or(peer_id);

    let processor = CommandProcessor::new(commands.clone(), Arc::new(ConsoleClient));
    let names = demo::register(&processor).await?;
    processor
        .on_failure(|failure: &CommandFailure| {
            eprintln!(
                "{} {}: {}",
                paint(RED, format!("[{}]", failure.stage().as_str())),
                failure.full_command_text,
                failure.error
            );
        })
        .await;
    info!(
        commands = ?names,
        prefixes = ?commands.prefixes,
        peer_id,
        "chatcmd ready"
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping");
                let _ = cancel_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for Ctrl-C");
                // Keep the sender alive so the loop only stops at end of input.
                std::future::pending::<()>().await;
                drop(cancel_tx);
            }
        }
    });

    let source = LineSource::new(BufReader::new(tokio::io::stdin()), commands.group_id, peer_id)
        .from_user(from_id);
    processor.start_listening(source, cancel_rx).await;
    Ok(())
}
