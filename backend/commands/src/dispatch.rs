//! Command processor: prefix check, lookup, parse, validate, invoke.
//!
//! Per-message failures never escape [`CommandProcessor::dispatch`]; they are
//! packaged as a [`CommandFailure`] and delivered to every registered
//! [`FailureObserver`] in registration order.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chatcmd_config::CommandsConfig;
use chatcmd_core::{ChatClient, GroupUpdate, Message, UpdateSource};
use chatcmd_logging::{CommandEvent, EventLogger};
use futures::FutureExt;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, trace, warn};

use crate::converters::{ConverterRegistry, ParameterConverter};
use crate::detection::detect_command;
use crate::error::{CommandError, FailureStage};
use crate::parser::parse_arguments;
use crate::registry::{CommandDescriptor, CommandModule, CommandRegistry};
use crate::validation::{CommandValidator, ValidatorRegistry};

// ---------------------------------------------------------------------------
// Failure channel
// ---------------------------------------------------------------------------

/// One failed dispatch: the raw message text and what went wrong.
#[derive(Debug)]
pub struct CommandFailure {
    pub full_command_text: String,
    pub error: CommandError,
}

impl CommandFailure {
    pub fn stage(&self) -> FailureStage {
        self.error.stage()
    }
}

/// Receives every dispatch failure.
pub trait FailureObserver: Send + Sync {
    fn on_failure(&self, failure: &CommandFailure);
}

impl<F> FailureObserver for F
where
    F: Fn(&CommandFailure) + Send + Sync,
{
    fn on_failure(&self, failure: &CommandFailure) {
        self(failure)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The text does not start with a configured prefix.
    NotACommand,
    /// Prefixed, but no command is registered under this name.
    UnknownCommand(String),
    /// The update is not a new message.
    NotAMessage(String),
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    Executed { command: String },
    Failed(CommandFailure),
}

impl DispatchOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, DispatchOutcome::Executed { .. })
    }

    pub fn failure(&self) -> Option<&CommandFailure> {
        match self {
            DispatchOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Owns the command, converter and validator registries and dispatches
/// inbound messages against them.
///
/// Registration takes the write side of each registry lock, dispatch the read
/// side, so handlers and converters may be added while the polling loop runs.
pub struct CommandProcessor {
    config: CommandsConfig,
    client: Arc<dyn ChatClient>,
    commands: RwLock<CommandRegistry>,
    converters: RwLock<Arc<ConverterRegistry>>,
    validators: RwLock<ValidatorRegistry>,
    observers: RwLock<Vec<Arc<dyn FailureObserver>>>,
}

impl CommandProcessor {
    /// A processor with the built-in `String` and `i32` converters and no
    /// commands.
    pub fn new(config: CommandsConfig, client: Arc<dyn ChatClient>) -> Self {
        Self {
            config,
            client,
            commands: RwLock::new(CommandRegistry::new()),
            converters: RwLock::new(Arc::new(ConverterRegistry::with_builtins())),
            validators: RwLock::new(ValidatorRegistry::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &CommandsConfig {
        &self.config
    }

    pub fn client(&self) -> Arc<dyn ChatClient> {
        Arc::clone(&self.client)
    }

    // -- registration -------------------------------------------------------

    /// Register every command method of `T`; `factory` builds a fresh `T`
    /// for each invocation.
    pub async fn search_commands_in<T, F>(&self, factory: F) -> Result<Vec<String>, CommandError>
    where
        T: CommandModule,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let mut commands = self.commands.write().await;
        commands.scan(factory).inspect_err(|err| {
            warn!(owner = std::any::type_name::<T>(), error = %err, "Command registration rejected");
        })
    }

    /// Register (or replace) the converter for `T`. An `Option<T>` converter
    /// is derived unless one exists.
    pub async fn add_converter<T, C>(&self, converter: C)
    where
        T: Send + Sync + 'static,
        C: ParameterConverter<T> + 'static,
    {
        let mut converters = self.converters.write().await;
        Arc::make_mut(&mut *converters).register::<T, C>(converter);
    }

    pub async fn add_validator<A, V>(&self, validator: V)
    where
        A: Send + Sync + 'static,
        V: CommandValidator<A> + 'static,
    {
        self.validators.write().await.register::<A, V>(validator);
    }

    /// Subscribe to dispatch failures.
    pub async fn on_failure(&self, observer: impl FailureObserver + 'static) {
        self.observers.write().await.push(Arc::new(observer));
    }

    // -- queries ------------------------------------------------------------

    pub async fn resolve(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        self.commands.read().await.resolve(name)
    }

    /// Registered command names, sorted.
    pub async fn commands(&self) -> Vec<String> {
        self.commands.read().await.names()
    }

    pub async fn converter_types(&self) -> Vec<&'static str> {
        self.converters.read().await.type_names()
    }

    // -- dispatch -----------------------------------------------------------

    /// Dispatch one message. Never fails: problems are reported to the
    /// failure observers and returned as [`DispatchOutcome::Failed`].
    pub async fn dispatch(&self, message: &Message) -> DispatchOutcome {
        let text = message.content();
        let Some(name) = detect_command(text, &self.config.prefixes, self.config.prefix_mode)
        else {
            debug!(peer_id = message.peer_id, "Message is not a command");
            return DispatchOutcome::Ignored(IgnoreReason::NotACommand);
        };

        let Some(descriptor) = self.resolve(&name).await else {
            debug!(command = %name, "Ignoring unknown command");
            return DispatchOutcome::Ignored(IgnoreReason::UnknownCommand(name));
        };

        // Snapshot so converters added mid-dispatch do not affect this parse.
        let converters = Arc::clone(&*self.converters.read().await);

        match self.execute(&descriptor, text, message, &converters).await {
            Ok(()) => {
                EventLogger::log_event(
                    message.peer_id,
                    CommandEvent::Dispatched {
                        command: name.clone(),
                        text: text.to_string(),
                    },
                );
                DispatchOutcome::Executed { command: name }
            }
            Err(error) => {
                let failure = CommandFailure {
                    full_command_text: text.to_string(),
                    error,
                };
                self.report(Some(&name), message.peer_id, &failure).await;
                DispatchOutcome::Failed(failure)
            }
        }
    }

    async fn execute(
        &self,
        descriptor: &CommandDescriptor,
        text: &str,
        message: &Message,
        converters: &Arc<ConverterRegistry>,
    ) -> Result<(), CommandError> {
        let args = parse_arguments(descriptor, text, message, &self.client, converters)?;

        {
            let validators = self.validators.read().await;
            for attribute in descriptor.all_validators() {
                if !validators.validate(attribute, message, &args)? {
                    return Err(CommandError::FailedValidation {
                        command: descriptor.name().to_string(),
                        attribute: attribute.name(),
                    });
                }
            }
        }

        debug!(
            command = descriptor.name(),
            owner = %descriptor.owner(),
            method = descriptor.method(),
            "Invoking command handler"
        );
        // Building the instance runs inside the guarded future, so a panicking
        // factory is caught too.
        let result = AssertUnwindSafe(async { descriptor.invoke(args).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(anyhow::anyhow!(panic_message(payload.as_ref()))));

        result.map_err(|source| CommandError::HandlerInvocation {
            command: descriptor.name().to_string(),
            owner: descriptor.owner().name(),
            method: descriptor.method(),
            source: source.into(),
        })
    }

    async fn report(&self, command: Option<&str>, peer_id: i64, failure: &CommandFailure) {
        warn!(
            command = command.unwrap_or_default(),
            stage = failure.stage().as_str(),
            error = %failure.error,
            "Command failed"
        );
        EventLogger::log_event(
            peer_id,
            CommandEvent::Failed {
                command: command.map(str::to_string),
                text: failure.full_command_text.clone(),
                stage: failure.stage().as_str().to_string(),
                error: failure.error.to_string(),
            },
        );

        let observers = self.observers.read().await.clone();
        for observer in observers {
            observer.on_failure(failure);
        }
    }

    /// Dispatch the new-message updates of a batch sequentially, in order.
    pub async fn dispatch_batch(&self, updates: &[GroupUpdate]) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(updates.len());
        for update in updates {
            let outcome = match update.new_message() {
                Some(message) => self.dispatch(message).await,
                None => {
                    trace!(kind = %update.kind, "Skipping non-message update");
                    DispatchOutcome::Ignored(IgnoreReason::NotAMessage(update.kind.clone()))
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    // -- polling loop -------------------------------------------------------

    /// Pull batches from `source` and dispatch them until `cancel` fires, its
    /// sender is dropped, or the source ends.
    ///
    /// Cancellation is only observed while waiting for a batch; a batch that
    /// is being dispatched always runs to completion. Transport errors are
    /// retried with exponential backoff.
    pub async fn start_listening<S>(&self, mut source: S, mut cancel: watch::Receiver<bool>)
    where
        S: UpdateSource,
    {
        let mut backoff = self.config.backoff_initial;
        info!(
            source = source.name(),
            group_id = self.config.group_id,
            "Command processor listening"
        );

        loop {
            if *cancel.borrow() {
                info!("Command processor shutting down");
                return;
            }

            let batch = tokio::select! {
                result = source.next_batch() => result,
                _ = cancelled(&mut cancel) => {
                    info!("Command processor cancelled");
                    return;
                }
            };

            match batch {
                Ok(Some(updates)) => {
                    backoff = self.config.backoff_initial;
                    debug!(count = updates.len(), "Received update batch");
                    self.dispatch_batch(&updates).await;
                }
                Ok(None) => {
                    info!(source = source.name(), "Update source closed");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, retry_in = ?backoff, "Failed to fetch updates");
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = cancelled(&mut cancel) => {
                            info!("Command processor cancelled");
                            return;
                        }
                    }
                    backoff = (backoff * 2).min(self.config.backoff_max);
                }
            }
        }
    }
}

/// Resolves once the cancel flag is set to `true` or its sender is dropped.
/// Sends of `false` are ignored.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if cancel.changed().await.is_err() || *cancel.borrow_and_update() {
            return;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    format!("handler panicked: {detail}")
}
