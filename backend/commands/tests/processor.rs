use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chatcmd_channels::{MemoryClient, QueueSource};
use chatcmd_commands::{
    Arguments, CommandError, CommandFailure, CommandMethod, CommandModule, CommandProcessor,
    CommandValidator, DispatchOutcome, FailureStage, IgnoreReason, ParameterSpec, TypeKey,
};
use chatcmd_config::{CommandsConfig, PrefixMode};
use chatcmd_core::{GroupUpdate, Message, UpdateSource};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const PEER: i64 = 2_000_000_001;

struct Basic;

impl Basic {
    async fn echo(self, args: Arguments) -> Result<()> {
        let text = args.text(0)?.unwrap_or("(nothing)").to_string();
        let peer = args.message(1)?.peer_id;
        args.client(2)?.send_message(peer, &text).await
    }

    async fn sum(self, args: Arguments) -> Result<()> {
        let a = args.copied::<i32>(0)?.unwrap_or_default();
        let b = args.copied::<i32>(1)?.unwrap_or_default();
        let peer = args.message(2)?.peer_id;
        args.client(3)?.send_message(peer, &(a + b).to_string()).await
    }

    async fn explode(self, _args: Arguments) -> Result<()> {
        bail!("handler exploded")
    }
}

impl CommandModule for Basic {
    fn methods() -> Vec<CommandMethod<Self>> {
        vec![
            CommandMethod::new("echo", Basic::echo)
                .command("echo")
                .param(ParameterSpec::remaining_text("text"))
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
            CommandMethod::new("sum", Basic::sum)
                .command("sum")
                .param(ParameterSpec::converted::<i32>("a"))
                .param(ParameterSpec::converted::<i32>("b"))
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
            CommandMethod::new("explode", Basic::explode)
                .command("explode")
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
            CommandMethod::new("helper", Basic::echo),
        ]
    }
}

/// Only the configured sender may run the command.
struct OwnerOnly {
    owner: i64,
}

struct OwnerOnlyValidator;

impl CommandValidator<OwnerOnly> for OwnerOnlyValidator {
    fn validate(&self, attribute: &OwnerOnly, message: &Message, _: &Arguments) -> Result<bool> {
        Ok(message.from_id == attribute.owner)
    }
}

/// Rejects a numeric argument above the limit.
struct AtMost(i32);

struct AtMostValidator;

impl CommandValidator<AtMost> for AtMostValidator {
    fn validate(&self, attribute: &AtMost, _: &Message, parameters: &Arguments) -> Result<bool> {
        let value = parameters.copied::<i32>(0)?.unwrap_or_default();
        Ok(value <= attribute.0)
    }
}

struct Unregistered;

struct Admin {
    invoked: Arc<AtomicUsize>,
}

impl Admin {
    async fn ban(self, args: Arguments) -> Result<()> {
        self.invoked.fetch_add(1, Ordering::SeqCst);
        let target = args.copied::<i32>(0)?;
        let peer = args.message(1)?.peer_id;
        args.client(2)?
            .send_message(peer, &format!("banned {target:?}"))
            .await
    }

    async fn shutdown(self, _args: Arguments) -> Result<()> {
        self.invoked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl CommandModule for Admin {
    fn methods() -> Vec<CommandMethod<Self>> {
        vec![
            CommandMethod::new("ban", Admin::ban)
                .command("ban")
                .validated(OwnerOnly { owner: 1 })
                .param(ParameterSpec::converted::<Option<i32>>("user").validated(AtMost(100)))
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
            CommandMethod::new("shutdown", Admin::shutdown)
                .command("shutdown")
                .validated(Unregistered)
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
        ]
    }
}

struct Broken;

impl Broken {
    async fn run(self, _args: Arguments) -> Result<()> {
        Ok(())
    }
}

impl CommandModule for Broken {
    fn methods() -> Vec<CommandMethod<Self>> {
        vec![
            CommandMethod::new("no_client", Broken::run)
                .command("noclient")
                .param(ParameterSpec::message()),
            CommandMethod::new("wide", Broken::run)
                .command("wide")
                .param(ParameterSpec::converted::<u64>("id"))
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
        ]
    }
}

struct Duplicate;

impl Duplicate {
    async fn echo(self, _args: Arguments) -> Result<()> {
        Ok(())
    }
}

impl CommandModule for Duplicate {
    fn methods() -> Vec<CommandMethod<Self>> {
        vec![
            CommandMethod::new("echo", Duplicate::echo)
                .command("echo")
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
        ]
    }
}

fn message(text: &str) -> Message {
    Message::new(PEER, text).from_user(1)
}

fn batch(texts: &[&str]) -> Vec<GroupUpdate> {
    texts
        .iter()
        .map(|t| GroupUpdate::message_new(1, message(t)))
        .collect()
}

type Failures = Arc<Mutex<Vec<(String, FailureStage)>>>;

async fn processor(config: CommandsConfig) -> (CommandProcessor, Arc<MemoryClient>, Failures) {
    let client = Arc::new(MemoryClient::new());
    let processor = CommandProcessor::new(config, client.clone());
    processor.search_commands_in(|| Basic).await.unwrap();

    let failures: Failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    processor
        .on_failure(move |failure: &CommandFailure| {
            sink.lock()
                .unwrap()
                .push((failure.full_command_text.clone(), failure.stage()));
        })
        .await;
    (processor, client, failures)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_command_does_not_stop_the_batch() {
    let (processor, client, failures) = processor(CommandsConfig::default()).await;

    let outcomes = processor
        .dispatch_batch(&batch(&["/sum 1 x", "/sum 2 3"]))
        .await;

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcomes[0].failure().map(|f| &f.error),
        Some(CommandError::ParameterConversion { token, .. }) if token == "x"
    ));
    assert!(outcomes[1].is_executed());
    assert_eq!(client.texts(), vec!["5"]);
    assert_eq!(
        *failures.lock().unwrap(),
        vec![("/sum 1 x".to_string(), FailureStage::Parse)]
    );
}

#[tokio::test]
async fn batch_runs_in_message_order() {
    let (processor, client, _) = processor(CommandsConfig::default()).await;
    processor
        .dispatch_batch(&batch(&["/echo one", "hello", "/echo two", "/sum 4"]))
        .await;
    assert_eq!(client.texts(), vec!["one", "two", "4"]);
}

#[tokio::test]
async fn non_message_updates_are_skipped() {
    let (processor, client, _) = processor(CommandsConfig::default()).await;
    let updates = vec![GroupUpdate {
        kind: "message_edit".into(),
        group_id: 1,
        object: Some(message("/echo edited")),
    }];
    let outcomes = processor.dispatch_batch(&updates).await;
    assert!(matches!(
        &outcomes[0],
        DispatchOutcome::Ignored(IgnoreReason::NotAMessage(kind)) if kind == "message_edit"
    ));
    assert!(client.texts().is_empty());
}

#[tokio::test]
async fn unknown_and_unprefixed_text_is_silent() {
    let (processor, client, failures) = processor(CommandsConfig::default()).await;
    let outcomes = processor
        .dispatch_batch(&batch(&["echo hi", "/nope", "/", "/helper x"]))
        .await;
    assert!(outcomes.iter().all(|o| matches!(o, DispatchOutcome::Ignored(_))));
    assert!(client.texts().is_empty());
    assert!(failures.lock().unwrap().is_empty());
}

#[tokio::test]
async fn handler_errors_are_tagged_with_owner_and_method() {
    let (processor, _, failures) = processor(CommandsConfig::default()).await;
    let outcome = processor.dispatch(&message("/explode now")).await;

    match outcome.failure().map(|f| &f.error) {
        Some(CommandError::HandlerInvocation { command, owner, method, source }) => {
            assert_eq!(command, "explode");
            assert_eq!(*owner, TypeKey::of::<Basic>().name());
            assert_eq!(*method, "explode");
            assert_eq!(source.to_string(), "handler exploded");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(failures.lock().unwrap()[0].1, FailureStage::Handler);
}

#[tokio::test]
async fn configured_prefixes_are_honoured() {
    let config = CommandsConfig::with_prefixes(["!", "bot "]);
    let (processor, client, _) = processor(config).await;
    processor
        .dispatch_batch(&batch(&["!echo bang", "/echo slash", "bot echo"]))
        .await;
    assert_eq!(client.texts(), vec!["bang"]);
}

#[tokio::test]
async fn first_occurrence_mode_strips_inside_the_word() {
    let config = CommandsConfig::with_prefixes(["!", "/"]).prefix_mode(PrefixMode::FirstOccurrence);
    let (processor, _, _) = processor(config).await;
    let outcome = processor.dispatch(&message("/ec!ho hi")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Ignored(IgnoreReason::UnknownCommand(ref name)) if name == "/echo"
    ));
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_modules_resolve_to_their_owners() {
    let (processor, _, _) = processor(CommandsConfig::default()).await;
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invoked);
    let names = processor
        .search_commands_in(move || Admin {
            invoked: Arc::clone(&counter),
        })
        .await
        .unwrap();
    assert_eq!(names, vec!["ban", "shutdown"]);

    let ban = processor.resolve("ban").await.unwrap();
    assert_eq!(ban.owner(), TypeKey::of::<Admin>());
    assert_eq!(ban.method(), "ban");
    let echo = processor.resolve("echo").await.unwrap();
    assert_eq!(echo.owner(), TypeKey::of::<Basic>());
    assert_eq!(echo.method(), "echo");

    assert_eq!(
        processor.commands().await,
        vec!["ban", "echo", "explode", "shutdown", "sum"]
    );
}

#[tokio::test]
async fn duplicate_names_are_rejected_whole() {
    let (processor, _, _) = processor(CommandsConfig::default()).await;
    let err = processor.search_commands_in(|| Duplicate).await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::DuplicateCommand { ref name, owner } if name == "echo" && owner == TypeKey::of::<Basic>().name()
    ));
    assert_eq!(err.stage(), FailureStage::Registration);
    assert_eq!(
        processor.resolve("echo").await.unwrap().owner(),
        TypeKey::of::<Basic>()
    );
}

#[tokio::test]
async fn invalid_signatures_fail_on_every_dispatch() {
    let (processor, _, failures) = processor(CommandsConfig::default()).await;
    processor.search_commands_in(|| Broken).await.unwrap();

    for text in ["/noclient", "/noclient a b"] {
        let outcome = processor.dispatch(&message(text)).await;
        assert!(matches!(
            outcome.failure().map(|f| &f.error),
            Some(CommandError::InvalidMethod { .. })
        ));
    }
    let outcome = processor.dispatch(&message("/wide")).await;
    assert!(matches!(
        outcome.failure().map(|f| &f.error),
        Some(CommandError::NoConverter { .. })
    ));
    assert_eq!(failures.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn converter_added_later_is_used() {
    struct U64Converter;

    impl chatcmd_commands::ParameterConverter<u64> for U64Converter {
        fn convert(&self, value: &str, _: &chatcmd_commands::CommandContext) -> Result<u64> {
            Ok(value.parse()?)
        }
    }

    let (processor, _, _) = processor(CommandsConfig::default()).await;
    processor.search_commands_in(|| Broken).await.unwrap();
    assert!(processor.dispatch(&message("/wide 5")).await.failure().is_some());

    processor.add_converter::<u64, _>(U64Converter).await;
    assert!(processor.dispatch(&message("/wide 5")).await.is_executed());
}

#[tokio::test]
async fn every_dispatch_builds_a_fresh_instance() {
    let (processor, _, _) = processor(CommandsConfig::default()).await;
    let built = Arc::new(AtomicUsize::new(0));
    let invoked = Arc::new(AtomicUsize::new(0));
    let (b, i) = (Arc::clone(&built), Arc::clone(&invoked));
    processor
        .search_commands_in(move || {
            b.fetch_add(1, Ordering::SeqCst);
            Admin {
                invoked: Arc::clone(&i),
            }
        })
        .await
        .unwrap();
    processor.add_validator::<OwnerOnly, _>(OwnerOnlyValidator).await;
    processor.add_validator::<AtMost, _>(AtMostValidator).await;

    processor.dispatch_batch(&batch(&["/ban 1", "/ban 2", "/ban 3"])).await;
    assert_eq!(built.load(Ordering::SeqCst), 3);
    assert_eq!(invoked.load(Ordering::SeqCst), 3);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

async fn admin_processor() -> (CommandProcessor, Arc<MemoryClient>, Failures, Arc<AtomicUsize>) {
    let (processor, client, failures) = processor(CommandsConfig::default()).await;
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invoked);
    processor
        .search_commands_in(move || Admin {
            invoked: Arc::clone(&counter),
        })
        .await
        .unwrap();
    processor.add_validator::<OwnerOnly, _>(OwnerOnlyValidator).await;
    processor.add_validator::<AtMost, _>(AtMostValidator).await;
    (processor, client, failures, invoked)
}

#[tokio::test]
async fn passing_validation_runs_the_handler() {
    let (processor, client, failures, invoked) = admin_processor().await;
    assert!(processor.dispatch(&message("/ban 42")).await.is_executed());
    assert!(processor.dispatch(&message("/ban")).await.is_executed());
    assert_eq!(invoked.load(Ordering::SeqCst), 2);
    assert_eq!(client.texts(), vec!["banned Some(42)", "banned None"]);
    assert!(failures.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_validation_is_reported_and_skips_the_handler() {
    let (processor, _, failures, invoked) = admin_processor().await;

    let stranger = Message::new(PEER, "/ban 5").from_user(99);
    let outcome = processor.dispatch(&stranger).await;
    assert!(matches!(
        outcome.failure().map(|f| &f.error),
        Some(CommandError::FailedValidation { command, attribute })
            if command == "ban" && *attribute == TypeKey::of::<OwnerOnly>().name()
    ));

    let outcome = processor.dispatch(&message("/ban 500")).await;
    assert!(matches!(
        outcome.failure().map(|f| &f.error),
        Some(CommandError::FailedValidation { attribute, .. })
            if *attribute == TypeKey::of::<AtMost>().name()
    ));

    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    let stages: Vec<_> = failures.lock().unwrap().iter().map(|f| f.1).collect();
    assert_eq!(stages, vec![FailureStage::Validation, FailureStage::Validation]);
}

#[tokio::test]
async fn missing_validator_is_an_error() {
    let (processor, _, _, invoked) = admin_processor().await;
    let outcome = processor.dispatch(&message("/shutdown")).await;
    assert!(matches!(
        outcome.failure().map(|f| &f.error),
        Some(CommandError::NoValidator { .. })
    ));
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn observers_are_called_in_registration_order() {
    let (processor, _, _) = processor(CommandsConfig::default()).await;
    let order = Arc::new(Mutex::new(Vec::new()));
    for id in 1..=3 {
        let order = Arc::clone(&order);
        processor
            .on_failure(move |_: &CommandFailure| order.lock().unwrap().push(id))
            .await;
    }

    processor.dispatch(&message("/explode")).await;
    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
}

// ---------------------------------------------------------------------------
// Polling loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listening_ends_with_the_source() {
    let (processor, client, _) = processor(CommandsConfig::default()).await;
    let (tx, source) = QueueSource::channel(8);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    tx.send(batch(&["/echo a", "/echo b"])).await.unwrap();
    tx.send(batch(&["/echo c"])).await.unwrap();
    drop(tx);

    processor.start_listening(source, cancel_rx).await;
    assert_eq!(client.texts(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn cancelled_before_start_accepts_nothing() {
    let (processor, client, _) = processor(CommandsConfig::default()).await;
    let (tx, source) = QueueSource::channel(8);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tx.send(batch(&["/echo never"])).await.unwrap();
    cancel_tx.send(true).unwrap();

    processor.start_listening(source, cancel_rx).await;
    assert!(client.texts().is_empty());
}

#[tokio::test]
async fn cancel_stops_a_waiting_loop() {
    let (processor, client, _) = processor(CommandsConfig::default()).await;
    let (tx, source) = QueueSource::channel(8);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let driver = async {
        tx.send(batch(&["/echo first"])).await.unwrap();
        while client.texts().is_empty() {
            tokio::task::yield_now().await;
        }
        cancel_tx.send(true).unwrap();
    };

    let listened = tokio::time::timeout(
        Duration::from_secs(5),
        async { tokio::join!(processor.start_listening(source, cancel_rx), driver) },
    )
    .await;
    assert!(listened.is_ok());
    assert_eq!(client.texts(), vec!["first"]);
}

struct FlakySource {
    calls: usize,
}

#[async_trait]
impl UpdateSource for FlakySource {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn next_batch(&mut self) -> Result<Option<Vec<GroupUpdate>>> {
        self.calls += 1;
        match self.calls {
            1 | 2 => bail!("transport unavailable"),
            3 => Ok(Some(batch(&["/echo recovered"]))),
            _ => Ok(None),
        }
    }
}

#[tokio::test]
async fn transport_errors_are_retried() {
    let config = CommandsConfig {
        backoff_initial: Duration::from_millis(1),
        backoff_max: Duration::from_millis(2),
        ..CommandsConfig::default()
    };
    let (processor, client, failures) = processor(config).await;
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    processor
        .start_listening(FlakySource { calls: 0 }, cancel_rx)
        .await;
    assert_eq!(client.texts(), vec!["recovered"]);
    assert!(failures.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Handler panics
// ---------------------------------------------------------------------------

struct Faulty;

impl Faulty {
    async fn divide(self, args: Arguments) -> Result<()> {
        let divisor = args.copied::<i32>(0)?.unwrap_or_default();
        let quotient = 10 / divisor;
        let peer = args.message(1)?.peer_id;
        args.client(2)?
            .send_message(peer, &quotient.to_string())
            .await
    }
}

impl CommandModule for Faulty {
    fn methods() -> Vec<CommandMethod<Self>> {
        vec![
            CommandMethod::new("divide", Faulty::divide)
                .command("divide")
                .param(ParameterSpec::converted::<i32>("divisor"))
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
        ]
    }
}

#[tokio::test]
async fn panicking_handler_is_reported_as_handler_failure() {
    let (processor, _, failures) = processor(CommandsConfig::default()).await;
    processor.search_commands_in(|| Faulty).await.unwrap();

    let outcome = processor.dispatch(&message("/divide 0")).await;
    match outcome.failure().map(|f| &f.error) {
        Some(CommandError::HandlerInvocation { command, source, .. }) => {
            assert_eq!(command, "divide");
            assert!(source.to_string().contains("divide by zero"), "{source}");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        *failures.lock().unwrap(),
        vec![("/divide 0".to_string(), FailureStage::Handler)]
    );
}

#[tokio::test]
async fn panicking_handler_does_not_stop_the_loop() {
    let (processor, client, failures) = processor(CommandsConfig::default()).await;
    processor.search_commands_in(|| Faulty).await.unwrap();
    let (tx, source) = QueueSource::channel(8);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    tx.send(batch(&["/divide 0", "/echo after"])).await.unwrap();
    tx.send(batch(&["/divide 5"])).await.unwrap();
    drop(tx);

    processor.start_listening(source, cancel_rx).await;
    assert_eq!(client.texts(), vec!["after", "2"]);
    assert_eq!(failures.lock().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Cancellation flag
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sending_false_does_not_cancel() {
    let (processor, client, _) = processor(CommandsConfig::default()).await;
    let (tx, source) = QueueSource::channel(8);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let driver = async {
        cancel_tx.send(false).unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tx.send(batch(&["/echo still here"])).await.unwrap();
        while client.texts().is_empty() {
            tokio::task::yield_now().await;
        }
        cancel_tx.send(true).unwrap();
    };

    let listened = tokio::time::timeout(
        Duration::from_secs(5),
        async { tokio::join!(processor.start_listening(source, cancel_rx), driver) },
    )
    .await;
    assert!(listened.is_ok());
    assert_eq!(client.texts(), vec!["still here"]);
}

// ---------------------------------------------------------------------------
// Repeated validation attributes
// ---------------------------------------------------------------------------

/// Named checkpoint; passes or fails as configured.
struct Gate {
    name: &'static str,
    pass: bool,
}

struct GateValidator {
    seen: Arc<Mutex<Vec<&'static str>>>,
}

impl CommandValidator<Gate> for GateValidator {
    fn validate(&self, gate: &Gate, _: &Message, _: &Arguments) -> Result<bool> {
        self.seen.lock().unwrap().push(gate.name);
        Ok(gate.pass)
    }
}

struct Gated {
    invoked: Arc<AtomicUsize>,
}

impl Gated {
    async fn run(self, _args: Arguments) -> Result<()> {
        self.invoked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl CommandModule for Gated {
    fn methods() -> Vec<CommandMethod<Self>> {
        vec![
            CommandMethod::new("open", Gated::run)
                .command("open")
                .validated(Gate { name: "outer", pass: true })
                .validated(Gate { name: "inner", pass: true })
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
            CommandMethod::new("closed", Gated::run)
                .command("closed")
                .validated(Gate { name: "first", pass: true })
                .validated(Gate { name: "second", pass: false })
                .validated(Gate { name: "third", pass: true })
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
        ]
    }
}

#[tokio::test]
async fn repeated_attributes_run_in_declaration_order() {
    let (processor, _, failures) = processor(CommandsConfig::default()).await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invoked);
    processor
        .search_commands_in(move || Gated {
            invoked: Arc::clone(&counter),
        })
        .await
        .unwrap();
    processor
        .add_validator::<Gate, _>(GateValidator {
            seen: Arc::clone(&seen),
        })
        .await;

    assert!(processor.dispatch(&message("/open")).await.is_executed());
    assert_eq!(*seen.lock().unwrap(), vec!["outer", "inner"]);
    assert_eq!(invoked.load(Ordering::SeqCst), 1);

    seen.lock().unwrap().clear();
    let outcome = processor.dispatch(&message("/closed")).await;
    assert!(matches!(
        outcome.failure().map(|f| &f.error),
        Some(CommandError::FailedValidation { command, .. }) if command == "closed"
    ));
    assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    assert_eq!(failures.lock().unwrap()[0].1, FailureStage::Validation);
}
