//! Built-in demo commands served by `chatcmd run`.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chatcmd_commands::{
    Arguments, CommandMethod, CommandModule, CommandProcessor, CommandValidator, ParameterSpec,
};
use chatcmd_core::Message;

/// Bounds an integer argument at position `index`. An absent value passes.
pub struct Range {
    pub index: usize,
    pub min: i32,
    pub max: i32,
}

pub struct RangeValidator;

impl CommandValidator<Range> for RangeValidator {
    fn validate(&self, range: &Range, _message: &Message, parameters: &Arguments) -> Result<bool> {
        Ok(match parameters.copied::<i32>(range.index)? {
            Some(value) => (range.min..=range.max).contains(&value),
            None => true,
        })
    }
}

pub struct Basics {
    catalog: Arc<Vec<String>>,
}

impl Basics {
    async fn help(self, args: Arguments) -> Result<()> {
        let peer = args.message(0)?.peer_id;
        let text = format!("Commands: {}", self.catalog.join(", "));
        args.client(1)?.send_message(peer, &text).await
    }

    async fn echo(self, args: Arguments) -> Result<()> {
        let text = args.text(0)?.unwrap_or("Nothing to echo").to_string();
        let peer = args.message(1)?.peer_id;
        args.client(2)?.send_message(peer, &text).await
    }

    async fn sum(self, args: Arguments) -> Result<()> {
        let a = args.copied::<i32>(0)?.unwrap_or_default();
        let b = args.copied::<i32>(1)?.unwrap_or_default();
        let total = a
            .checked_add(b)
            .ok_or_else(|| anyhow!("{a} + {b} overflows a 32-bit integer"))?;
        let peer = args.message(2)?.peer_id;
        args.client(3)?.send_message(peer, &total.to_string()).await
    }

    async fn repeat(self, args: Arguments) -> Result<()> {
        let count = args.copied::<i32>(0)?.unwrap_or(1);
        let Some(text) = args.text(1)? else {
            return Ok(());
        };
        let reply = vec![text; count.max(1) as usize].join(" ");
        let peer = args.message(2)?.peer_id;
        args.client(3)?.send_message(peer, &reply).await
    }

    async fn whoami(self, args: Arguments) -> Result<()> {
        let message = args.message(0)?;
        let text = format!("You are {} in {}", message.from_id, message.peer_id);
        let peer = message.peer_id;
        args.client(1)?.send_message(peer, &text).await
    }
}

impl CommandModule for Basics {
    fn methods() -> Vec<CommandMethod<Self>> {
        vec![
            CommandMethod::new("help", Basics::help)
                .command("help")
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
            CommandMethod::new("echo", Basics::echo)
                .command("echo")
                .param(ParameterSpec::remaining_text("text"))
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
            CommandMethod::new("sum", Basics::sum)
                .command("sum")
                .param(ParameterSpec::converted::<i32>("a"))
                .param(ParameterSpec::converted::<i32>("b"))
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
            CommandMethod::new("repeat", Basics::repeat)
                .command("repeat")
                .param(ParameterSpec::converted::<Option<i32>>("count").validated(Range {
                    index: 0,
                    min: 1,
                    max: 10,
                }))
                .param(ParameterSpec::remaining_text("text"))
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
            CommandMethod::new("whoami", Basics::whoami)
                .command("whoami")
                .param(ParameterSpec::message())
                .param(ParameterSpec::client()),
        ]
    }
}

/// Command names declared by [`Basics`], sorted.
pub fn catalog() -> Vec<String> {
    let mut names: Vec<String> = Basics::methods()
        .iter()
        .filter_map(|m| m.command_name().map(str::to_string))
        .collect();
    names.sort();
    names
}

/// Register the demo commands and their validator.
pub async fn register(processor: &CommandProcessor) -> Result<Vec<String>> {
    processor.add_validator::<Range, _>(RangeValidator).await;
    let catalog = Arc::new(catalog());
    let names = processor
        .search_commands_in(move || Basics {
            catalog: Arc::clone(&catalog),
        })
        .await?;
    Ok(names)
}
