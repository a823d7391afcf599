//! Positional argument parser.
//!
//! Walks a handler's declared parameters against the whitespace-split tokens
//! of a command line, filling context parameters from the caller and
//! converting the rest through the converter registry.

use std::sync::Arc;

use chatcmd_core::{ChatClient, Message};
use tracing::trace;

use crate::arguments::{Argument, Arguments};
use crate::converters::{CommandContext, ConverterRegistry};
use crate::error::CommandError;
use crate::registry::CommandDescriptor;
use crate::types::ParameterKind;

/// Build the argument list for `descriptor` from `command_line`.
///
/// Token 0 (the command word) is discarded. Missing trailing tokens produce
/// [`Argument::Absent`] rather than an error.
pub fn parse_arguments(
    descriptor: &CommandDescriptor,
    command_line: &str,
    message: &Message,
    client: &Arc<dyn ChatClient>,
    converters: &Arc<ConverterRegistry>,
) -> Result<Arguments, CommandError> {
    descriptor.check_signature()?;

    // A missing converter is a signature problem; report it even when the
    // token would have been absent.
    for spec in descriptor.parameters() {
        if let ParameterKind::Converted(target) = spec.kind {
            if !target.is_string() && !converters.contains(target) {
                return Err(CommandError::NoConverter {
                    type_name: target.name(),
                });
            }
        }
    }

    let tokens: Vec<&str> = command_line.split(' ').skip(1).collect();
    let context = CommandContext::new(command_line, Arc::clone(converters));
    let parameters = descriptor.parameters();
    let mut values = Vec::with_capacity(parameters.len());
    let mut cursor = 0usize;

    for spec in parameters {
        let value = match spec.kind {
            ParameterKind::ContextMessage => Argument::Message(message.clone()),
            ParameterKind::ContextClient => Argument::Client(Arc::clone(client)),
            ParameterKind::RemainingText => {
                let rest = tokens.get(cursor..).unwrap_or_default().join(" ");
                cursor = tokens.len();
                if rest.is_empty() {
                    Argument::Absent
                } else {
                    Argument::Value(Box::new(rest))
                }
            }
            ParameterKind::Converted(target) => match tokens.get(cursor) {
                None => Argument::Absent,
                Some(token) => {
                    cursor += 1;
                    if target.is_string() {
                        Argument::Value(Box::new(token.to_string()))
                    } else {
                        let converted = converters
                            .convert(token, target, &context)
                            .map_err(|err| match err {
                                CommandError::Conversion { source, .. } => {
                                    CommandError::ParameterConversion {
                                        token: token.to_string(),
                                        target: target.name(),
                                        source,
                                    }
                                }
                                other => other,
                            })?;
                        Argument::Value(converted)
                    }
                }
            },
        };
        trace!(parameter = %spec.name, value = ?value, "Bound parameter");
        values.push(value);
    }

    while values.len() < parameters.len() {
        values.push(Argument::Absent);
    }

    Ok(Arguments::new(values))
}
