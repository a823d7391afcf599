//! `chatcmd-commands`: typed text-command dispatch.
//!
//! A [`CommandProcessor`] owns three registries:
//! - commands: name → handler descriptor, filled by scanning [`CommandModule`]s
//! - converters: type → string-to-value [`ParameterConverter`]
//! - validators: attribute type → [`CommandValidator`]
//!
//! Inbound text is matched against the configured prefixes, the command word
//! is resolved, the remaining tokens are converted positionally into the
//! handler's declared parameters, validators run, and the handler is invoked.

pub mod arguments;
pub mod converters;
pub mod detection;
pub mod dispatch;
pub mod error;
pub mod parser;
pub mod registry;
pub mod types;
pub mod validation;

pub use arguments::{Argument, Arguments, BoxedValue};
pub use converters::{
    CommandContext, ConverterRegistry, ErasedConverter, Int32Converter, OptionalConverter,
    ParameterConverter, StringConverter,
};
pub use detection::detect_command;
pub use dispatch::{
    CommandFailure, CommandProcessor, DispatchOutcome, FailureObserver, IgnoreReason,
};
pub use error::{Cause, CommandError, FailureStage};
pub use parser::parse_arguments;
pub use registry::{
    CommandDescriptor, CommandMethod, CommandModule, CommandRegistry, HandlerFuture,
};
pub use types::{ParameterKind, ParameterSpec, TypeKey, ValidatorAttribute};
pub use validation::{CommandValidator, ValidatorRegistry};
