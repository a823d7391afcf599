//! Command engine error taxonomy.

use thiserror::Error;

/// Boxed underlying cause carried by wrapping variants.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where in the dispatch pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Command registration (setup time).
    Registration,
    /// Signature checks, argument parsing and conversion.
    Parse,
    /// Validator lookup or execution, or a rejected validation.
    Validation,
    /// The handler body itself.
    Handler,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Registration => "registration",
            FailureStage::Parse => "parse",
            FailureStage::Validation => "validation",
            FailureStage::Handler => "handler",
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    /// The handler signature lacks (or duplicates) a required context parameter.
    #[error("invalid command method for '{command}': {reason}")]
    InvalidMethod { command: String, reason: String },

    #[error("no parameter converter registered for {type_name}")]
    NoConverter { type_name: &'static str },

    #[error("no command validator registered for {attribute}")]
    NoValidator { attribute: &'static str },

    /// Raised by [`crate::ConverterRegistry::convert`] when a converter fails.
    #[error("could not convert value to {target}")]
    Conversion {
        target: &'static str,
        #[source]
        source: Cause,
    },

    /// A specific command token was rejected by its parameter's converter.
    #[error("could not convert '{token}' to {target}")]
    ParameterConversion {
        token: String,
        target: &'static str,
        #[source]
        source: Cause,
    },

    #[error("could not validate {attribute}")]
    ValidationInvocation {
        attribute: &'static str,
        #[source]
        source: Cause,
    },

    #[error("command '{command}' rejected by {attribute}")]
    FailedValidation {
        command: String,
        attribute: &'static str,
    },

    #[error("command '{command}' ({owner}::{method}) failed")]
    HandlerInvocation {
        command: String,
        owner: &'static str,
        method: &'static str,
        #[source]
        source: Cause,
    },

    #[error("argument {index} is not a {expected}")]
    ArgumentMismatch { index: usize, expected: &'static str },

    #[error("command '{name}' is already registered by {owner}")]
    DuplicateCommand { name: String, owner: &'static str },
}

impl CommandError {
    pub fn stage(&self) -> FailureStage {
        match self {
            CommandError::DuplicateCommand { .. } => FailureStage::Registration,
            CommandError::InvalidMethod { .. }
            | CommandError::NoConverter { .. }
            | CommandError::Conversion { .. }
            | CommandError::ParameterConversion { .. } => FailureStage::Parse,
            CommandError::NoValidator { .. }
            | CommandError::ValidationInvocation { .. }
            | CommandError::FailedValidation { .. } => FailureStage::Validation,
            CommandError::HandlerInvocation { .. } | CommandError::ArgumentMismatch { .. } => {
                FailureStage::Handler
            }
        }
    }

    /// True when the handler body ran and failed, as opposed to the engine
    /// refusing to call it.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, CommandError::HandlerInvocation { .. })
    }
}
