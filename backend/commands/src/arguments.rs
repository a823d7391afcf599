//! Parsed handler arguments and their typed accessors.
//!
//! Values are stored type-erased in declaration order. Handlers pull them
//! back out by position and type; asking for the wrong type or position is a
//! predictable [`CommandError::ArgumentMismatch`], never a panic.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chatcmd_core::{ChatClient, Message};

use crate::error::CommandError;

/// A converted value in type-erased form.
pub type BoxedValue = Box<dyn Any + Send + Sync>;

/// One positional handler argument.
pub enum Argument {
    Message(Message),
    Client(Arc<dyn ChatClient>),
    Value(BoxedValue),
    /// "No value": a missing optional token or empty remaining text.
    Absent,
}

impl Argument {
    pub fn is_absent(&self) -> bool {
        matches!(self, Argument::Absent)
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Message(m) => f.debug_tuple("Message").field(&m.id).finish(),
            Argument::Client(c) => f.debug_tuple("Client").field(&c.name()).finish(),
            Argument::Value(v) => match v.downcast_ref::<String>() {
                Some(s) => f.debug_tuple("Value").field(s).finish(),
                None => f.write_str("Value(..)"),
            },
            Argument::Absent => f.write_str("Absent"),
        }
    }
}

/// Ordered argument list produced by the parser.
#[derive(Debug, Default)]
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    pub fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.values.iter()
    }

    pub fn is_absent(&self, index: usize) -> bool {
        self.values.get(index).is_some_and(Argument::is_absent)
    }

    pub fn message(&self, index: usize) -> Result<&Message, CommandError> {
        match self.values.get(index) {
            Some(Argument::Message(m)) => Ok(m),
            _ => Err(mismatch(index, "Message")),
        }
    }

    pub fn client(&self, index: usize) -> Result<Arc<dyn ChatClient>, CommandError> {
        match self.values.get(index) {
            Some(Argument::Client(c)) => Ok(Arc::clone(c)),
            _ => Err(mismatch(index, "ChatClient")),
        }
    }

    /// Borrow a converted value.
    ///
    /// `Ok(None)` for an absent value. A parameter declared as `Option<T>`
    /// can be read either as `Option<T>` or, flattened, as `T`.
    pub fn value<T: 'static>(&self, index: usize) -> Result<Option<&T>, CommandError> {
        match self.values.get(index) {
            Some(Argument::Absent) => Ok(None),
            Some(Argument::Value(v)) => {
                if let Some(value) = v.downcast_ref::<T>() {
                    Ok(Some(value))
                } else if let Some(optional) = v.downcast_ref::<Option<T>>() {
                    Ok(optional.as_ref())
                } else {
                    Err(mismatch(index, std::any::type_name::<T>()))
                }
            }
            _ => Err(mismatch(index, std::any::type_name::<T>())),
        }
    }

    /// Borrow a string parameter (plain token or remaining text).
    pub fn text(&self, index: usize) -> Result<Option<&str>, CommandError> {
        Ok(self.value::<String>(index)?.map(String::as_str))
    }

    /// Copy out a `Copy` value such as an integer.
    pub fn copied<T: Copy + 'static>(&self, index: usize) -> Result<Option<T>, CommandError> {
        Ok(self.value::<T>(index)?.copied())
    }
}

fn mismatch(index: usize, expected: &'static str) -> CommandError {
    CommandError::ArgumentMismatch { index, expected }
}
