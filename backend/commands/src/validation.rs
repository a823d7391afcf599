//! Command validators and the validator registry.
//!
//! A validator is selected by the concrete type of the validation attribute
//! attached to a command. Returning `Ok(false)` rejects the invocation; it is
//! not an error of the validator itself.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use chatcmd_core::Message;
use tracing::debug;

use crate::arguments::Arguments;
use crate::error::CommandError;
use crate::types::{TypeKey, ValidatorAttribute};

/// Checks a parsed invocation against an attribute of type `A`.
pub trait CommandValidator<A>: Send + Sync {
    fn validate(&self, attribute: &A, message: &Message, parameters: &Arguments) -> Result<bool>;
}

trait ErasedValidator: Send + Sync {
    fn validate_erased(
        &self,
        attribute: &ValidatorAttribute,
        message: &Message,
        parameters: &Arguments,
    ) -> Result<bool>;
}

struct TypedValidator<A, V> {
    validator: V,
    _attribute: PhantomData<fn(&A)>,
}

impl<A, V> ErasedValidator for TypedValidator<A, V>
where
    A: 'static,
    V: CommandValidator<A>,
{
    fn validate_erased(
        &self,
        attribute: &ValidatorAttribute,
        message: &Message,
        parameters: &Arguments,
    ) -> Result<bool> {
        let typed = attribute.downcast_ref::<A>().ok_or_else(|| {
            anyhow!(
                "validator for {} received a {} attribute",
                std::any::type_name::<A>(),
                attribute.name()
            )
        })?;
        self.validator.validate(typed, message, parameters)
    }
}

/// Mapping from attribute type to validator.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<TypeKey, Arc<dyn ErasedValidator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `validator` for attributes of type `A`, replacing any previous one.
    pub fn register<A, V>(&mut self, validator: V)
    where
        A: Send + Sync + 'static,
        V: CommandValidator<A> + 'static,
    {
        let key = TypeKey::of::<A>();
        let typed = TypedValidator::<A, V> {
            validator,
            _attribute: PhantomData,
        };
        if self.validators.insert(key, Arc::new(typed)).is_some() {
            debug!(attribute = %key, "Replaced command validator");
        }
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.validators.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run the validator registered for the attribute's concrete type.
    pub fn validate(
        &self,
        attribute: &ValidatorAttribute,
        message: &Message,
        parameters: &Arguments,
    ) -> Result<bool, CommandError> {
        let validator = self
            .validators
            .get(&attribute.key())
            .ok_or(CommandError::NoValidator {
                attribute: attribute.name(),
            })?;
        validator
            .validate_erased(attribute, message, parameters)
            .map_err(|source| CommandError::ValidationInvocation {
                attribute: attribute.name(),
                source: source.into(),
            })
    }
}
