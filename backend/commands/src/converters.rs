//! Parameter converters and the converter registry.
//!
//! A converter turns one command token into a typed value. Converters are
//! stored type-erased under the [`TypeKey`] of the type they produce, and
//! registering a converter for `T` also provides one for `Option<T>`.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::arguments::BoxedValue;
use crate::error::CommandError;
use crate::types::TypeKey;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Per-parse context handed to every converter and validator.
#[derive(Clone)]
pub struct CommandContext {
    full_command: String,
    converters: Arc<ConverterRegistry>,
}

impl CommandContext {
    pub fn new(full_command: impl Into<String>, converters: Arc<ConverterRegistry>) -> Self {
        Self {
            full_command: full_command.into(),
            converters,
        }
    }

    /// The complete command line the arguments were parsed from.
    pub fn full_command(&self) -> &str {
        &self.full_command
    }

    /// Snapshot of the registry this parse runs against.
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }
}

// ---------------------------------------------------------------------------
// Converter traits
// ---------------------------------------------------------------------------

/// Converts a single text token into a `T`.
pub trait ParameterConverter<T>: Send + Sync {
    fn convert(&self, value: &str, context: &CommandContext) -> Result<T>;
}

/// Object-safe form of [`ParameterConverter`] stored in the registry.
pub trait ErasedConverter: Send + Sync {
    /// Type this converter produces.
    fn target(&self) -> TypeKey;

    fn convert_boxed(&self, value: &str, context: &CommandContext) -> Result<BoxedValue>;
}

struct Typed<T, C> {
    converter: C,
    _target: PhantomData<fn() -> T>,
}

impl<T, C> Typed<T, C> {
    fn new(converter: C) -> Self {
        Self {
            converter,
            _target: PhantomData,
        }
    }
}

impl<T, C> ErasedConverter for Typed<T, C>
where
    T: Send + Sync + 'static,
    C: ParameterConverter<T>,
{
    fn target(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn convert_boxed(&self, value: &str, context: &CommandContext) -> Result<BoxedValue> {
        let converted = self.converter.convert(value, context)?;
        Ok(Box::new(converted))
    }
}

// ---------------------------------------------------------------------------
// Built-in converters
// ---------------------------------------------------------------------------

/// Identity converter for `String`.
pub struct StringConverter;

impl ParameterConverter<String> for StringConverter {
    fn convert(&self, value: &str, _context: &CommandContext) -> Result<String> {
        Ok(value.to_string())
    }
}

/// Decimal `i32` converter; rejects malformed and out-of-range input.
pub struct Int32Converter;

impl ParameterConverter<i32> for Int32Converter {
    fn convert(&self, value: &str, _context: &CommandContext) -> Result<i32> {
        value
            .parse::<i32>()
            .with_context(|| format!("'{value}' is not a 32-bit integer"))
    }
}

/// Derived converter for `Option<T>`.
///
/// Empty input is `None`; anything else is handed to the converter that the
/// context's registry holds for `T`, and its error is returned unchanged.
pub struct OptionalConverter<T> {
    _inner: PhantomData<fn() -> T>,
}

impl<T> OptionalConverter<T> {
    pub fn new() -> Self {
        Self {
            _inner: PhantomData,
        }
    }
}

impl<T> Default for OptionalConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> ParameterConverter<Option<T>> for OptionalConverter<T> {
    fn convert(&self, value: &str, context: &CommandContext) -> Result<Option<T>> {
        if value.is_empty() {
            return Ok(None);
        }
        let inner = context
            .converters()
            .lookup(TypeKey::of::<T>())
            .ok_or(CommandError::NoConverter {
                type_name: std::any::type_name::<T>(),
            })?;
        let boxed = inner.convert_boxed(value, context)?;
        let converted = boxed.downcast::<T>().map_err(|_| {
            anyhow!(
                "converter for {} produced a value of another type",
                std::any::type_name::<T>()
            )
        })?;
        Ok(Some(*converted))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Mapping from target type to converter.
///
/// Cloning is cheap (converters are shared), which is how dispatch takes
/// snapshots.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<TypeKey, Arc<dyn ErasedConverter>>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the `String` and `i32` converters (and their
    /// derived `Option` forms).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register::<String, _>(StringConverter);
        registry.register::<i32, _>(Int32Converter);
        registry
    }

    /// Register `converter` for `T`, replacing any previous converter for `T`.
    ///
    /// Also registers an `Option<T>` converter unless one already exists.
    pub fn register<T, C>(&mut self, converter: C)
    where
        T: Send + Sync + 'static,
        C: ParameterConverter<T> + 'static,
    {
        let key = TypeKey::of::<T>();
        if self
            .converters
            .insert(key, Arc::new(Typed::<T, C>::new(converter)))
            .is_some()
        {
            debug!(target_type = %key, "Replaced parameter converter");
        }

        let optional = TypeKey::optional::<T>();
        if self.converters.contains_key(&optional) {
            debug!(target_type = %optional, "Keeping existing optional converter");
        } else {
            self.converters.insert(
                optional,
                Arc::new(Typed::<Option<T>, _>::new(OptionalConverter::<T>::new())),
            );
        }
    }

    pub fn lookup(&self, key: TypeKey) -> Option<Arc<dyn ErasedConverter>> {
        self.converters.get(&key).cloned()
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.converters.contains_key(&key)
    }

    /// Convert `raw` to the type identified by `key`.
    pub fn convert(
        &self,
        raw: &str,
        key: TypeKey,
        context: &CommandContext,
    ) -> Result<BoxedValue, CommandError> {
        let converter = self.converters.get(&key).ok_or(CommandError::NoConverter {
            type_name: key.name(),
        })?;
        converter
            .convert_boxed(raw, context)
            .map_err(|source| CommandError::Conversion {
                target: key.name(),
                source: source.into(),
            })
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Names of all registered target types, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.converters.keys().map(TypeKey::name).collect();
        names.sort_unstable();
        names
    }
}
