/// Command registry: command name → handler descriptor.
///
/// A handler-bearing type implements [`CommandModule`] and lists its methods.
/// Methods that carry a command name are registered; the rest are ignored.
/// A factory supplied at registration builds a fresh instance for every
/// invocation, so no handler state survives between commands.
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info};

use crate::arguments::Arguments;
use crate::error::CommandError;
use crate::types::{ParameterKind, ParameterSpec, TypeKey, ValidatorAttribute};

/// Future returned by a command handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

type MethodFn<T> = Arc<dyn Fn(T, Arguments) -> HandlerFuture + Send + Sync>;
type InvokeFn = Arc<dyn Fn(Arguments) -> HandlerFuture + Send + Sync>;

// ---------------------------------------------------------------------------
// Module / method declarations
// ---------------------------------------------------------------------------

/// A type whose methods implement chat commands.
pub trait CommandModule: Sized + Send + 'static {
    /// All public methods of the module, annotated or not.
    fn methods() -> Vec<CommandMethod<Self>>;
}

/// One method of a [`CommandModule`] together with its declared signature.
pub struct CommandMethod<T> {
    method: &'static str,
    command: Option<String>,
    parameters: Vec<ParameterSpec>,
    validators: Vec<ValidatorAttribute>,
    handler: MethodFn<T>,
}

impl<T: Send + 'static> CommandMethod<T> {
    pub fn new<F, Fut>(method: &'static str, handler: F) -> Self
    where
        F: Fn(T, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handler: MethodFn<T> =
            Arc::new(move |instance: T, args: Arguments| -> HandlerFuture {
                Box::pin(handler(instance, args))
            });
        Self {
            method,
            command: None,
            parameters: Vec::new(),
            validators: Vec::new(),
            handler,
        }
    }

    /// Mark this method as the handler of the named command.
    pub fn command(mut self, name: impl Into<String>) -> Self {
        self.command = Some(name.into());
        self
    }

    /// Append the next declared parameter.
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Attach a method-level validation attribute. May be repeated.
    pub fn validated<A: Send + Sync + 'static>(mut self, attribute: A) -> Self {
        self.validators.push(ValidatorAttribute::new(attribute));
        self
    }

    pub fn method_name(&self) -> &'static str {
        self.method
    }

    pub fn command_name(&self) -> Option<&str> {
        self.command.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Registered metadata binding a command name to its handler.
pub struct CommandDescriptor {
    name: String,
    owner: TypeKey,
    method: &'static str,
    parameters: Vec<ParameterSpec>,
    validators: Vec<ValidatorAttribute>,
    invoke: InvokeFn,
}

impl CommandDescriptor {
    /// Bind `method` of module `T` to `name`, building instances with `factory`.
    pub fn from_method<T, F>(name: impl Into<String>, method: CommandMethod<T>, factory: Arc<F>) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let handler = method.handler;
        let invoke: InvokeFn = Arc::new(move |args: Arguments| -> HandlerFuture {
            let instance = factory();
            handler(instance, args)
        });
        Self {
            name: name.into(),
            owner: TypeKey::of::<T>(),
            method: method.method,
            parameters: method.parameters,
            validators: method.validators,
            invoke,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Method-level validation attributes in declaration order.
    pub fn validators(&self) -> &[ValidatorAttribute] {
        &self.validators
    }

    /// Method-level attributes followed by parameter-level ones.
    pub fn all_validators(&self) -> impl Iterator<Item = &ValidatorAttribute> {
        self.validators
            .iter()
            .chain(self.parameters.iter().flat_map(|p| p.validators.iter()))
    }

    /// Check the structural rules of the signature: exactly one message and
    /// one client context parameter, at most one remaining-text parameter.
    pub fn check_signature(&self) -> Result<(), CommandError> {
        let count = |kind: ParameterKind| self.parameters.iter().filter(|p| p.kind == kind).count();
        let invalid = |reason: String| CommandError::InvalidMethod {
            command: self.name.clone(),
            reason,
        };

        for (kind, label) in [
            (ParameterKind::ContextMessage, "message"),
            (ParameterKind::ContextClient, "client"),
        ] {
            match count(kind) {
                1 => {}
                0 => return Err(invalid(format!("missing the {label} context parameter"))),
                n => return Err(invalid(format!("declares {n} {label} context parameters"))),
            }
        }
        if count(ParameterKind::RemainingText) > 1 {
            return Err(invalid("declares more than one remaining-text parameter".into()));
        }
        Ok(())
    }

    /// Build a fresh module instance and run the handler.
    pub fn invoke(&self, args: Arguments) -> HandlerFuture {
        (self.invoke)(args)
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("method", &self.method)
            .field("parameters", &self.parameters)
            .field("validators", &self.validators)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<CommandDescriptor>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every command-annotated method of `T`.
    ///
    /// Duplicate names are rejected: if any name is already registered (or
    /// repeats within `T`), nothing from this scan is added. Returns the
    /// registered names in declaration order.
    pub fn scan<T, F>(&mut self, factory: F) -> Result<Vec<String>, CommandError>
    where
        T: CommandModule,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        let mut pending: Vec<CommandDescriptor> = Vec::new();

        for method in T::methods() {
            let Some(name) = method.command.clone() else {
                debug!(
                    owner = std::any::type_name::<T>(),
                    method = method.method,
                    "Skipping method without command name"
                );
                continue;
            };
            let existing = self
                .commands
                .get(&name)
                .map(|d| d.owner.name())
                .or_else(|| pending.iter().find(|d| d.name == name).map(|d| d.owner.name()));
            if let Some(owner) = existing {
                return Err(CommandError::DuplicateCommand { name, owner });
            }
            pending.push(CommandDescriptor::from_method(name, method, Arc::clone(&factory)));
        }

        let names: Vec<String> = pending.iter().map(|d| d.name.clone()).collect();
        for descriptor in pending {
            self.commands
                .insert(descriptor.name.clone(), Arc::new(descriptor));
        }
        info!(
            owner = std::any::type_name::<T>(),
            count = names.len(),
            "Registered command module"
        );
        Ok(names)
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        self.commands.get(name).cloned()
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
