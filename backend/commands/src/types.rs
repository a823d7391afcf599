/// Signature types shared by the registries, the parser and the dispatcher.
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Type key
// ---------------------------------------------------------------------------

/// Stable runtime identifier of a Rust type, used to key the converter and
/// validator registries.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Key of `Option<T>`.
    pub fn optional<T: 'static>() -> Self {
        Self::of::<Option<T>>()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Strings are always representable and bypass the converter registry.
    pub fn is_string(&self) -> bool {
        self.id == TypeId::of::<String>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ---------------------------------------------------------------------------
// Validation attribute
// ---------------------------------------------------------------------------

/// A validation attribute instance attached to a command method or parameter.
///
/// The attribute's concrete type selects the validator that checks it.
#[derive(Clone)]
pub struct ValidatorAttribute {
    key: TypeKey,
    value: Arc<dyn Any + Send + Sync>,
}

impl ValidatorAttribute {
    pub fn new<A: Send + Sync + 'static>(attribute: A) -> Self {
        Self {
            key: TypeKey::of::<A>(),
            value: Arc::new(attribute),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    pub fn downcast_ref<A: 'static>(&self) -> Option<&A> {
        self.value.as_ref().downcast_ref::<A>()
    }
}

impl fmt::Debug for ValidatorAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValidatorAttribute").field(&self.key).finish()
    }
}

// ---------------------------------------------------------------------------
// Parameter spec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Filled with the inbound message.
    ContextMessage,
    /// Filled with the injected chat client.
    ContextClient,
    /// All unconsumed tokens joined by single spaces (string).
    RemainingText,
    /// One token converted to the target type.
    Converted(TypeKey),
}

/// One declared handler parameter, in declaration order.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    pub validators: Vec<ValidatorAttribute>,
}

impl ParameterSpec {
    fn with_kind(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            validators: Vec::new(),
        }
    }

    pub fn message() -> Self {
        Self::with_kind("message", ParameterKind::ContextMessage)
    }

    pub fn client() -> Self {
        Self::with_kind("client", ParameterKind::ContextClient)
    }

    pub fn remaining_text(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParameterKind::RemainingText)
    }

    pub fn converted<T: 'static>(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParameterKind::Converted(TypeKey::of::<T>()))
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::converted::<String>(name)
    }

    /// Attach a validation attribute to this parameter.
    pub fn validated<A: Send + Sync + 'static>(mut self, attribute: A) -> Self {
        self.validators.push(ValidatorAttribute::new(attribute));
        self
    }

    /// Semantic type of a `Converted` parameter.
    pub fn target_type(&self) -> Option<TypeKey> {
        match self.kind {
            ParameterKind::Converted(key) => Some(key),
            _ => None,
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(
            self.kind,
            ParameterKind::ContextMessage | ParameterKind::ContextClient
        )
    }
}
