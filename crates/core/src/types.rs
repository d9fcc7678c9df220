//! Core types for Fabrica
//!
//! This module defines the foundational types:
//! - ContextId: Unique identifier for a loading context
//! - ContextHandle: Non-owning reference from a type back to its defining context
//! - Type: A type definition bound to the context that defined it
//! - ParamType: One resolved entry of a constructor signature

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

use crate::def::{Constructor, TypeDef};
use crate::instance::Instance;
use crate::primitive::PrimitiveType;
use crate::traits::LoadingContext;

/// Unique identifier for a loading context
///
/// A ContextId is a wrapper around a UUID v4. Two types with the same name
/// are distinct when their defining contexts have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Create a new random ContextId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the raw bytes of this ContextId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a loading context as seen from the types it defines
///
/// Holds a weak reference so that a context owning its types does not keep
/// itself alive through them.
#[derive(Clone)]
pub struct ContextHandle {
    id: ContextId,
    name: Arc<str>,
    context: Weak<dyn LoadingContext>,
}

impl ContextHandle {
    /// Create a handle for a context
    pub fn new(id: ContextId, name: impl Into<Arc<str>>, context: Weak<dyn LoadingContext>) -> Self {
        Self {
            id,
            name: name.into(),
            context,
        }
    }

    /// Id of the context
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Display name of the context
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The context itself, if it is still alive
    pub fn upgrade(&self) -> Option<Arc<dyn LoadingContext>> {
        self.context.upgrade()
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// A loaded type: a definition plus the context that defined it
#[derive(Clone)]
pub struct Type {
    def: Arc<TypeDef>,
    origin: ContextHandle,
}

impl Type {
    /// Bind a definition to its defining context
    pub fn new(def: Arc<TypeDef>, origin: ContextHandle) -> Self {
        Self { def, origin }
    }

    /// Fully-qualified type name
    pub fn name(&self) -> &str {
        self.def.name()
    }

    /// The underlying definition
    pub fn def(&self) -> &TypeDef {
        &self.def
    }

    /// Handle of the defining context
    pub fn origin(&self) -> &ContextHandle {
        &self.origin
    }

    /// Id of the defining context
    pub fn context_id(&self) -> ContextId {
        self.origin.id()
    }

    /// The defining context, if it is still alive
    pub fn context(&self) -> Option<Arc<dyn LoadingContext>> {
        self.origin.upgrade()
    }

    /// Constructor declared with exactly these parameter type names
    pub fn constructor(&self, params: &[&str]) -> Option<&Constructor> {
        self.def.constructor(params)
    }

    /// Same definition from the same context
    pub fn is(&self, other: &Type) -> bool {
        Arc::ptr_eq(&self.def, &other.def) && self.origin.id == other.origin.id
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.is(other)
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({} @ {})", self.name(), self.origin.name())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved constructor parameter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// Entry from the primitive table
    Primitive(PrimitiveType),
    /// Type resolved through a loading context
    Object(Type),
}

impl ParamType {
    /// Name as it appears in a signature
    pub fn name(&self) -> &str {
        match self {
            ParamType::Primitive(p) => p.name(),
            ParamType::Object(ty) => ty.name(),
        }
    }

    /// Whether an argument may be passed for this parameter
    ///
    /// Primitives need a present value of the matching Rust type. Object
    /// parameters take a null argument or an instance of the identical type.
    pub fn accepts(&self, arg: Option<&Instance>) -> bool {
        match (self, arg) {
            (ParamType::Primitive(p), Some(instance)) => p.accepts(instance.value()),
            (ParamType::Primitive(_), None) => false,
            (ParamType::Object(_), None) => true,
            (ParamType::Object(ty), Some(instance)) => instance.ty().is(ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn test_context_id_creation_uniqueness() {
        let id1 = ContextId::new();
        let id2 = ContextId::new();
        assert_ne!(id1, id2, "ContextIds should be unique");
    }

    #[test]
    fn test_context_id_display() {
        let s = format!("{}", ContextId::new());
        assert_eq!(s.len(), 36, "UUID v4 should format as 36 characters");
    }

    #[test]
    fn test_type_identity_requires_same_context() {
        let string = builtins::string_type();
        let again = builtins::string_type();
        assert_eq!(string, again);

        let foreign = Type::new(
            Arc::new(TypeDef::builder(builtins::STRING).build()),
            string.origin().clone(),
        );
        assert_ne!(string, foreign, "different definitions are different types");
    }

    #[test]
    fn test_primitive_param_rejects_null_and_wrong_value() {
        let param = ParamType::Primitive(PrimitiveType::I32);
        assert!(!param.accepts(None));
        assert!(param.accepts(Some(&Instance::from(7i32))));
        assert!(!param.accepts(Some(&Instance::from(7i64))));
    }

    #[test]
    fn test_object_param_accepts_null() {
        let param = ParamType::Object(builtins::string_type());
        assert!(param.accepts(None));
        assert!(param.accepts(Some(&Instance::from("x"))));
        assert!(!param.accepts(Some(&Instance::from(1i32))));
        assert_eq!(param.name(), builtins::STRING);
    }
}
