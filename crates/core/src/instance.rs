//! Type-erased instances
//!
//! Every object produced by the service is an [`Instance`]: the value
//! itself plus the [`Type`] it was constructed as. Carrying the type keeps
//! the defining loading context observable, which the signature matcher
//! needs to detect cross-context arguments.

use std::any::Any;
use std::fmt;

use crate::builtins;
use crate::def::AnyValue;
use crate::error::BoxError;
use crate::primitive::PrimitiveType;
use crate::types::{ContextId, Type};

/// A constructed object together with its type
pub struct Instance {
    ty: Type,
    value: AnyValue,
}

impl Instance {
    /// Wrap an already boxed value
    pub fn new(ty: Type, value: AnyValue) -> Self {
        Self { ty, value }
    }

    /// Wrap a value of type `T`
    pub fn of<T: Any + Send + Sync>(ty: Type, value: T) -> Self {
        Self::new(ty, Box::new(value))
    }

    /// The instance's type
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Fully-qualified name of the instance's type
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Id of the context that defined the instance's type
    pub fn context_id(&self) -> ContextId {
        self.ty.context_id()
    }

    /// The wrapped value
    pub fn value(&self) -> &(dyn Any + Send + Sync) {
        self.value.as_ref()
    }

    /// True if the wrapped value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrow the wrapped value as a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the wrapped value as a `T`, or get the instance back
    pub fn downcast<T: Any>(self) -> Result<T, Instance> {
        let Instance { ty, value } = self;
        match value.downcast::<T>() {
            Ok(v) => Ok(*v),
            Err(value) => Err(Instance { ty, value }),
        }
    }

    /// Split into type and value
    pub fn into_parts(self) -> (Type, AnyValue) {
        (self.ty, self.value)
    }

    /// Serialize through the type's codec
    ///
    /// Returns `None` when the type did not opt into migration.
    pub fn encode(&self) -> Option<Result<Vec<u8>, BoxError>> {
        let codec = self.ty.def().codec()?;
        Some(codec.encode(self.value()))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.ty.name())
            .field("context", &self.ty.origin().name())
            .finish()
    }
}

impl From<String> for Instance {
    fn from(value: String) -> Self {
        Instance::of(builtins::string_type(), value)
    }
}

impl From<&str> for Instance {
    fn from(value: &str) -> Self {
        Instance::from(value.to_string())
    }
}

macro_rules! wrapper_from {
    ($($ty:ty => $prim:ident),* $(,)?) => {
        $(
            impl From<$ty> for Instance {
                fn from(value: $ty) -> Self {
                    Instance::of(builtins::wrapper_type(PrimitiveType::$prim), value)
                }
            }
        )*
    };
}

wrapper_from! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}
