//! Builtin process context
//!
//! The process context is the default loading context. It defines
//! `std::string::String` and one wrapper type per primitive
//! (`std::primitive::i32` and so on), all of which can migrate between
//! contexts.

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::str::FromStr;
use std::sync::Arc;

use crate::def::TypeDef;
use crate::library::TypeLibrary;
use crate::primitive::PrimitiveType;
use crate::traits::LoadingContext;
use crate::types::Type;

/// Name of the builtin string type
pub const STRING: &str = "std::string::String";

/// Name of the process context
pub const PROCESS_CONTEXT: &str = "process";

static STRING_DEF: Lazy<Arc<TypeDef>> = Lazy::new(|| Arc::new(string_def()));

static WRAPPER_DEFS: Lazy<Vec<Arc<TypeDef>>> = Lazy::new(|| {
    PrimitiveType::ALL
        .iter()
        .map(|p| Arc::new(wrapper_for(*p)))
        .collect()
});

static PROCESS: Lazy<Arc<TypeLibrary>> = Lazy::new(|| {
    let mut builder = TypeLibrary::builder(PROCESS_CONTEXT).define_shared(Arc::clone(&STRING_DEF));
    for def in WRAPPER_DEFS.iter() {
        builder = builder.define_shared(Arc::clone(def));
    }
    builder.build()
});

/// The process-wide default loading context
pub fn process() -> Arc<dyn LoadingContext> {
    process_library()
}

/// The process context as a concrete library, e.g. to use as a parent
pub fn process_library() -> Arc<TypeLibrary> {
    Arc::clone(&PROCESS)
}

/// The builtin string type
pub fn string_type() -> Type {
    Type::new(Arc::clone(&STRING_DEF), PROCESS.handle().clone())
}

/// The wrapper type for a primitive
pub fn wrapper_type(primitive: PrimitiveType) -> Type {
    Type::new(
        Arc::clone(&WRAPPER_DEFS[primitive as usize]),
        PROCESS.handle().clone(),
    )
}

fn string_def() -> TypeDef {
    TypeDef::builder(STRING)
        .constructor(&[], |_| Ok(String::new()))
        .constructor(&[STRING], |args| Ok(args.get::<String>(0)?.clone()))
        .constructor(&["char"], |args| Ok(String::from(*args.get::<char>(0)?)))
        .constructor(&["i32"], |args| {
            let capacity = usize::try_from(*args.get::<i32>(0)?)?;
            Ok(String::with_capacity(capacity))
        })
        .serializable::<String>()
        .build()
}

fn wrapper_for(primitive: PrimitiveType) -> TypeDef {
    match primitive {
        PrimitiveType::Bool => wrapper_def::<bool>(primitive),
        PrimitiveType::Char => wrapper_def::<char>(primitive),
        PrimitiveType::I8 => wrapper_def::<i8>(primitive),
        PrimitiveType::I16 => wrapper_def::<i16>(primitive),
        PrimitiveType::I32 => wrapper_def::<i32>(primitive),
        PrimitiveType::I64 => wrapper_def::<i64>(primitive),
        PrimitiveType::F32 => wrapper_def::<f32>(primitive),
        PrimitiveType::F64 => wrapper_def::<f64>(primitive),
    }
}

// Default value, copy of the primitive, or parsed from a string.
fn wrapper_def<T>(primitive: PrimitiveType) -> TypeDef
where
    T: Any + Send + Sync + Copy + Default + FromStr + Serialize + DeserializeOwned,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    TypeDef::builder(primitive.wrapper_name())
        .constructor(&[], |_| Ok(T::default()))
        .constructor(&[primitive.name()], |args| Ok(*args.get::<T>(0)?))
        .constructor(&[STRING], |args| Ok(args.get::<String>(0)?.parse::<T>()?))
        .serializable::<T>()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;

    #[test]
    fn test_process_defines_string_and_wrappers() {
        let process = process_library();
        assert!(process.defines(STRING));
        for p in PrimitiveType::ALL {
            assert!(process.defines(p.wrapper_name()), "missing {}", p.wrapper_name());
            assert!(!process.defines(p.name()));
        }
        assert_eq!(process.type_names().len(), 9);
    }

    #[test]
    fn test_process_is_a_singleton() {
        assert_eq!(process().id(), process().id());
        assert_eq!(string_type(), process().load(STRING).unwrap());
    }

    #[test]
    fn test_wrapper_type_matches_lookup() {
        for p in PrimitiveType::ALL {
            let ty = wrapper_type(p);
            assert_eq!(ty.name(), p.wrapper_name());
            assert_eq!(ty, process().load(p.wrapper_name()).unwrap());
        }
    }

    #[test]
    fn test_string_constructors() {
        let ty = string_type();
        let copy = ty.constructor(&[STRING]).unwrap();
        let value = copy.invoke(&[Some(Instance::from("testing"))]).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "testing");

        let with_capacity = ty.constructor(&["i32"]).unwrap();
        let value = with_capacity.invoke(&[Some(Instance::from(64i32))]).unwrap();
        assert!(value.downcast_ref::<String>().unwrap().capacity() >= 64);
        assert!(with_capacity.invoke(&[Some(Instance::from(-1i32))]).is_err());
    }

    #[test]
    fn test_wrapper_parses_strings() {
        let ty = wrapper_type(PrimitiveType::I64);
        let parse = ty.constructor(&[STRING]).unwrap();

        let value = parse.invoke(&[Some(Instance::from("42"))]).unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&42));
        assert!(parse.invoke(&[Some(Instance::from("forty-two"))]).is_err());
    }
}
