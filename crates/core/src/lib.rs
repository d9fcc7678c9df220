//! Core types and traits for Fabrica
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: FactoryError taxonomy and TypeNotFound
//! - PrimitiveType: the fixed primitive table consulted by signatures
//! - TypeDef: explicit type definitions (constructors, migration codec)
//! - Type / ContextId: a definition bound to its defining loading context
//! - Instance: type-erased object tagged with its type
//! - Traits: LoadingContext and Factory
//! - TypeLibrary: the stock loading context
//! - Builtins: the process context (strings and primitive wrappers)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtins;
pub mod def;
pub mod error;
pub mod instance;
pub mod library;
pub mod primitive;
pub mod traits;
pub mod types;

pub use builtins::{process, process_library, string_type, wrapper_type, STRING};
pub use def::{AnyValue, Args, Codec, Constructor, TypeDef, TypeDefBuilder};
pub use error::{BoxError, FactoryError, Result, TypeNotFound};
pub use instance::Instance;
pub use library::{TypeLibrary, TypeLibraryBuilder};
pub use primitive::PrimitiveType;
pub use traits::{Factory, LoadingContext};
pub use types::{ContextHandle, ContextId, ParamType, Type};
