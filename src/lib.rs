//! Fabrica - create objects by type name
//!
//! Fabrica resolves a type name across isolated loading contexts and builds
//! an instance through a best-matching constructor, or through a pluggable
//! factory strategy configured for that type.
//!
//! # Quick Start
//!
//! ```ignore
//! use fabrica::{FactoryService, Instance, STRING};
//!
//! let service = FactoryService::new();
//!
//! // Zero-argument constructor
//! let empty = service.get_instance(STRING)?;
//!
//! // Constructor selected by signature
//! let mut args = vec![Some(Instance::from("testing"))];
//! let text = service.get_instance_with(STRING, &mut args, &[STRING])?;
//! assert_eq!(text.downcast_ref::<String>().map(String::as_str), Some("testing"));
//! ```
//!
//! # Architecture
//!
//! Types are described with [`TypeDef`] and registered in a
//! [`TypeLibrary`], the stock [`LoadingContext`]. The [`FactoryService`]
//! resolves names through its default context and any additional contexts
//! named in its [`FactoryConfig`], and delegates to a [`Factory`] strategy
//! when one is configured for the name.

pub use fabrica_core::*;
pub use fabrica_engine::*;
