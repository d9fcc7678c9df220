//! Instantiation engine for Fabrica
//!
//! This crate turns type names into instances:
//! - TypeResolver: default context first, then the additional contexts
//! - Signature matching: primitive table, then type resolution, with
//!   cross-context migration of arguments
//! - Migration: serialize an argument and rebuild it in another context
//! - FactoryRegistry: lazily built, per-type factory strategies
//! - FactoryService: the public entry point tying the above together
//! - Config: TOML configuration of contexts and strategies

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod migrate;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod signature;

pub use config::{FactoryConfig, DEFAULT_FACTORY};
pub use migrate::{migrate, write_object, ContextInput, MigrationError};
pub use registry::FactoryRegistry;
pub use resolver::TypeResolver;
pub use service::FactoryService;
pub use signature::match_signature;
