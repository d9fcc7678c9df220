//! Core traits for type loading and factory strategies
//!
//! This module defines the two seams of the service:
//! - `LoadingContext`: an isolated namespace that resolves type names
//! - `Factory`: a pluggable strategy that builds instances for a type name

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TypeNotFound};
use crate::instance::Instance;
use crate::types::{ContextId, Type};

/// An isolated namespace from which named types can be resolved
///
/// Thread safety: implementations are shared between caller threads and
/// must be `Send + Sync`.
pub trait LoadingContext: Send + Sync + fmt::Debug {
    /// Identity of this context
    fn id(&self) -> ContextId;

    /// Display name, used in diagnostics
    fn name(&self) -> &str;

    /// Resolve a fully-qualified type name
    ///
    /// # Errors
    ///
    /// Returns `TypeNotFound` if neither this context nor any context it
    /// delegates to defines the name.
    fn load(&self, name: &str) -> std::result::Result<Type, TypeNotFound>;
}

/// Construction strategy for one type name, or for every type as the default
///
/// A strategy is built once per target type name and then shared by all
/// callers. `init` runs before the strategy is shared and receives the
/// concrete type name, even when the strategy was configured as the
/// default.
///
/// The context-taking methods ignore the context unless the strategy
/// overrides them; `is_loader_supported` reports whether it does.
pub trait Factory: Send + Sync {
    /// Bind the strategy to the type it will build
    fn init(&mut self, type_name: &str) -> Result<()>;

    /// Build an instance without arguments
    fn get_instance(&self) -> Result<Instance>;

    /// Build an instance, optionally within an explicit context
    fn get_instance_in(&self, context: Option<&Arc<dyn LoadingContext>>) -> Result<Instance> {
        let _ = context;
        self.get_instance()
    }

    /// Build an instance from constructor arguments and their signature
    fn get_instance_with(
        &self,
        args: &mut [Option<Instance>],
        signature: &[&str],
    ) -> Result<Instance>;

    /// Build an instance from arguments, optionally within an explicit context
    fn get_instance_in_with(
        &self,
        context: Option<&Arc<dyn LoadingContext>>,
        args: &mut [Option<Instance>],
        signature: &[&str],
    ) -> Result<Instance> {
        let _ = context;
        self.get_instance_with(args, signature)
    }

    /// Whether explicit contexts are honored
    fn is_loader_supported(&self) -> bool {
        false
    }
}
