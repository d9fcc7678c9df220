//! Type name resolution across loading contexts
//!
//! Resolution order without an explicit context:
//!
//! ```text
//! default context ──miss──▶ additional[0] ──miss──▶ additional[1] ... ──▶ TypeNotFound
//! ```
//!
//! With an explicit context only that context is consulted. Nothing is
//! cached; every call goes back to the contexts.

use fabrica_core::{LoadingContext, Type, TypeNotFound};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

/// Resolves type names through the default and additional contexts
#[derive(Debug)]
pub struct TypeResolver {
    default: Arc<dyn LoadingContext>,
    additional: RwLock<Vec<Arc<dyn LoadingContext>>>,
}

impl TypeResolver {
    /// Resolver with no additional contexts
    pub fn new(default: Arc<dyn LoadingContext>) -> Self {
        Self {
            default,
            additional: RwLock::new(Vec::new()),
        }
    }

    /// The context tried first
    pub fn default_context(&self) -> &Arc<dyn LoadingContext> {
        &self.default
    }

    /// Snapshot of the additional contexts, in resolution order
    pub fn contexts(&self) -> Vec<Arc<dyn LoadingContext>> {
        self.additional.read().clone()
    }

    /// Append a context to the end of the chain
    pub(crate) fn push(&self, context: Arc<dyn LoadingContext>) {
        self.additional.write().push(context);
    }

    /// Drop every additional context
    pub(crate) fn clear(&self) {
        self.additional.write().clear();
    }

    /// Resolve `name`, in `context` only if one is given
    ///
    /// # Errors
    ///
    /// Returns `TypeNotFound` listing every context tried.
    pub fn resolve(
        &self,
        name: &str,
        context: Option<&Arc<dyn LoadingContext>>,
    ) -> Result<Type, TypeNotFound> {
        match context {
            Some(context) => context.load(name),
            None => self.resolve_default(name),
        }
    }

    /// Resolve `name` through the default chain
    ///
    /// # Errors
    ///
    /// Returns the default context's failure, extended with each
    /// additional context that was also tried.
    pub fn resolve_default(&self, name: &str) -> Result<Type, TypeNotFound> {
        let mut not_found = match self.default.load(name) {
            Ok(ty) => return Ok(ty),
            Err(e) => e,
        };

        // Snapshot so that no lock is held while contexts run.
        for context in self.contexts() {
            match context.load(name) {
                Ok(ty) => {
                    trace!(target: "fabrica::resolve", name = name, context = context.name(), "Resolved in additional context");
                    return Ok(ty);
                }
                Err(_) => not_found = not_found.also_tried(context.name()),
            }
        }
        Err(not_found)
    }
}
