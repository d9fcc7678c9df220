//! Type libraries
//!
//! A `TypeLibrary` is the stock [`LoadingContext`]: a fixed set of type
//! definitions with an optional parent. Lookups go to the parent first, so
//! a name visible through the parent is always defined by the parent and
//! every library sharing that parent sees the same type.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::def::TypeDef;
use crate::error::TypeNotFound;
use crate::traits::LoadingContext;
use crate::types::{ContextHandle, ContextId, Type};

/// Loading context backed by registered definitions
pub struct TypeLibrary {
    handle: ContextHandle,
    parent: Option<Arc<dyn LoadingContext>>,
    defs: HashMap<String, Arc<TypeDef>>,
}

impl TypeLibrary {
    /// Start building a library with the given display name
    pub fn builder(name: impl Into<String>) -> TypeLibraryBuilder {
        TypeLibraryBuilder {
            name: name.into(),
            parent: None,
            defs: Vec::new(),
        }
    }

    /// Handle that types defined here carry
    pub fn handle(&self) -> &ContextHandle {
        &self.handle
    }

    /// Parent context, if any
    pub fn parent(&self) -> Option<&Arc<dyn LoadingContext>> {
        self.parent.as_ref()
    }

    /// True if this library itself defines `name`
    pub fn defines(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Names defined by this library, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn load_local(&self, name: &str) -> Option<Type> {
        self.defs
            .get(name)
            .map(|def| Type::new(Arc::clone(def), self.handle.clone()))
    }
}

impl LoadingContext for TypeLibrary {
    fn id(&self) -> ContextId {
        self.handle.id()
    }

    fn name(&self) -> &str {
        self.handle.name()
    }

    fn load(&self, name: &str) -> Result<Type, TypeNotFound> {
        match &self.parent {
            Some(parent) => match parent.load(name) {
                Ok(ty) => Ok(ty),
                Err(not_found) => self
                    .load_local(name)
                    .ok_or_else(|| not_found.also_tried(self.name())),
            },
            None => self
                .load_local(name)
                .ok_or_else(|| TypeNotFound::new(name, self.name())),
        }
    }
}

impl fmt::Debug for TypeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeLibrary")
            .field("name", &self.handle.name())
            .field("id", &self.handle.id())
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .field("types", &self.defs.len())
            .finish()
    }
}

/// Builder for [`TypeLibrary`]
pub struct TypeLibraryBuilder {
    name: String,
    parent: Option<Arc<dyn LoadingContext>>,
    defs: Vec<Arc<TypeDef>>,
}

impl TypeLibraryBuilder {
    /// Delegate lookups to `parent` before local definitions
    pub fn parent(mut self, parent: Arc<dyn LoadingContext>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add a definition; a later definition with the same name replaces it
    pub fn define(self, def: TypeDef) -> Self {
        self.define_shared(Arc::new(def))
    }

    /// Add a definition that may also be registered in other libraries
    ///
    /// Each library still yields its own distinct type for it.
    pub fn define_shared(mut self, def: Arc<TypeDef>) -> Self {
        self.defs.push(def);
        self
    }

    /// Finish the library
    pub fn build(self) -> Arc<TypeLibrary> {
        let id = ContextId::new();
        let name: Arc<str> = Arc::from(self.name);
        let parent = self.parent;
        let defs: HashMap<String, Arc<TypeDef>> = self
            .defs
            .into_iter()
            .map(|def| (def.name().to_string(), def))
            .collect();

        Arc::new_cyclic(|me: &Weak<TypeLibrary>| {
            let me: Weak<dyn LoadingContext> = me.clone();
            TypeLibrary {
                handle: ContextHandle::new(id, name, me),
                parent,
                defs,
            }
        })
    }
}
