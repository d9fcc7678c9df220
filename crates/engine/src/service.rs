//! The instantiation engine
//!
//! `FactoryService` is the entry point hosts use to create objects by type
//! name. Every `get_instance*` overload runs the same algorithm:
//!
//! ```text
//! name ──▶ registry: strategy for name (or "default")?
//!            │ yes                         │ no
//!            ▼                             ▼
//!   delegate to the matching        resolve the type (explicit context,
//!   strategy overload               or default chain), match the
//!                                   signature, invoke the constructor
//! ```
//!
//! Strategy types themselves are built through the direct-construction
//! path, never through the registry, so a default strategy cannot recurse
//! into itself.
//!
//! # Lifecycle
//!
//! ```ignore
//! let service = FactoryService::new();
//! service.configure(&FactoryConfig::from_file(path)?)?;
//! service.initialize()?;   // builds the additional loading contexts
//! let widget = service.get_instance("app::Widget")?;
//! service.shutdown();      // drops strategies, mapping and contexts
//! ```

use fabrica_core::{
    builtins, Factory, FactoryError, Instance, LoadingContext, ParamType, Result, Type,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::FactoryConfig;
use crate::registry::FactoryRegistry;
use crate::resolver::TypeResolver;
use crate::signature::match_signature;

/// Creates instances of named types
///
/// Thread safety: all operations take `&self`; the service can be shared
/// behind an `Arc` by any number of caller threads.
#[derive(Debug)]
pub struct FactoryService {
    resolver: TypeResolver,
    registry: FactoryRegistry,
    /// Context-provider type names awaiting `initialize`
    loaders: Mutex<Vec<String>>,
}

impl FactoryService {
    /// Service whose default context is the process context
    pub fn new() -> Self {
        Self::with_default_context(builtins::process())
    }

    /// Service resolving through `default` first
    pub fn with_default_context(default: Arc<dyn LoadingContext>) -> Self {
        Self {
            resolver: TypeResolver::new(default),
            registry: FactoryRegistry::new(),
            loaders: Mutex::new(Vec::new()),
        }
    }

    /// Configure and initialize a service in one step
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or a loading context cannot
    /// be built.
    pub fn from_config(config: &FactoryConfig) -> Result<Self> {
        let service = Self::new();
        service.configure(config)?;
        service.initialize()?;
        Ok(service)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Store the loading-context names and the strategy mapping
    ///
    /// Nothing is instantiated here: contexts are built by `initialize`,
    /// strategies on first use.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Config` if the configuration has empty names.
    pub fn configure(&self, config: &FactoryConfig) -> Result<()> {
        config.validate()?;
        *self.loaders.lock() = config.loaders.clone();
        self.registry.configure(&config.factories);
        info!(
            target: "fabrica::service",
            loaders = config.loaders.len(),
            factories = config.factories.len(),
            "Configured factory service"
        );
        Ok(())
    }

    /// Build every configured loading context, in order
    ///
    /// The context list is replaced only if every context builds.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` naming the first context-provider type
    /// that cannot be resolved, constructed, or does not produce a context.
    pub fn initialize(&self) -> Result<()> {
        let names = self.loaders.lock().clone();
        let mut contexts = Vec::with_capacity(names.len());
        for name in &names {
            let context = self
                .build_loader(name)
                .map_err(|e| FactoryError::InitializationFailed {
                    loader: name.clone(),
                    source: Box::new(e),
                })?;
            info!(target: "fabrica::service", loader = %name, context = context.name(), "Added loading context");
            contexts.push(context);
        }

        self.resolver.clear();
        for context in contexts {
            self.resolver.push(context);
        }
        Ok(())
    }

    /// Drop cached strategies, the strategy mapping and additional contexts
    pub fn shutdown(&self) {
        self.registry.clear();
        self.resolver.clear();
        self.loaders.lock().clear();
        info!(target: "fabrica::service", "Factory service shut down");
    }

    fn build_loader(&self, name: &str) -> Result<Arc<dyn LoadingContext>> {
        let ty = self.resolver.resolve_default(name)?;
        self.instantiate(&ty)?
            .downcast::<Arc<dyn LoadingContext>>()
            .map_err(|_| FactoryError::construction(name, "does not provide a loading context"))
    }

    // ========================================================================
    // Instance creation
    // ========================================================================

    /// New instance of `name` without arguments
    ///
    /// # Errors
    ///
    /// - `MissingTypeName` if `name` is empty
    /// - `TypeNotFound` if no context defines `name`
    /// - `IncorrectFactory` if the configured strategy is not a `Factory`
    /// - `ConstructionFailed` if the zero-argument constructor is missing or fails
    pub fn get_instance(&self, name: &str) -> Result<Instance> {
        match self.strategy(name)? {
            Some(factory) => factory.get_instance(),
            None => {
                let ty = self.resolve_type(name, None)?;
                self.instantiate(&ty)
            }
        }
    }

    /// New instance of `name`, resolved in `context` if one is given
    ///
    /// With a context, resolution does not fall back to the default chain.
    /// A strategy receives the context whether or not it supports one.
    ///
    /// # Errors
    ///
    /// Same as [`get_instance`](Self::get_instance).
    pub fn get_instance_in(
        &self,
        name: &str,
        context: Option<&Arc<dyn LoadingContext>>,
    ) -> Result<Instance> {
        match self.strategy(name)? {
            Some(factory) => {
                note_unsupported_context(name, factory.as_ref(), context);
                factory.get_instance_in(context)
            }
            None => {
                let ty = self.resolve_type(name, context)?;
                self.instantiate(&ty)
            }
        }
    }

    /// New instance of `name` from arguments and their signature
    ///
    /// `args` may be rewritten in place when an argument is migrated into
    /// the parameter type's context.
    ///
    /// # Errors
    ///
    /// Same as [`get_instance`](Self::get_instance), plus
    /// `SignatureMismatch` when `args` and `signature` differ in length.
    pub fn get_instance_with(
        &self,
        name: &str,
        args: &mut [Option<Instance>],
        signature: &[&str],
    ) -> Result<Instance> {
        match self.strategy(name)? {
            Some(factory) => factory.get_instance_with(args, signature),
            None => {
                let ty = self.resolve_type(name, None)?;
                self.instantiate_with(&ty, args, Some(signature))
            }
        }
    }

    /// New instance of `name` from arguments, resolved in `context` if given
    ///
    /// # Errors
    ///
    /// Same as [`get_instance_with`](Self::get_instance_with).
    pub fn get_instance_in_with(
        &self,
        name: &str,
        context: Option<&Arc<dyn LoadingContext>>,
        args: &mut [Option<Instance>],
        signature: &[&str],
    ) -> Result<Instance> {
        match self.strategy(name)? {
            Some(factory) => {
                note_unsupported_context(name, factory.as_ref(), context);
                factory.get_instance_in_with(context, args, signature)
            }
            None => {
                let ty = self.resolve_type(name, context)?;
                self.instantiate_with(&ty, args, Some(signature))
            }
        }
    }

    /// Whether explicit contexts are honored for `name`
    ///
    /// Direct construction always honors them; a strategy answers for
    /// itself.
    ///
    /// # Errors
    ///
    /// Fails if the configured strategy cannot be built.
    pub fn is_loader_supported(&self, name: &str) -> Result<bool> {
        Ok(self
            .strategy(name)?
            .map_or(true, |factory| factory.is_loader_supported()))
    }

    /// Resolved parameter types for `names` against `target`
    ///
    /// Arguments created in another context than their parameter type are
    /// migrated in place when possible.
    ///
    /// # Errors
    ///
    /// - `SignatureMismatch` if `names` and `args` differ in length
    /// - `TypeNotFound` if a non-primitive name does not resolve
    pub fn signature(
        &self,
        target: &Type,
        args: &mut [Option<Instance>],
        names: Option<&[&str]>,
    ) -> Result<Option<Vec<ParamType>>> {
        match_signature(&self.resolver, target, args, names)
    }

    /// Construct `ty` with its zero-argument constructor, bypassing strategies
    ///
    /// # Errors
    ///
    /// Returns `ConstructionFailed` if the constructor is missing or fails.
    pub fn instantiate(&self, ty: &Type) -> Result<Instance> {
        self.instantiate_with(ty, &mut [], None)
    }

    /// Construct `ty` from arguments, bypassing strategies
    ///
    /// # Errors
    ///
    /// - `SignatureMismatch` / `TypeNotFound` from signature matching
    /// - `ConstructionFailed` if no constructor has the resolved parameter
    ///   list, an argument does not fit its parameter, or the body fails
    pub fn instantiate_with(
        &self,
        ty: &Type,
        args: &mut [Option<Instance>],
        signature: Option<&[&str]>,
    ) -> Result<Instance> {
        let params = self.signature(ty, args, signature)?.unwrap_or_default();
        let names: Vec<&str> = params.iter().map(ParamType::name).collect();

        let ctor = ty.constructor(&names).ok_or_else(|| {
            FactoryError::construction(
                ty.name(),
                format!("no constructor ({})", names.join(", ")),
            )
        })?;
        if args.len() != ctor.arity() {
            return Err(FactoryError::construction(
                ty.name(),
                format!("expected {} arguments, got {}", ctor.arity(), args.len()),
            ));
        }
        for (index, (param, arg)) in params.iter().zip(args.iter()).enumerate() {
            if !param.accepts(arg.as_ref()) {
                let actual = arg.as_ref().map_or("null", |a| a.type_name());
                return Err(FactoryError::construction(
                    ty.name(),
                    format!("argument {} is {}, expected {}", index, actual, param.name()),
                ));
            }
        }

        let value = ctor
            .invoke(args)
            .map_err(|e| FactoryError::construction_source(ty.name(), e))?;
        Ok(Instance::new(ty.clone(), value))
    }

    /// Resolve `name`, in `context` only if one is given
    ///
    /// # Errors
    ///
    /// - `MissingTypeName` if `name` is empty
    /// - `TypeNotFound` listing the contexts tried
    pub fn resolve_type(
        &self,
        name: &str,
        context: Option<&Arc<dyn LoadingContext>>,
    ) -> Result<Type> {
        if name.is_empty() {
            return Err(FactoryError::MissingTypeName);
        }
        Ok(self.resolver.resolve(name, context)?)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The context tried first
    pub fn default_context(&self) -> &Arc<dyn LoadingContext> {
        self.resolver.default_context()
    }

    /// Additional contexts built by `initialize`, in resolution order
    pub fn contexts(&self) -> Vec<Arc<dyn LoadingContext>> {
        self.resolver.contexts()
    }

    /// The strategy registry
    pub fn registry(&self) -> &FactoryRegistry {
        &self.registry
    }

    fn strategy(&self, name: &str) -> Result<Option<Arc<dyn Factory>>> {
        if name.is_empty() {
            return Err(FactoryError::MissingTypeName);
        }
        self.registry.resolve(name, |factory_name| {
            let ty = self.resolver.resolve_default(factory_name)?;
            self.instantiate(&ty)
        })
    }
}

impl Default for FactoryService {
    fn default() -> Self {
        Self::new()
    }
}

fn note_unsupported_context(
    name: &str,
    factory: &dyn Factory,
    context: Option<&Arc<dyn LoadingContext>>,
) {
    if let Some(context) = context {
        if !factory.is_loader_supported() {
            debug!(target: "fabrica::factory", type_name = name, context = context.name(), "Strategy does not support explicit contexts");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabrica_core::PrimitiveType;

    #[test]
    fn test_empty_name_is_missing_type_name() {
        let service = FactoryService::new();
        assert!(matches!(
            service.get_instance("").unwrap_err(),
            FactoryError::MissingTypeName
        ));
        assert!(matches!(
            service.resolve_type("", None).unwrap_err(),
            FactoryError::MissingTypeName
        ));
    }

    #[test]
    fn test_instantiate_builtin_wrapper() {
        let service = FactoryService::new();
        let ty = builtins::wrapper_type(PrimitiveType::I64);

        let zero = service.instantiate(&ty).unwrap();
        assert_eq!(zero.downcast_ref::<i64>(), Some(&0));

        let mut args = vec![Some(Instance::from(7i64))];
        let seven = service
            .instantiate_with(&ty, &mut args, Some(&["i64"]))
            .unwrap();
        assert_eq!(seven.downcast_ref::<i64>(), Some(&7));
    }

    #[test]
    fn test_primitive_parameter_rejects_null() {
        let service = FactoryService::new();
        let ty = builtins::wrapper_type(PrimitiveType::I32);

        let mut args = vec![None];
        let err = service
            .instantiate_with(&ty, &mut args, Some(&["i32"]))
            .unwrap_err();
        assert!(matches!(err, FactoryError::ConstructionFailed { .. }));
    }

    #[test]
    fn test_primitive_parameter_rejects_wrong_primitive() {
        let service = FactoryService::new();
        let ty = builtins::wrapper_type(PrimitiveType::I32);

        let mut args = vec![Some(Instance::from(1i64))];
        let err = service
            .instantiate_with(&ty, &mut args, Some(&["i32"]))
            .unwrap_err();
        assert!(err.to_string().contains("expected i32"), "got: {}", err);
    }

    #[test]
    fn test_missing_constructor_is_construction_failure() {
        let service = FactoryService::new();
        let mut args = vec![Some(Instance::from(true))];
        let err = service
            .get_instance_with(builtins::STRING, &mut args, &["bool"])
            .unwrap_err();
        match err {
            FactoryError::ConstructionFailed { type_name, .. } => {
                assert_eq!(type_name, builtins::STRING)
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_constructor_body_error_is_preserved() {
        let service = FactoryService::new();
        let mut args = vec![Some(Instance::from("not a number"))];
        let err = service
            .get_instance_with("std::primitive::i32", &mut args, &[builtins::STRING])
            .unwrap_err();

        assert!(matches!(err, FactoryError::ConstructionFailed { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
