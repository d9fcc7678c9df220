//! Factory strategy registry
//!
//! Holds the configured mapping (target type name to strategy type name)
//! and the cache of live strategies. Strategies are built on first use and
//! cached under the target type name, so a strategy configured as the
//! default gets one instance per target type.

use dashmap::DashMap;
use fabrica_core::{Factory, FactoryError, Instance, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::DEFAULT_FACTORY;

/// Configured strategy names and the cache of live strategies
#[derive(Default)]
pub struct FactoryRegistry {
    classes: DashMap<String, String>,
    factories: DashMap<String, Arc<dyn Factory>>,
}

impl FactoryRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configured mapping
    ///
    /// Live strategies stay cached.
    pub fn configure(&self, mapping: &BTreeMap<String, String>) {
        self.classes.clear();
        for (key, factory) in mapping {
            self.classes.insert(key.clone(), factory.clone());
        }
    }

    /// Map one target type name (or `"default"`) to a strategy type name
    pub fn register(&self, key: impl Into<String>, factory: impl Into<String>) {
        self.classes.insert(key.into(), factory.into());
    }

    /// Strategy type name configured for `name`, falling back to the default
    pub fn configured(&self, name: &str) -> Option<String> {
        self.classes
            .get(name)
            .or_else(|| self.classes.get(DEFAULT_FACTORY))
            .map(|entry| entry.value().clone())
    }

    /// Live strategy cached for `name`
    pub fn cached(&self, name: &str) -> Option<Arc<dyn Factory>> {
        self.factories.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of live strategies
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// True if no strategy has been built yet
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Forget the mapping and every live strategy
    pub fn clear(&self) {
        self.factories.clear();
        self.classes.clear();
    }

    /// Strategy for `name`, building and caching it on first use
    ///
    /// `build` constructs an instance of the strategy type by name; it runs
    /// without any map lock held. When two callers race, both may build,
    /// the first insert wins and every caller gets the cached strategy.
    ///
    /// Returns `Ok(None)` when neither `name` nor the default has a
    /// strategy configured.
    ///
    /// # Errors
    ///
    /// - whatever `build` or the strategy's `init` returns
    /// - `IncorrectFactory` if the built instance is not a strategy
    pub fn resolve<B>(&self, name: &str, build: B) -> Result<Option<Arc<dyn Factory>>>
    where
        B: FnOnce(&str) -> Result<Instance>,
    {
        if let Some(factory) = self.cached(name) {
            return Ok(Some(factory));
        }

        let factory_name = match self.configured(name) {
            Some(factory_name) => factory_name,
            None => return Ok(None),
        };

        let instance = build(&factory_name)?;
        let mut factory = instance
            .downcast::<Box<dyn Factory>>()
            .map_err(|_| FactoryError::IncorrectFactory {
                factory: factory_name.clone(),
                type_name: name.to_string(),
            })?;
        factory.init(name)?;
        let built: Arc<dyn Factory> = Arc::from(factory);

        // Use entry API for atomic get-or-insert
        let entry = self
            .factories
            .entry(name.to_string())
            .or_insert_with(|| Arc::clone(&built));
        let cached = Arc::clone(entry.value());
        drop(entry);

        if !Arc::ptr_eq(&cached, &built) {
            debug!(target: "fabrica::factory", type_name = name, factory = %factory_name, "Discarded strategy built by a racing caller");
        } else {
            debug!(target: "fabrica::factory", type_name = name, factory = %factory_name, "Cached strategy");
        }
        Ok(Some(cached))
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("configured", &self.classes.len())
            .field("cached", &self.factories.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabrica_core::{builtins, LoadingContext, TypeDef, TypeLibrary};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        target: Option<String>,
    }

    impl Factory for Fixed {
        fn init(&mut self, type_name: &str) -> Result<()> {
            self.target = Some(type_name.to_string());
            Ok(())
        }

        fn get_instance(&self) -> Result<Instance> {
            Ok(Instance::from(self.target.clone().unwrap_or_default()))
        }

        fn get_instance_with(
            &self,
            _args: &mut [Option<Instance>],
            _signature: &[&str],
        ) -> Result<Instance> {
            self.get_instance()
        }
    }

    fn library() -> Arc<dyn LoadingContext> {
        TypeLibrary::builder("strategies")
            .define(
                TypeDef::builder("app::Fixed")
                    .factory(|| Fixed { target: None })
                    .build(),
            )
            .define(
                TypeDef::builder("app::NotAFactory")
                    .constructor(&[], |_| Ok(1u8))
                    .build(),
            )
            .build()
    }

    fn builder(context: Arc<dyn LoadingContext>) -> impl Fn(&str) -> Result<Instance> {
        move |name: &str| {
            let ty = context.load(name)?;
            let ctor = ty
                .constructor(&[])
                .ok_or_else(|| FactoryError::construction(name, "no default constructor"))?;
            let value = ctor
                .invoke(&[])
                .map_err(|e| FactoryError::construction_source(name, e))?;
            Ok(Instance::new(ty.clone(), value))
        }
    }

    #[test]
    fn test_unconfigured_name_has_no_strategy() {
        let registry = FactoryRegistry::new();
        let calls = AtomicUsize::new(0);
        let result = registry
            .resolve("app::Widget", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Instance::from(0i32))
            })
            .unwrap();

        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_explicit_mapping_beats_default() {
        let registry = FactoryRegistry::new();
        registry.register(DEFAULT_FACTORY, "app::Default");
        registry.register("app::Widget", "app::Fixed");

        assert_eq!(registry.configured("app::Widget").as_deref(), Some("app::Fixed"));
        assert_eq!(registry.configured("app::Other").as_deref(), Some("app::Default"));
    }

    #[test]
    fn test_strategy_is_built_once_and_bound_to_target() {
        let registry = FactoryRegistry::new();
        registry.register(DEFAULT_FACTORY, "app::Fixed");
        let build = builder(library());

        let first = registry.resolve("app::Widget", &build).unwrap().unwrap();
        let second = registry.resolve("app::Widget", &build).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let made = first.get_instance().unwrap();
        assert_eq!(made.downcast_ref::<String>().unwrap(), "app::Widget");

        // The default strategy gets one instance per target name.
        let other = registry.resolve("app::Gadget", &build).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_non_factory_is_incorrect_factory() {
        let registry = FactoryRegistry::new();
        registry.register("app::Widget", "app::NotAFactory");

        let err = registry
            .resolve("app::Widget", builder(library()))
            .err()
            .unwrap();
        match err {
            FactoryError::IncorrectFactory { factory, type_name } => {
                assert_eq!(factory, "app::NotAFactory");
                assert_eq!(type_name, "app::Widget");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(registry.cached("app::Widget").is_none());
    }

    #[test]
    fn test_unknown_strategy_type_propagates() {
        let registry = FactoryRegistry::new();
        registry.register("app::Widget", "app::Missing");

        let err = registry
            .resolve("app::Widget", builder(builtins::process()))
            .err()
            .unwrap();
        assert!(err.is_type_not_found());
    }

    #[test]
    fn test_clear_forgets_everything() {
        let registry = FactoryRegistry::new();
        registry.register("app::Widget", "app::Fixed");
        registry.resolve("app::Widget", builder(library())).unwrap();
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.configured("app::Widget").is_none());
    }
}
