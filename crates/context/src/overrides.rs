use crate::component::{default_name_for, downcast, erase, ComponentType, ErasedInstance};
use crate::error::ContextError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

type OverrideFactory = Box<dyn Fn() -> ErasedInstance + Send + Sync>;

/// A caller-supplied component, created lazily on first access
pub struct OverrideEntry {
    name: String,
    component_type: ComponentType,
    primary: bool,
    factory: OverrideFactory,
    instance: OnceLock<ErasedInstance>,
}

impl OverrideEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_resolved(&self) -> bool {
        self.instance.get().is_some()
    }

    /// Instance for this entry. The factory runs at most once, even when
    /// several threads race on the first access.
    pub(crate) fn instance(&self) -> ErasedInstance {
        self.instance
            .get_or_init(|| {
                tracing::debug!("Creating override component '{}'", self.name);
                (self.factory)()
            })
            .clone()
    }
}

impl fmt::Debug for OverrideEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideEntry")
            .field("name", &self.name)
            .field("component_type", &self.component_type.type_name())
            .field("primary", &self.primary)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Named components supplied by the caller. They win over rule-produced
/// defaults of the same name.
#[derive(Debug, Default)]
pub struct OverrideRegistry {
    entries: HashMap<String, Arc<OverrideEntry>>,
    order: Vec<String>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lazily created component under `name`
    pub fn register<T, F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
    ) -> Result<(), ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.insert::<T, F>(name.into(), false, factory)
    }

    /// Register a component that wins by-type lookups among several candidates
    pub fn register_primary<T, F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
    ) -> Result<(), ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.insert::<T, F>(name.into(), true, factory)
    }

    /// Register an already created instance
    pub fn register_instance<T>(
        &mut self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> Result<(), ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert::<T, _>(name.into(), false, move || instance.clone())
    }

    /// Register `T::default()` under the type's own name
    pub fn register_default<T>(&mut self) -> Result<(), ContextError>
    where
        T: Default + Send + Sync + 'static,
    {
        self.insert::<T, _>(default_name_for::<T>(), false, || Arc::new(T::default()))
    }

    fn insert<T, F>(&mut self, name: String, primary: bool, factory: F) -> Result<(), ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        if self.entries.contains_key(&name) {
            return Err(ContextError::duplicate_override(name));
        }

        let entry = OverrideEntry {
            name: name.clone(),
            component_type: ComponentType::of::<T>(),
            primary,
            factory: Box::new(move || erase(factory())),
            instance: OnceLock::new(),
        };

        tracing::debug!(
            "Registered override '{}' of type {}",
            name,
            entry.component_type.type_name()
        );
        self.entries.insert(name.clone(), Arc::new(entry));
        self.order.push(name);
        Ok(())
    }

    /// Resolve the type-erased instance for `name`
    pub fn resolve(&self, name: &str) -> Result<ErasedInstance, ContextError> {
        self.entries
            .get(name)
            .map(|entry| entry.instance())
            .ok_or_else(|| ContextError::NoSuchBean {
                message: format!("no override named '{}' is registered", name),
            })
    }

    /// Resolve `name` as a `T`
    pub fn resolve_as<T>(&self, name: &str) -> Result<Arc<T>, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instance = self.resolve(name)?;
        downcast::<T>(&instance)
            .ok_or_else(|| ContextError::no_bean_named(name, std::any::type_name::<T>()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether the component for `name` has been created yet
    pub fn is_resolved(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .map(|entry| entry.is_resolved())
            .unwrap_or(false)
    }

    pub fn component_type(&self, name: &str) -> Option<ComponentType> {
        self.entries.get(name).map(|entry| entry.component_type)
    }

    /// Registered names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in registration order
    pub(crate) fn into_entries(mut self) -> Vec<Arc<OverrideEntry>> {
        self.order
            .iter()
            .filter_map(|name| self.entries.remove(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[derive(Debug)]
    struct Probe {
        id: usize,
    }

    #[test]
    fn test_duplicate_name_is_rejected_without_partial_registration() {
        let mut registry = OverrideRegistry::new();
        registry
            .register::<Probe, _>("probe", || Arc::new(Probe { id: 1 }))
            .unwrap();

        let error = registry
            .register::<String, _>("probe", || Arc::new("other".to_string()))
            .unwrap_err();

        assert!(error.is_duplicate_override());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.component_type("probe"), Some(ComponentType::of::<Probe>()));
        assert_eq!(registry.resolve_as::<Probe>("probe").unwrap().id, 1);
    }

    #[test]
    fn test_factory_is_lazy_and_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut registry = OverrideRegistry::new();
        registry
            .register::<Probe, _>("probe", move || {
                Arc::new(Probe {
                    id: counter.fetch_add(1, Ordering::SeqCst),
                })
            })
            .unwrap();

        assert!(!registry.is_resolved("probe"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let first = registry.resolve_as::<Probe>("probe").unwrap();
        let second = registry.resolve_as::<Probe>("probe").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.is_resolved("probe"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_access_creates_one_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut registry = OverrideRegistry::new();
        registry
            .register::<Probe, _>("probe", move || {
                std::thread::sleep(std::time::Duration::from_millis(5));
                Arc::new(Probe {
                    id: counter.fetch_add(1, Ordering::SeqCst),
                })
            })
            .unwrap();

        let barrier = Barrier::new(8);
        let instances: Vec<Arc<Probe>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        registry.resolve_as::<Probe>("probe").unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
    }

    #[test]
    fn test_register_default_uses_type_name() {
        #[derive(Default)]
        struct Marker;

        let mut registry = OverrideRegistry::new();
        registry.register_default::<Marker>().unwrap();

        let name = std::any::type_name::<Marker>();
        assert!(registry.contains(name));
        assert!(registry.resolve_as::<Marker>(name).is_ok());
        assert!(registry.register_default::<Marker>().unwrap_err().is_duplicate_override());
    }

    #[test]
    fn test_resolve_errors() {
        let mut registry = OverrideRegistry::new();
        registry
            .register_instance::<Probe>("probe", Arc::new(Probe { id: 7 }))
            .unwrap();

        assert!(registry.resolve("missing").unwrap_err().is_no_such_bean());
        assert!(registry.resolve_as::<String>("probe").unwrap_err().is_no_such_bean());
        assert_eq!(registry.names(), &["probe".to_string()]);
    }
}
