use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Type-erased component instance.
///
/// The concrete value stored behind the `Any` is always an `Arc<T>` for the
/// declared type `T`, which lets trait-object types such as `dyn CommandBus`
/// round-trip through the context.
pub type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// Declared type of a component, used for by-type lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentType {
    type_id: TypeId,
    type_name: &'static str,
}

impl ComponentType {
    /// Component type for `T`, which may be unsized
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether this is the declared type `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Last path segment of the type name, e.g. `CorrelationContext`
    pub fn short_name(&self) -> &'static str {
        let base = self.type_name.split('<').next().unwrap_or(self.type_name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// Erase a typed instance
pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> ErasedInstance {
    Arc::new(instance)
}

/// Recover the typed instance from an erased one
pub(crate) fn downcast<T: ?Sized + Send + Sync + 'static>(
    instance: &ErasedInstance,
) -> Option<Arc<T>> {
    instance.downcast_ref::<Arc<T>>().cloned()
}

/// Default bean name for a type, derived the way a harness names beans
/// registered by type alone
pub(crate) fn default_name_for<T: ?Sized + 'static>() -> String {
    ComponentType::of::<T>().type_name().to_string()
}
