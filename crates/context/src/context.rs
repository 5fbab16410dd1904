//! The resolved component context
//!
//! Built once from activation rules, a configuration and an override
//! registry, then queried by name or by declared type. A built context never
//! changes; a different configuration needs a new context.

use crate::component::{downcast, ComponentType, ErasedInstance};
use crate::config::ConfigStore;
use crate::error::ContextError;
use crate::overrides::{OverrideEntry, OverrideRegistry};
use crate::rule::ActivationRule;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

enum ContextEntry {
    /// Produced by a passing activation rule
    Default {
        component_type: ComponentType,
        instance: ErasedInstance,
    },
    /// Supplied by the caller
    Override(Arc<OverrideEntry>),
}

impl ContextEntry {
    fn component_type(&self) -> ComponentType {
        match self {
            ContextEntry::Default { component_type, .. } => *component_type,
            ContextEntry::Override(entry) => entry.component_type(),
        }
    }

    fn instance(&self) -> ErasedInstance {
        match self {
            ContextEntry::Default { instance, .. } => instance.clone(),
            ContextEntry::Override(entry) => entry.instance(),
        }
    }

    fn is_primary(&self) -> bool {
        matches!(self, ContextEntry::Override(entry) if entry.is_primary())
    }
}

/// Immutable set of active components
pub struct ComponentContext {
    entries: HashMap<String, ContextEntry>,
    by_type: HashMap<TypeId, Vec<String>>,
    order: Vec<String>,
}

impl ComponentContext {
    /// Resolve the active components.
    ///
    /// Every rule is evaluated against `config`. A passing rule creates its
    /// default component unless an override claims the same name. All
    /// overrides are then merged in, whether or not any rule for their type
    /// passed.
    pub fn build(
        rules: &[ActivationRule],
        config: &ConfigStore,
        overrides: OverrideRegistry,
    ) -> Result<Self, ContextError> {
        let mut context = Self {
            entries: HashMap::new(),
            by_type: HashMap::new(),
            order: Vec::new(),
        };

        let outcomes: Vec<bool> = rules.iter().map(|rule| rule.evaluate(config)).collect();

        for (rule, active) in rules.iter().zip(outcomes) {
            if !active {
                tracing::debug!(
                    "Skipping component '{}': condition {} not met",
                    rule.name(),
                    rule.condition()
                );
                continue;
            }

            if overrides.contains(rule.name()) {
                tracing::debug!("Component '{}' replaced by override", rule.name());
                continue;
            }

            if context.entries.contains_key(rule.name()) {
                return Err(ContextError::duplicate_component(rule.name()));
            }

            let instance = rule.instantiate(config).map_err(|e| match e {
                ContextError::PropertyBinding { .. } => e,
                other => ContextError::component_creation(rule.name(), other.to_string()),
            })?;

            tracing::debug!(
                "Activated component '{}' of type {}",
                rule.name(),
                rule.component_type().type_name()
            );
            context.insert(
                rule.name().to_string(),
                ContextEntry::Default {
                    component_type: rule.component_type(),
                    instance,
                },
            );
        }

        for entry in overrides.into_entries() {
            let name = entry.name().to_string();
            context.insert(name, ContextEntry::Override(entry));
        }

        tracing::info!(
            "Component context built with {} components ({} rules evaluated)",
            context.len(),
            rules.len()
        );

        Ok(context)
    }

    fn insert(&mut self, name: String, entry: ContextEntry) {
        self.by_type
            .entry(entry.component_type().type_id())
            .or_default()
            .push(name.clone());
        self.order.push(name.clone());
        self.entries.insert(name, entry);
    }

    /// True iff exactly one component of type `T` is present
    pub fn has_single_bean<T: ?Sized + 'static>(&self) -> bool {
        self.names_for(TypeId::of::<T>()).len() == 1
    }

    /// True iff no component of type `T` is present
    pub fn does_not_have_bean<T: ?Sized + 'static>(&self) -> bool {
        self.names_for(TypeId::of::<T>()).is_empty()
    }

    /// True iff a component is registered under `name`
    pub fn has_bean(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The single component of type `T`.
    ///
    /// With several candidates, a single primary override wins; otherwise
    /// the lookup is ambiguous.
    pub fn get_bean<T>(&self) -> Result<Arc<T>, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let candidates = self.names_for(TypeId::of::<T>());

        let name = match candidates {
            [] => return Err(ContextError::no_bean_of_type(type_name)),
            [single] => single,
            several => {
                let primaries: Vec<&String> = several
                    .iter()
                    .filter(|name| {
                        self.entries
                            .get(*name)
                            .map(ContextEntry::is_primary)
                            .unwrap_or(false)
                    })
                    .collect();
                match primaries.as_slice() {
                    [primary] => *primary,
                    _ => return Err(ContextError::ambiguous(type_name, several.to_vec())),
                }
            }
        };

        self.typed_instance::<T>(name)
            .ok_or_else(|| ContextError::no_bean_of_type(type_name))
    }

    /// The component registered under `name`, which must be of type `T`
    pub fn get_bean_named<T>(&self, name: &str) -> Result<Arc<T>, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        match self.entries.get(name) {
            Some(entry) if entry.component_type().is::<T>() => self
                .typed_instance::<T>(name)
                .ok_or_else(|| ContextError::no_bean_named(name, type_name)),
            _ => Err(ContextError::no_bean_named(name, type_name)),
        }
    }

    /// Names of every component of type `T`, in registration order
    pub fn bean_names_for_type<T: ?Sized + 'static>(&self) -> Vec<String> {
        self.names_for(TypeId::of::<T>()).to_vec()
    }

    /// Names of every component, defaults first, then overrides
    pub fn bean_names(&self) -> &[String] {
        &self.order
    }

    /// Declared type of the component registered under `name`
    pub fn component_type(&self, name: &str) -> Option<ComponentType> {
        self.entries.get(name).map(ContextEntry::component_type)
    }

    /// Whether `name` was supplied by the caller rather than a rule
    pub fn is_override(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(ContextEntry::Override(_)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn names_for(&self, type_id: TypeId) -> &[String] {
        self.by_type
            .get(&type_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn typed_instance<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        let instance = self.entries.get(name)?.instance();
        downcast::<T>(&instance)
    }
}

impl fmt::Debug for ComponentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let components: Vec<(&str, &'static str)> = self
            .order
            .iter()
            .filter_map(|name| {
                self.entries
                    .get(name)
                    .map(|entry| (name.as_str(), entry.component_type().type_name()))
            })
            .collect();
        f.debug_struct("ComponentContext")
            .field("components", &components)
            .finish()
    }
}
