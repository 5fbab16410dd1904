use crate::config::ConfigStore;
use crate::context::ComponentContext;
use crate::error::ContextError;
use crate::overrides::OverrideRegistry;
use crate::rule::{ActivationRule, AutoConfiguration};
use std::sync::Arc;

type BeanRegistration =
    Arc<dyn Fn(&mut OverrideRegistry) -> Result<(), ContextError> + Send + Sync>;

/// Staged configuration for building component contexts.
///
/// A runner holds rules, properties and caller-supplied beans but never a
/// built context. Every [`ContextRunner::build`] or [`ContextRunner::run`]
/// produces a fresh [`ComponentContext`], so one runner can be shared by many
/// independent test cases.
///
/// ```rust
/// use elif_context::{ActivationRule, Condition, ContextRunner};
/// use std::sync::Arc;
///
/// let runner = ContextRunner::new()
///     .with_rule(ActivationRule::new::<String, _>(
///         "greeting",
///         Condition::on_property("greeting.enabled"),
///         || Arc::new("hello".to_string()),
///     ))
///     .with_property_values(&["greeting.enabled=true"]);
///
/// let greeting = runner.run(|context| context.get_bean::<String>()).unwrap().unwrap();
/// assert_eq!(greeting.as_str(), "hello");
/// ```
#[derive(Clone, Default)]
pub struct ContextRunner {
    configurations: Vec<&'static str>,
    rules: Vec<ActivationRule>,
    config: ConfigStore,
    beans: Vec<BeanRegistration>,
}

impl ContextRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every rule contributed by an auto-configuration
    pub fn with_configuration<C: AutoConfiguration>(mut self, configuration: C) -> Self {
        self.configurations.push(configuration.name());
        self.rules.extend(configuration.rules());
        self
    }

    pub fn with_rule(mut self, rule: ActivationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Layer `key=value` pairs on top of the staged configuration
    pub fn with_property_values(mut self, pairs: &[&str]) -> Self {
        self.config = self.config.with_property_values(pairs);
        self
    }

    /// Layer a whole store on top of the staged configuration
    pub fn with_config(mut self, config: ConfigStore) -> Self {
        self.config = self.config.merge(&config);
        self
    }

    /// Supply a named bean that overrides any default of the same name
    pub fn with_bean<T, F>(self, name: impl Into<String>, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let name = name.into();
        let factory = Arc::new(factory);
        self.with_registration(Arc::new(move |registry: &mut OverrideRegistry| {
            let factory = factory.clone();
            registry.register::<T, _>(name.clone(), move || factory())
        }))
    }

    /// Supply a named bean that wins by-type lookups
    pub fn with_primary_bean<T, F>(self, name: impl Into<String>, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let name = name.into();
        let factory = Arc::new(factory);
        self.with_registration(Arc::new(move |registry: &mut OverrideRegistry| {
            let factory = factory.clone();
            registry.register_primary::<T, _>(name.clone(), move || factory())
        }))
    }

    /// Supply `T::default()` under the type's own name
    pub fn with_default_bean<T>(self) -> Self
    where
        T: Default + Send + Sync + 'static,
    {
        self.with_registration(Arc::new(|registry: &mut OverrideRegistry| {
            registry.register_default::<T>()
        }))
    }

    fn with_registration(mut self, registration: BeanRegistration) -> Self {
        self.beans.push(registration);
        self
    }

    /// The configuration contexts will be built from
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn rules(&self) -> &[ActivationRule] {
        &self.rules
    }

    /// Build a fresh context from the staged state
    pub fn build(&self) -> Result<ComponentContext, ContextError> {
        let mut overrides = OverrideRegistry::new();
        for registration in &self.beans {
            registration(&mut overrides)?;
        }

        tracing::debug!(
            "Building context from {:?} with {} rules and {} overrides",
            self.configurations,
            self.rules.len(),
            overrides.len()
        );

        ComponentContext::build(&self.rules, &self.config, overrides)
    }

    /// Build a fresh context and hand it to `assertions`
    pub fn run<F, R>(&self, assertions: F) -> Result<R, ContextError>
    where
        F: FnOnce(&ComponentContext) -> R,
    {
        let context = self.build()?;
        Ok(assertions(&context))
    }
}

impl std::fmt::Debug for ContextRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRunner")
            .field("configurations", &self.configurations)
            .field("rules", &self.rules)
            .field("config", &self.config)
            .field("beans", &self.beans.len())
            .finish()
    }
}
