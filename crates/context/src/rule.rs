//! Declarative activation rules
//!
//! A rule pairs a component name and declared type with a pure [`Condition`]
//! over the [`ConfigStore`] and a factory that produces the default instance.

use crate::component::{erase, ComponentType, ErasedInstance};
use crate::config::ConfigStore;
use crate::error::ContextError;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// Factory for default components
pub(crate) type RuleFactory =
    Arc<dyn Fn(&ConfigStore) -> Result<ErasedInstance, ContextError> + Send + Sync>;

/// Predicate over configuration gating a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Always active
    Always,
    /// Active depending on a single property
    OnProperty {
        key: String,
        /// Expected value. Empty means "anything but `false`".
        having_value: String,
        /// Outcome when the property is absent
        match_if_missing: bool,
    },
    /// Active when every nested condition holds
    All(Vec<Condition>),
    /// Active when at least one nested condition holds
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Active when `key` is `true`; absent keys count as `false`
    pub fn on_property(key: impl Into<String>) -> Self {
        Condition::OnProperty {
            key: key.into(),
            having_value: "true".to_string(),
            match_if_missing: false,
        }
    }

    /// Replace the expected value of an `OnProperty` condition
    pub fn having_value(self, expected: impl Into<String>) -> Self {
        match self {
            Condition::OnProperty {
                key,
                match_if_missing,
                ..
            } => Condition::OnProperty {
                key,
                having_value: expected.into(),
                match_if_missing,
            },
            other => other,
        }
    }

    /// Set the outcome of an `OnProperty` condition when the key is absent
    pub fn match_if_missing(self, matches: bool) -> Self {
        match self {
            Condition::OnProperty {
                key, having_value, ..
            } => Condition::OnProperty {
                key,
                having_value,
                match_if_missing: matches,
            },
            other => other,
        }
    }

    /// Evaluate against a configuration. Never fails: absent or unexpected
    /// values fall back to the documented defaults.
    pub fn evaluate(&self, config: &ConfigStore) -> bool {
        match self {
            Condition::Always => true,
            Condition::OnProperty {
                key,
                having_value,
                match_if_missing,
            } => match config.get(key) {
                None => *match_if_missing,
                Some(value) if having_value.trim().is_empty() => !value.matches("false"),
                Some(value) => value.matches(having_value),
            },
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(config)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.evaluate(config)),
            Condition::Not(condition) => !condition.evaluate(config),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => write!(f, "always"),
            Condition::OnProperty {
                key, having_value, ..
            } if having_value.trim().is_empty() => write!(f, "{} != false", key),
            Condition::OnProperty {
                key, having_value, ..
            } => write!(f, "{} == {}", key, having_value),
            Condition::All(conditions) => write_joined(f, conditions, " && "),
            Condition::Any(conditions) => write_joined(f, conditions, " || "),
            Condition::Not(condition) => write!(f, "!({})", condition),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    conditions: &[Condition],
    separator: &str,
) -> fmt::Result {
    write!(f, "(")?;
    for (index, condition) in conditions.iter().enumerate() {
        if index > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", condition)?;
    }
    write!(f, ")")
}

/// Conditional registration of a default component
#[derive(Clone)]
pub struct ActivationRule {
    name: String,
    component_type: ComponentType,
    condition: Condition,
    factory: RuleFactory,
}

impl ActivationRule {
    /// Rule with a zero-argument supplier
    pub fn new<T, F>(name: impl Into<String>, condition: Condition, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            component_type: ComponentType::of::<T>(),
            condition,
            factory: Arc::new(move |_: &ConfigStore| -> Result<ErasedInstance, ContextError> {
                Ok(erase(factory()))
            }),
        }
    }

    /// Rule whose factory reads the resolved configuration and may fail
    pub fn with_config<T, F>(name: impl Into<String>, condition: Condition, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ConfigStore) -> Result<Arc<T>, ContextError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            component_type: ComponentType::of::<T>(),
            condition,
            factory: Arc::new(move |config: &ConfigStore| -> Result<ErasedInstance, ContextError> {
                factory(config).map(erase)
            }),
        }
    }

    /// Rule that binds the properties under `prefix` into a `T` bean
    pub fn properties<T>(
        name: impl Into<String>,
        condition: Condition,
        prefix: impl Into<String>,
    ) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let prefix = prefix.into();
        Self::with_config::<T, _>(name, condition, move |config| {
            config.bind::<T>(&prefix).map(Arc::new)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Whether this rule's component should exist under `config`
    pub fn evaluate(&self, config: &ConfigStore) -> bool {
        self.condition.evaluate(config)
    }

    pub(crate) fn instantiate(&self, config: &ConfigStore) -> Result<ErasedInstance, ContextError> {
        (self.factory)(config)
    }
}

impl fmt::Debug for ActivationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationRule")
            .field("name", &self.name)
            .field("component_type", &self.component_type.type_name())
            .field("condition", &self.condition)
            .finish()
    }
}

/// A named group of activation rules contributed by an extension
pub trait AutoConfiguration: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &'static str;

    /// Rules this configuration contributes
    fn rules(&self) -> Vec<ActivationRule>;
}
