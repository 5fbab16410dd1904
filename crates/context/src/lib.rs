//! # elif-context
//!
//! Conditional component activation for elif.rs auto-configuration.
//!
//! Extensions describe their default components as [`ActivationRule`]s gated
//! by [`Condition`]s over a flat, dotted-key [`ConfigStore`]. Applications
//! supply their own components through an [`OverrideRegistry`]. Resolving both
//! yields an immutable [`ComponentContext`] that is queried by name or by
//! declared type.

pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod overrides;
pub mod rule;
pub mod runner;

pub use component::{ComponentType, ErasedInstance};
pub use config::{ConfigStore, PropertySource, PropertyValue};
pub use context::ComponentContext;
pub use error::ContextError;
pub use overrides::{OverrideEntry, OverrideRegistry};
pub use rule::{ActivationRule, AutoConfiguration, Condition};
pub use runner::ContextRunner;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
