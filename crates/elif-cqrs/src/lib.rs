//! # elif-cqrs
//!
//! Command and query bus auto-configuration for elif.rs applications.
//!
//! [`CqrsAutoConfiguration`] contributes a [`CommandBus`], a [`QueryBus`] and
//! the bound [`CqrsProperties`] when `elif.cqrs.enabled=true`. The
//! [`CorrelationContext`] is supplied by the application.

pub mod auto_config;
pub mod command;
pub mod correlation;
pub mod properties;
pub mod query;

pub use auto_config::{CqrsAutoConfiguration, COMMAND_BUS, CQRS_PROPERTIES, QUERY_BUS};
pub use command::{CommandBus, DefaultCommandBus};
pub use correlation::CorrelationContext;
pub use properties::{
    CommandProperties, CqrsProperties, QueryProperties, CQRS_COMMAND_PREFIX, CQRS_ENABLED,
    CQRS_PREFIX, CQRS_QUERY_PREFIX,
};
pub use query::{DefaultQueryBus, QueryBus};
