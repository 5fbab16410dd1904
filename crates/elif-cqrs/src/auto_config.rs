//! CQRS auto-configuration
//!
//! Activates a command bus, a query bus and the bound [`CqrsProperties`]
//! when `elif.cqrs.enabled` is `true`. Applications replace either bus by
//! supplying a component with the same name.
//!
//! Each bus binds its own group (`elif.cqrs.command`, `elif.cqrs.query`)
//! straight from the configuration. Overriding the `cqrsProperties`
//! component does not reconfigure the buses.

use crate::command::{CommandBus, DefaultCommandBus};
use crate::properties::{
    CommandProperties, CqrsProperties, QueryProperties, CQRS_COMMAND_PREFIX, CQRS_ENABLED,
    CQRS_PREFIX, CQRS_QUERY_PREFIX,
};
use crate::query::{DefaultQueryBus, QueryBus};
use elif_context::{ActivationRule, AutoConfiguration, Condition, ConfigStore, ContextError};
use std::sync::Arc;

pub const COMMAND_BUS: &str = "commandBus";
pub const QUERY_BUS: &str = "queryBus";
pub const CQRS_PROPERTIES: &str = "cqrsProperties";

/// Default components of the CQRS extension
#[derive(Debug, Clone, Copy, Default)]
pub struct CqrsAutoConfiguration;

impl CqrsAutoConfiguration {
    fn enabled() -> Condition {
        Condition::on_property(CQRS_ENABLED)
    }
}

impl AutoConfiguration for CqrsAutoConfiguration {
    fn name(&self) -> &'static str {
        "CqrsAutoConfiguration"
    }

    fn rules(&self) -> Vec<ActivationRule> {
        vec![
            ActivationRule::properties::<CqrsProperties>(
                CQRS_PROPERTIES,
                Self::enabled(),
                CQRS_PREFIX,
            ),
            ActivationRule::with_config::<dyn CommandBus, _>(
                COMMAND_BUS,
                Self::enabled(),
                command_bus,
            ),
            ActivationRule::with_config::<dyn QueryBus, _>(QUERY_BUS, Self::enabled(), query_bus),
        ]
    }
}

fn command_bus(config: &ConfigStore) -> Result<Arc<dyn CommandBus>, ContextError> {
    let properties: CommandProperties = config.bind(CQRS_COMMAND_PREFIX)?;
    tracing::info!(
        "Configuring command bus (timeout: {}s, metrics: {}, tracing: {})",
        properties.timeout_secs,
        properties.metrics_enabled,
        properties.tracing_enabled
    );
    Ok(Arc::new(DefaultCommandBus::new(properties)))
}

fn query_bus(config: &ConfigStore) -> Result<Arc<dyn QueryBus>, ContextError> {
    let properties: QueryProperties = config.bind(CQRS_QUERY_PREFIX)?;
    tracing::info!(
        "Configuring query bus (timeout: {}s, caching: {})",
        properties.timeout_secs,
        properties.caching_enabled
    );
    Ok(Arc::new(DefaultQueryBus::new(properties)))
}
