use crate::properties::CommandProperties;
use std::time::Duration;

/// Entry point for commands. Dispatch is provided by the handler layer; the
/// bus carries the settings it was configured with.
pub trait CommandBus: Send + Sync {
    /// Upper bound for handling a single command
    fn timeout(&self) -> Duration;

    fn metrics_enabled(&self) -> bool;

    fn tracing_enabled(&self) -> bool;
}

/// Command bus activated by the CQRS auto-configuration
#[derive(Debug, Clone, Default)]
pub struct DefaultCommandBus {
    properties: CommandProperties,
}

impl DefaultCommandBus {
    pub fn new(properties: CommandProperties) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &CommandProperties {
        &self.properties
    }
}

impl CommandBus for DefaultCommandBus {
    fn timeout(&self) -> Duration {
        self.properties.timeout()
    }

    fn metrics_enabled(&self) -> bool {
        self.properties.metrics_enabled
    }

    fn tracing_enabled(&self) -> bool {
        self.properties.tracing_enabled
    }
}
