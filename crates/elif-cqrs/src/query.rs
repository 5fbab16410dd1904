use crate::properties::QueryProperties;
use std::time::Duration;

/// Entry point for queries
pub trait QueryBus: Send + Sync {
    /// Upper bound for answering a single query
    fn timeout(&self) -> Duration;

    /// How long query results may be cached, if caching is on
    fn cache_ttl(&self) -> Option<Duration>;
}

/// Query bus activated by the CQRS auto-configuration
#[derive(Debug, Clone, Default)]
pub struct DefaultQueryBus {
    properties: QueryProperties,
}

impl DefaultQueryBus {
    pub fn new(properties: QueryProperties) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &QueryProperties {
        &self.properties
    }
}

impl QueryBus for DefaultQueryBus {
    fn timeout(&self) -> Duration {
        self.properties.timeout()
    }

    fn cache_ttl(&self) -> Option<Duration> {
        self.properties
            .caching_enabled
            .then(|| self.properties.cache_ttl())
    }
}
