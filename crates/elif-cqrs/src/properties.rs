use serde::Deserialize;
use std::time::Duration;

/// Property prefix the CQRS extension binds from
pub const CQRS_PREFIX: &str = "elif.cqrs";

/// Flag that switches the CQRS auto-configuration on
pub const CQRS_ENABLED: &str = "elif.cqrs.enabled";

pub const CQRS_COMMAND_PREFIX: &str = "elif.cqrs.command";
pub const CQRS_QUERY_PREFIX: &str = "elif.cqrs.query";

/// Settings bound from `elif.cqrs.*`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CqrsProperties {
    pub enabled: bool,
    pub command: CommandProperties,
    pub query: QueryProperties,
}

/// Settings bound from `elif.cqrs.command.*`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommandProperties {
    pub timeout_secs: u64,
    pub metrics_enabled: bool,
    pub tracing_enabled: bool,
}

impl CommandProperties {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CommandProperties {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            metrics_enabled: true,
            tracing_enabled: true,
        }
    }
}

/// Settings bound from `elif.cqrs.query.*`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryProperties {
    pub timeout_secs: u64,
    pub caching_enabled: bool,
    pub cache_ttl_secs: u64,
}

impl QueryProperties {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for QueryProperties {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            caching_enabled: true,
            cache_ttl_secs: 900,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elif_context::ConfigStore;

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let properties: CqrsProperties = ConfigStore::new().bind(CQRS_PREFIX).unwrap();
        assert_eq!(properties, CqrsProperties::default());
        assert_eq!(properties.command.timeout(), Duration::from_secs(30));
        assert_eq!(properties.query.cache_ttl(), Duration::from_secs(900));
    }

    #[test]
    fn test_relaxed_binding_of_nested_groups() {
        let config = ConfigStore::new().with_property_values(&[
            "elif.cqrs.enabled=true",
            "elif.cqrs.command.timeout-secs=5",
            "elif.cqrs.query.cachingEnabled=false",
        ]);

        let properties: CqrsProperties = config.bind(CQRS_PREFIX).unwrap();
        assert!(properties.enabled);
        assert_eq!(properties.command.timeout_secs, 5);
        assert!(properties.command.metrics_enabled);
        assert!(!properties.query.caching_enabled);
        assert_eq!(properties.query.timeout_secs, 15);
    }
}
