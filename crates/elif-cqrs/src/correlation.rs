use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Correlation identifier carried by commands and queries of one unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationContext {
    correlation_id: Uuid,
    created_at: DateTime<Utc>,
}

impl CorrelationContext {
    /// Start a new correlation
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Continue an existing correlation, e.g. one received from a caller
    pub fn with_id(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            created_at: Utc::now(),
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Default for CorrelationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.correlation_id)
    }
}
