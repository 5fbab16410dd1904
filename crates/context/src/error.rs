use thiserror::Error;

/// Error type for component activation and lookup
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("An override named '{name}' is already registered")]
    DuplicateOverride { name: String },

    #[error("Component '{name}' is produced by more than one active rule")]
    DuplicateComponent { name: String },

    #[error("Expected a single component of type '{type_name}' but found {}: {}", .candidates.len(), .candidates.join(", "))]
    AmbiguousBean {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("No such component: {message}")]
    NoSuchBean { message: String },

    #[error("Failed to create component '{name}': {message}")]
    ComponentCreation { name: String, message: String },

    #[error("Failed to bind properties under '{prefix}': {message}")]
    PropertyBinding { prefix: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ContextError {
    /// Create a duplicate override error
    pub fn duplicate_override(name: impl Into<String>) -> Self {
        Self::DuplicateOverride { name: name.into() }
    }

    /// Create a duplicate component error
    pub fn duplicate_component(name: impl Into<String>) -> Self {
        Self::DuplicateComponent { name: name.into() }
    }

    /// Create an ambiguous lookup error
    pub fn ambiguous(type_name: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::AmbiguousBean {
            type_name: type_name.into(),
            candidates,
        }
    }

    /// No component of the requested type exists
    pub fn no_bean_of_type(type_name: impl Into<String>) -> Self {
        Self::NoSuchBean {
            message: format!("no component of type '{}' is available", type_name.into()),
        }
    }

    /// No component with the requested name exists for the requested type
    pub fn no_bean_named(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::NoSuchBean {
            message: format!(
                "no component named '{}' of type '{}' is available",
                name.into(),
                type_name.into()
            ),
        }
    }

    /// Create a component creation error
    pub fn component_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ComponentCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a property binding error
    pub fn property_binding(prefix: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PropertyBinding {
            prefix: prefix.into(),
            message: message.into(),
        }
    }

    pub fn is_duplicate_override(&self) -> bool {
        matches!(self, Self::DuplicateOverride { .. })
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousBean { .. })
    }

    pub fn is_no_such_bean(&self) -> bool {
        matches!(self, Self::NoSuchBean { .. })
    }

    pub fn is_property_binding(&self) -> bool {
        matches!(self, Self::PropertyBinding { .. })
    }
}
