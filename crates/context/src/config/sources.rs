/// Where a configuration property came from, kept for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySource {
    /// Value supplied inline, e.g. `elif.cqrs.enabled=true`
    Inline,
    /// Value loaded from an environment variable
    EnvVar(String),
    /// Value loaded from a configuration file
    File(String),
    /// Value parsed from an in-memory YAML document
    Yaml,
}

impl PropertySource {
    /// Check if source is an environment variable
    pub fn is_env_var(&self) -> bool {
        matches!(self, PropertySource::EnvVar(_))
    }

    /// Check if source is a file
    pub fn is_file(&self) -> bool {
        matches!(self, PropertySource::File(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            PropertySource::Inline => "Inline property value".to_string(),
            PropertySource::EnvVar(var) => format!("Environment variable: {}", var),
            PropertySource::File(path) => format!("Configuration file: {}", path),
            PropertySource::Yaml => "YAML document".to_string(),
        }
    }
}

impl std::fmt::Display for PropertySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
