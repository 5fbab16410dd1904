use crate::config::binding;
use crate::config::PropertySource;
use crate::error::ContextError;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    /// Boolean view of the value. Text coerces from `true`/`false`
    /// (case-insensitive); anything else is not a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            PropertyValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }

    /// Compare against an expected textual value, ignoring ASCII case and
    /// surrounding whitespace
    pub fn matches(&self, expected: &str) -> bool {
        self.to_string().trim().eq_ignore_ascii_case(expected.trim())
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(value) => write!(f, "{}", value),
            PropertyValue::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Property {
    value: PropertyValue,
    source: PropertySource,
}

/// Resolved flat key-value configuration keyed by dotted names such as
/// `elif.cqrs.enabled`.
///
/// A store never changes once built; every `with_*` method returns a new
/// store with the extra values layered on top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    properties: BTreeMap<String, Property>,
}

impl ConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for a key
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key.trim()).map(|property| &property.value)
    }

    /// Get the value for a key rendered as text
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| value.to_string())
    }

    /// Get a boolean flag. Absent or unparseable values resolve to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key.trim())
    }

    /// Where the value for `key` was loaded from
    pub fn source(&self, key: &str) -> Option<&PropertySource> {
        self.properties.get(key.trim()).map(|property| &property.source)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Entries whose key lies under `prefix.`, with the prefix stripped
    pub(crate) fn entries_under<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a PropertyValue)> + 'a {
        self.properties.iter().filter_map(move |(key, property)| {
            let rest = if prefix.is_empty() {
                Some(key.as_str())
            } else {
                key.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('.'))
            };
            rest.map(|rest| (rest, &property.value))
        })
    }

    /// Layer `values` on top of this store. Later keys override earlier ones.
    pub fn with_values<I, K, V>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        let mut store = self.clone();
        for (key, value) in values {
            store.insert(key.into(), value.into(), PropertySource::Inline);
        }
        store
    }

    /// Layer `key=value` (or `key:value`) pairs on top of this store
    pub fn with_property_values(&self, pairs: &[&str]) -> Self {
        self.with_values(pairs.iter().map(|pair| split_pair(pair)))
    }

    /// Layer every property of `other` on top of this store
    pub fn merge(&self, other: &ConfigStore) -> Self {
        let mut store = self.clone();
        for (key, property) in &other.properties {
            store.properties.insert(key.clone(), property.clone());
        }
        store
    }

    /// Load properties from the process environment.
    ///
    /// `prefix` is a dotted property prefix such as `elif.cqrs`. The variable
    /// `ELIF_CQRS_ENABLED` maps to `elif.cqrs.enabled`. Past the prefix a
    /// double underscore separates nested segments, so
    /// `ELIF_CQRS_COMMAND__TIMEOUT_SECS` maps to `elif.cqrs.command.timeout_secs`.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_env_vars(prefix, std::env::vars())
    }

    /// Same as [`ConfigStore::from_env`] over an explicit set of variables
    pub fn from_env_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env_prefix = format!(
            "{}_",
            prefix.trim_matches('.').to_ascii_uppercase().replace('.', "_")
        );
        let mut store = Self::new();

        for (name, value) in vars {
            let Some(rest) = name.strip_prefix(&env_prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }

            let key = format!(
                "{}.{}",
                prefix.trim_matches('.'),
                rest.to_ascii_lowercase().replace("__", ".")
            );
            store.insert(key, PropertyValue::Text(value), PropertySource::EnvVar(name));
        }

        tracing::debug!("Loaded {} properties from environment", store.len());
        store
    }

    /// Parse a YAML document, flattening nested mappings into dotted keys
    pub fn from_yaml_str(content: &str) -> Result<Self, ContextError> {
        let document: serde_yaml::Value = serde_yaml::from_str(content)?;
        let mut store = Self::new();
        store.flatten_yaml(String::new(), &document, &PropertySource::Yaml);
        Ok(store)
    }

    /// Load and flatten a YAML configuration file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ContextError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let document: serde_yaml::Value = serde_yaml::from_str(&content)?;

        let mut store = Self::new();
        let source = PropertySource::File(path.display().to_string());
        store.flatten_yaml(String::new(), &document, &source);

        tracing::debug!("Loaded {} properties from {}", store.len(), path.display());
        Ok(store)
    }

    /// Bind every property under `prefix` into a typed value
    pub fn bind<T: DeserializeOwned>(&self, prefix: &str) -> Result<T, ContextError> {
        binding::bind(self, prefix)
    }

    fn insert(&mut self, key: String, value: PropertyValue, source: PropertySource) {
        let key = key.trim().to_string();
        if key.is_empty() {
            return;
        }
        self.properties.insert(key, Property { value, source });
    }

    fn flatten_yaml(&mut self, key: String, value: &serde_yaml::Value, source: &PropertySource) {
        use serde_yaml::Value;

        match value {
            Value::Mapping(mapping) => {
                for (child_key, child) in mapping {
                    let Some(segment) = yaml_scalar(child_key) else {
                        continue;
                    };
                    let child_path = if key.is_empty() {
                        segment
                    } else {
                        format!("{}.{}", key, segment)
                    };
                    self.flatten_yaml(child_path, child, source);
                }
            }
            Value::Sequence(items) => {
                let scalars: Option<Vec<String>> = items.iter().map(yaml_scalar).collect();
                match scalars {
                    Some(scalars) => {
                        self.insert(key, PropertyValue::Text(scalars.join(",")), source.clone())
                    }
                    None => {
                        for (index, item) in items.iter().enumerate() {
                            self.flatten_yaml(format!("{}.{}", key, index), item, source);
                        }
                    }
                }
            }
            Value::Bool(flag) => self.insert(key, PropertyValue::Bool(*flag), source.clone()),
            Value::Tagged(tagged) => self.flatten_yaml(key, &tagged.value, source),
            other => {
                let text = yaml_scalar(other).unwrap_or_default();
                self.insert(key, PropertyValue::Text(text), source.clone());
            }
        }
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;

    match value {
        Value::Null => Some(String::new()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Tagged(tagged) => yaml_scalar(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn split_pair(pair: &str) -> (String, String) {
    match pair.find(|c: char| c == '=' || c == ':') {
        Some(index) => (
            pair[..index].trim().to_string(),
            pair[index + 1..].trim().to_string(),
        ),
        None => (pair.trim().to_string(), String::new()),
    }
}
