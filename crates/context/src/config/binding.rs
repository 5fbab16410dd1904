//! Typed binding of dotted properties.
//!
//! Every key under a prefix is folded into a nested JSON object and handed to
//! serde. Segment names are relaxed, so `cache-ttl-secs` and `cacheTtlSecs`
//! both bind to a `cache_ttl_secs` field. Values stay text until the target
//! field asks for a boolean, a number or a sequence, so a `String` field keeps
//! `"true"` or `"2024"` as written.

use crate::config::{ConfigStore, PropertyValue};
use crate::error::ContextError;
use serde::de::value::StringDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, IntoDeserializer, MapAccess, SeqAccess,
    Visitor,
};
use serde_json::{Map, Value};

pub(crate) fn bind<T: DeserializeOwned>(
    store: &ConfigStore,
    prefix: &str,
) -> Result<T, ContextError> {
    let prefix = prefix.trim_matches('.');
    let mut root = Map::new();

    for (path, value) in store.entries_under(prefix) {
        let segments: Vec<String> = path
            .split('.')
            .filter(|segment| !segment.trim().is_empty())
            .map(normalize_segment)
            .collect();
        if segments.is_empty() {
            continue;
        }

        insert_path(&mut root, &segments, leaf(value))
            .map_err(|message| ContextError::property_binding(prefix, message))?;
    }

    tracing::debug!("Binding {} property groups under '{}'", root.len(), prefix);

    T::deserialize(PropertyDeserializer(Value::Object(root)))
        .map_err(|e| ContextError::property_binding(prefix, e.to_string()))
}

/// `cache-ttl-secs` / `cacheTtlSecs` -> `cache_ttl_secs`
fn normalize_segment(segment: &str) -> String {
    let mut normalized = String::with_capacity(segment.len());
    for (index, ch) in segment.trim().chars().enumerate() {
        match ch {
            '-' => normalized.push('_'),
            ch if ch.is_ascii_uppercase() => {
                if index > 0 && !normalized.ends_with('_') {
                    normalized.push('_');
                }
                normalized.push(ch.to_ascii_lowercase());
            }
            ch => normalized.push(ch),
        }
    }
    normalized
}

fn leaf(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Bool(flag) => Value::Bool(*flag),
        PropertyValue::Text(text) => Value::String(text.clone()),
    }
}

fn insert_path(
    map: &mut Map<String, Value>,
    segments: &[String],
    value: Value,
) -> Result<(), String> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(());
    };

    if rest.is_empty() {
        if matches!(map.get(first), Some(Value::Object(_))) {
            return Err(format!("'{}' is bound both as a value and as a group", first));
        }
        map.insert(first.clone(), value);
        return Ok(());
    }

    let child = map
        .entry(first.clone())
        .or_insert_with(|| Value::Object(Map::new()));

    match child {
        Value::Object(child) => insert_path(child, rest, value),
        _ => Err(format!("'{}' is bound both as a value and as a group", first)),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Deserializer over the folded property tree.
///
/// Text leaves are parsed lazily: only when the visitor asks for a bool, a
/// number or a sequence. Anything unparseable falls through to
/// `serde_json`, which reports the type mismatch.
struct PropertyDeserializer(Value);

macro_rules! deserialize_number {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            if let Value::String(text) = &self.0 {
                let text = text.trim();
                if let Ok(number) = text.parse::<u64>() {
                    return visitor.visit_u64(number);
                }
                if let Ok(number) = text.parse::<i64>() {
                    return visitor.visit_i64(number);
                }
                if let Ok(number) = text.parse::<f64>() {
                    return visitor.visit_f64(number);
                }
            }
            self.0.$method(visitor)
        }
    )*};
}

impl<'de> Deserializer<'de> for PropertyDeserializer {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visitor.visit_map(PropertyMap {
                entries: map.into_iter(),
                value: None,
            }),
            Value::Array(items) => visitor.visit_seq(PropertySeq(items.into_iter())),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if let Value::String(text) = &self.0 {
            if let Some(flag) = parse_bool(text) {
                return visitor.visit_bool(flag);
            }
        }
        self.0.deserialize_bool(visitor)
    }

    deserialize_number! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Bool(flag) => visitor.visit_string(flag.to_string()),
            other => other.deserialize_string(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(PropertyDeserializer(other)),
        }
    }

    /// Comma-separated text binds to a sequence, matching how YAML lists are
    /// flattened into the store
    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::String(text) => {
                let items: Vec<Value> = text
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect();
                visitor.visit_seq(PropertySeq(items.into_iter()))
            }
            other => PropertyDeserializer(other).deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    serde::forward_to_deserialize_any! {
        i128 u128 char bytes byte_buf unit unit_struct tuple tuple_struct
        map struct identifier ignored_any
    }
}

struct PropertyMap {
    entries: serde_json::map::IntoIter,
    value: Option<Value>,
}

impl<'de> MapAccess<'de> for PropertyMap {
    type Error = serde_json::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.entries.next() {
            Some((key, value)) => {
                self.value = Some(value);
                let key: StringDeserializer<serde_json::Error> = key.into_deserializer();
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(PropertyDeserializer(value)),
            None => Err(de::Error::custom("value requested before key")),
        }
    }
}

struct PropertySeq(std::vec::IntoIter<Value>);

impl<'de> SeqAccess<'de> for PropertySeq {
    type Error = serde_json::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        self.0
            .next()
            .map(|value| seed.deserialize(PropertyDeserializer(value)))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Limits {
        enabled: bool,
        max_items: u64,
        label: String,
        nested: Nested,
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Nested {
        ratio: f64,
    }

    #[test]
    fn test_relaxed_names_and_coercion() {
        let store = ConfigStore::new().with_property_values(&[
            "app.limits.enabled=TRUE",
            "app.limits.max-items=25",
            "app.limits.label=orders",
            "app.limits.nested.ratio=0.5",
            "app.other.ignored=1",
        ]);

        let limits: Limits = store.bind("app.limits").unwrap();
        assert_eq!(
            limits,
            Limits {
                enabled: true,
                max_items: 25,
                label: "orders".to_string(),
                nested: Nested { ratio: 0.5 },
            }
        );
    }

    #[test]
    fn test_missing_prefix_binds_defaults() {
        let limits: Limits = ConfigStore::new().bind("app.limits").unwrap();
        assert_eq!(limits, Limits::default());
    }

    #[test]
    fn test_value_group_conflict_is_rejected() {
        let store = ConfigStore::new().with_property_values(&[
            "app.limits.nested=flat",
            "app.limits.nested.ratio=0.5",
        ]);

        let error = store.bind::<Limits>("app.limits").unwrap_err();
        assert!(error.is_property_binding());
    }

    #[test]
    fn test_type_mismatch_is_a_binding_error() {
        let store = ConfigStore::new().with_property_values(&["app.limits.max-items=many"]);

        let error = store.bind::<Limits>("app.limits").unwrap_err();
        assert!(error.is_property_binding());
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Release {
        label: String,
        version: String,
        build: Option<u32>,
        channels: Vec<String>,
    }

    #[test]
    fn test_text_fields_keep_boolean_and_numeric_text() {
        let store = ConfigStore::new().with_property_values(&[
            "app.label=true",
            "app.version=2024",
            "app.build=7",
        ]);

        let release: Release = store.bind("app").unwrap();
        assert_eq!(release.label, "true");
        assert_eq!(release.version, "2024");
        assert_eq!(release.build, Some(7));
    }

    #[test]
    fn test_quoted_yaml_text_binds_to_string() {
        let store = ConfigStore::from_yaml_str(
            "app:\n  version: \"2024\"\n  label: yes\n  channels: [stable, beta]\n",
        )
        .unwrap();

        let release: Release = store.bind("app").unwrap();
        assert_eq!(release.version, "2024");
        assert_eq!(release.label, "yes");
        assert_eq!(release.channels, vec!["stable", "beta"]);
        assert_eq!(release.build, None);
    }

    #[test]
    fn test_boolean_value_binds_to_string_field() {
        let store = ConfigStore::new().with_values([("app.label", true)]);

        let release: Release = store.bind("app").unwrap();
        assert_eq!(release.label, "true");
    }

    #[test]
    fn test_camel_case_segments() {
        assert_eq!(normalize_segment("maxItems"), "max_items");
        assert_eq!(normalize_segment("max-items"), "max_items");
        assert_eq!(normalize_segment("enabled"), "enabled");
    }
}
