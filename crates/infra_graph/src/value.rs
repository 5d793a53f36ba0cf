//! Typed property values.
//!
//! Property bags are a closed set of value shapes so every emitter can match
//! them exhaustively. Maps keep insertion order.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{GraphError, GraphResult};

/// A single property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Number(Number),
    Bool(bool),
    List(Vec<PropertyValue>),
    Map(PropertyMap),
}

impl PropertyValue {
    /// Convert an untrusted JSON value.
    ///
    /// Returns `None` for `null`, which is treated as an absent value. Map keys
    /// are trimmed; an empty key is rejected.
    pub fn from_json(value: &Value, location: &str) -> GraphResult<Option<Self>> {
        let converted = match value {
            Value::Null => return Ok(None),
            Value::String(s) => PropertyValue::String(s.clone()),
            Value::Number(n) => PropertyValue::Number(n.clone()),
            Value::Bool(b) => PropertyValue::Bool(*b),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    if let Some(v) = Self::from_json(item, &format!("{location}[{idx}]"))? {
                        list.push(v);
                    }
                }
                PropertyValue::List(list)
            }
            Value::Object(object) => {
                PropertyValue::Map(PropertyMap::from_json_object(object, location)?)
            }
        };
        Ok(Some(converted))
    }

    /// Convert back to a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::Number(n) => Value::Number(n.clone()),
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            PropertyValue::Map(map) => map.to_json(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value renders on a single line (strings, numbers, booleans).
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            PropertyValue::String(_) | PropertyValue::Number(_) | PropertyValue::Bool(_)
        )
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Number(n.into())
    }
}

impl From<u16> for PropertyValue {
    fn from(n: u16) -> Self {
        PropertyValue::Number(n.into())
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::List(items)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(map: PropertyMap) -> Self {
        PropertyValue::Map(map)
    }
}

/// An insertion-ordered map of property values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert an untrusted JSON object, trimming keys and dropping `null` values.
    pub fn from_json_object(
        object: &serde_json::Map<String, Value>,
        location: &str,
    ) -> GraphResult<Self> {
        let mut map = PropertyMap::new();
        for (raw_key, raw_value) in object {
            let key = raw_key.trim();
            let child = format!("{location}.{key}");
            if key.is_empty() {
                return Err(GraphError::invalid(child, "property key must not be empty"));
            }
            if let Some(value) = PropertyValue::from_json(raw_value, &child)? {
                map.insert(key, value);
            }
        }
        Ok(map)
    }

    /// Insert a value. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_order_and_trims_keys() {
        let value = json!({"  zeta ": 1, "alpha": "a", "mid": [true, null, 2.5]});
        let converted = PropertyValue::from_json(&value, "properties").unwrap().unwrap();
        let PropertyValue::Map(map) = converted else {
            panic!("expected map");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            map.get("mid"),
            Some(&PropertyValue::List(vec![
                PropertyValue::Bool(true),
                PropertyValue::Number(serde_json::Number::from_f64(2.5).unwrap()),
            ]))
        );
    }

    #[test]
    fn test_null_is_absent() {
        let value = json!({"a": null, "b": "x"});
        let map = PropertyMap::from_json_object(value.as_object().unwrap(), "p").unwrap();
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key("a"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let value = json!({"   ": 1});
        let err = PropertyMap::from_json_object(value.as_object().unwrap(), "resources[0].properties")
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidField { .. }));
    }

    #[test]
    fn test_insert_keeps_first_position() {
        let mut map = PropertyMap::new().with("a", 1i64).with("b", 2i64);
        map.insert("a", "replaced");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a").and_then(PropertyValue::as_str), Some("replaced"));
    }

    #[test]
    fn test_serialize_keeps_order() {
        let map = PropertyMap::new().with("z", true).with("a", "x");
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z":true,"a":"x"}"#);
    }
}
