//! Ordered attribute container shared by every descriptor type.

use serde_json::{Map, Value};

/// Wire key holding a port's numeric value.
pub const PORT_VALUE_KEY: &str = "$";
/// Wire key holding a port's enabled flag.
pub const PORT_ENABLED_KEY: &str = "@enabled";

/// A port number paired with its enabled flag.
///
/// Exported as `{"$": <port>, "@enabled": "true"|"false"}`, the shape Eureka
/// derives from its XML attribute encoding. The flag is a string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortValue {
    pub value: u16,
    pub enabled: bool,
}

impl PortValue {
    #[must_use]
    pub fn new(value: u16, enabled: bool) -> Self {
        Self { value, enabled }
    }

    #[must_use]
    pub fn to_json(self) -> Value {
        let mut record = Map::new();
        record.insert(PORT_VALUE_KEY.to_owned(), Value::from(self.value));
        record.insert(
            PORT_ENABLED_KEY.to_owned(),
            Value::String(if self.enabled { "true" } else { "false" }.to_owned()),
        );
        Value::Object(record)
    }
}

/// Value stored under one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Port(PortValue),
    /// Already-exported nested object (metadata, datacenter info).
    Nested(Map<String, Value>),
}

impl ParamValue {
    /// Borrow the value as a string if it is [`ParamValue::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_port(&self) -> Option<PortValue> {
        match self {
            ParamValue::Port(p) => Some(*p),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(s) => Value::String(s.clone()),
            ParamValue::Integer(n) => Value::from(*n),
            ParamValue::Port(p) => p.to_json(),
            ParamValue::Nested(map) => Value::Object(map.clone()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<PortValue> for ParamValue {
    fn from(value: PortValue) -> Self {
        ParamValue::Port(value)
    }
}

impl From<Map<String, Value>> for ParamValue {
    fn from(value: Map<String, Value>) -> Self {
        ParamValue::Nested(value)
    }
}

/// Ordered key/value container.
///
/// Keys keep the position of their first write; a later write to the same key
/// replaces the value in place. Attribute sets are a dozen entries at most, so
/// lookups are linear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, ParamValue)>,
}

impl Parameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *slot = value;
        } else {
            self.entries.push((key, value));
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten into a JSON object, preserving insertion order.
    #[must_use]
    pub fn export(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}
