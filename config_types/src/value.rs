//! The value tree node.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::{ConfigList, ConfigObject, Origin, ValueType};

/// Payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Number(serde_json::Number),
    String(String),
    List(ConfigList),
    Object(ConfigObject),
}

/// An immutable configuration node with its origin.
///
/// Equality compares payloads only; two nodes parsed from different files
/// compare equal when their contents match.
#[derive(Debug, Clone)]
pub struct ConfigValue {
    kind: ValueKind,
    origin: Origin,
}

impl ConfigValue {
    pub fn new(kind: ValueKind, origin: Origin) -> Self {
        Self { kind, origin }
    }

    pub fn null(origin: Origin) -> Self {
        Self::new(ValueKind::Null, origin)
    }

    pub fn boolean(value: bool, origin: Origin) -> Self {
        Self::new(ValueKind::Boolean(value), origin)
    }

    pub fn number(value: impl Into<serde_json::Number>, origin: Origin) -> Self {
        Self::new(ValueKind::Number(value.into()), origin)
    }

    pub fn string(value: impl Into<String>, origin: Origin) -> Self {
        Self::new(ValueKind::String(value.into()), origin)
    }

    pub fn list(items: impl Into<ConfigList>, origin: Origin) -> Self {
        Self::new(ValueKind::List(items.into()), origin)
    }

    pub fn object(entries: ConfigObject, origin: Origin) -> Self {
        Self::new(ValueKind::Object(entries), origin)
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn value_type(&self) -> ValueType {
        match &self.kind {
            ValueKind::Null => ValueType::Null,
            ValueKind::Boolean(_) => ValueType::Boolean,
            ValueKind::Number(_) => ValueType::Number,
            ValueKind::String(_) => ValueType::String,
            ValueKind::List(_) => ValueType::List,
            ValueKind::Object(_) => ValueType::Object,
        }
    }

    pub fn as_object(&self) -> Option<&ConfigObject> {
        match &self.kind {
            ValueKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ConfigList> {
        match &self.kind {
            ValueKind::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match &self.kind {
            ValueKind::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Same payload, different origin
    pub fn with_origin(&self, origin: Origin) -> Self {
        Self::new(self.kind.clone(), origin)
    }

    /// Merge `fallback` underneath this node.
    ///
    /// Only object/object pairs merge; any other combination keeps `self`.
    pub fn with_fallback(&self, fallback: &ConfigValue) -> Self {
        match (&self.kind, &fallback.kind) {
            (ValueKind::Object(mine), ValueKind::Object(theirs)) => {
                Self::object(mine.with_fallback(theirs), self.origin.clone())
            }
            _ => self.clone(),
        }
    }

    /// Wrap this node as the only entry of a new object
    pub fn at_key(&self, key: impl Into<String>, origin: Origin) -> Self {
        let entries = ConfigObject::new().with_value(key, self.clone());
        Self::object(entries, origin)
    }

    /// Build a node tree from a JSON value.
    ///
    /// Children receive origins derived from `origin` by appending the key or
    /// list index.
    pub fn from_json(value: &serde_json::Value, origin: Origin) -> Self {
        match value {
            serde_json::Value::Null => Self::null(origin),
            serde_json::Value::Bool(b) => Self::boolean(*b, origin),
            serde_json::Value::Number(n) => Self::number(n.clone(), origin),
            serde_json::Value::String(s) => Self::string(s.clone(), origin),
            serde_json::Value::Array(items) => {
                let list: ConfigList = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Self::from_json(item, origin.child(&i.to_string())))
                    .collect();
                Self::list(list, origin)
            }
            serde_json::Value::Object(map) => {
                let obj: ConfigObject = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v, origin.child(k))))
                    .collect();
                Self::object(obj, origin)
            }
        }
    }

    /// Plain JSON rendering of the payload (origins dropped)
    pub fn to_json(&self) -> serde_json::Value {
        match &self.kind {
            ValueKind::Null => serde_json::Value::Null,
            ValueKind::Boolean(b) => serde_json::Value::Bool(*b),
            ValueKind::Number(n) => serde_json::Value::Number(n.clone()),
            ValueKind::String(s) => serde_json::Value::String(s.clone()),
            ValueKind::List(list) => {
                serde_json::Value::Array(list.iter().map(ConfigValue::to_json).collect())
            }
            ValueKind::Object(obj) => serde_json::Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.kind {
            ValueKind::Null => serializer.serialize_unit(),
            ValueKind::Boolean(b) => serializer.serialize_bool(*b),
            ValueKind::Number(n) => n.serialize(serializer),
            ValueKind::String(s) => serializer.serialize_str(s),
            ValueKind::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ValueKind::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(std::fmt::Error),
        }
    }
}
