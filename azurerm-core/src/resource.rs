//! Resource - Representing resources and their state

use std::collections::HashMap;

/// Attribute map of a resource or of one nested block item
pub type Attributes = HashMap<String, Value>;

/// Host-side address of a resource (e.g., `azurerm_media_transform.example`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceAddress {
    /// Resource type (e.g., "azurerm_media_transform")
    pub resource_type: String,
    /// Resource name (identifier given in the configuration)
    pub name: String,
}

impl ResourceAddress {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
///
/// Nested configuration blocks are a `List` of `Map`s, one map per block.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// A single nested block
    pub fn block(attributes: Attributes) -> Self {
        Value::List(vec![Value::Map(attributes)])
    }

    /// A list of nested blocks
    pub fn blocks(items: Vec<Attributes>) -> Self {
        Value::List(items.into_iter().map(Value::Map).collect())
    }

    /// A list of strings
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// A map of strings
    pub fn string_map<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Value::Map(
            items
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers are accepted where floats are expected
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a JSON value from a configuration document
    ///
    /// `null` has no counterpart and yields `None`; nulls inside lists and
    /// objects are dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(arr) => {
                Some(Value::List(arr.iter().filter_map(Value::from_json).collect()))
            }
            serde_json::Value::Object(obj) => Some(Value::Map(
                obj.iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    /// Convert to JSON for display
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Desired state declared in configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub address: ResourceAddress,
    pub attributes: Attributes,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: ResourceAddress::new(resource_type, name),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }
}

/// Current state fetched from Azure
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub address: ResourceAddress,
    /// ARM resource ID (e.g., /subscriptions/.../providers/Microsoft.Media/mediaServices/acct)
    pub identifier: Option<String>,
    pub attributes: Attributes,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(address: ResourceAddress) -> Self {
        Self {
            address,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(address: ResourceAddress, attributes: Attributes) -> Self {
        Self {
            address,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_maps_numbers_to_int_or_float() {
        assert_eq!(Value::from_json(&json!(30)), Some(Value::Int(30)));
        assert_eq!(Value::from_json(&json!(1.5)), Some(Value::Float(1.5)));
        assert_eq!(Value::from_json(&json!(null)), None);
    }

    #[test]
    fn from_json_drops_nulls_in_objects() {
        let value = Value::from_json(&json!({"ttl": 30, "path": null})).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("ttl"), Some(&Value::Int(30)));
    }

    #[test]
    fn block_wraps_single_map_in_list() {
        let mut attrs = HashMap::new();
        attrs.insert("ttl".to_string(), Value::Int(30));
        let block = Value::block(attrs.clone());
        assert_eq!(block, Value::List(vec![Value::Map(attrs)]));
    }

    #[test]
    fn int_reads_as_float() {
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
        assert_eq!(Value::String("2".into()).as_float(), None);
    }

    #[test]
    fn address_display() {
        let address = ResourceAddress::new("azurerm_media_transform", "example");
        assert_eq!(address.to_string(), "azurerm_media_transform.example");
    }
}
