//! Typed accessors over attribute maps
//!
//! Expand functions read configuration through these helpers instead of
//! matching on `Value` by hand. A wrongly typed value reads as absent: schema
//! validation has already rejected it by the time expand runs.

use std::collections::HashMap;

use crate::resource::{Attributes, Value};

/// String attribute
pub fn string<'a>(attrs: &'a Attributes, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(Value::as_str)
}

/// String attribute, treating the empty string as unset
pub fn non_empty_string<'a>(attrs: &'a Attributes, key: &str) -> Option<&'a str> {
    string(attrs, key).filter(|s| !s.is_empty())
}

pub fn bool(attrs: &Attributes, key: &str) -> Option<bool> {
    attrs.get(key).and_then(Value::as_bool)
}

pub fn int(attrs: &Attributes, key: &str) -> Option<i64> {
    attrs.get(key).and_then(Value::as_int)
}

pub fn float(attrs: &Attributes, key: &str) -> Option<f64> {
    attrs.get(key).and_then(Value::as_float)
}

/// List of strings; non-string items are skipped
pub fn string_list(attrs: &Attributes, key: &str) -> Vec<String> {
    attrs
        .get(key)
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Map of strings; non-string values are skipped
pub fn string_map(attrs: &Attributes, key: &str) -> HashMap<String, String> {
    attrs
        .get(key)
        .and_then(Value::as_map)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// All items of a nested block list
pub fn blocks<'a>(attrs: &'a Attributes, key: &str) -> Vec<&'a Attributes> {
    attrs
        .get(key)
        .and_then(Value::as_list)
        .map(|items| items.iter().filter_map(Value::as_map).collect())
        .unwrap_or_default()
}

/// First item of a nested block list (blocks declared with `max_items = 1`)
pub fn block<'a>(attrs: &'a Attributes, key: &str) -> Option<&'a Attributes> {
    blocks(attrs, key).into_iter().next()
}

/// Builder used by flatten functions
///
/// `set_opt` skips `None`, so attributes the API did not return stay absent.
#[derive(Debug, Clone, Default)]
pub struct AttributesBuilder {
    inner: Attributes,
}

impl AttributesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.inner.insert(key.to_string(), value.into());
        self
    }

    pub fn set_opt<T: Into<Value>>(mut self, key: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.inner.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn build(self) -> Attributes {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Attributes {
        AttributesBuilder::new()
            .set("name", "example")
            .set("empty", "")
            .set("enabled", true)
            .set("ttl", 30i64)
            .set("ratio", 0.5)
            .set("ids", Value::string_list(["a", "b"]))
            .set("tags", Value::string_map([("env", "test")]))
            .set(
                "dns_config",
                Value::block(AttributesBuilder::new().set("ttl", 60i64).build()),
            )
            .build()
    }

    #[test]
    fn reads_scalars() {
        let attrs = sample();
        assert_eq!(string(&attrs, "name"), Some("example"));
        assert_eq!(bool(&attrs, "enabled"), Some(true));
        assert_eq!(int(&attrs, "ttl"), Some(30));
        assert_eq!(float(&attrs, "ratio"), Some(0.5));
        assert_eq!(float(&attrs, "ttl"), Some(30.0));
        assert_eq!(int(&attrs, "missing"), None);
    }

    #[test]
    fn empty_string_is_unset_for_non_empty_reads() {
        let attrs = sample();
        assert_eq!(string(&attrs, "empty"), Some(""));
        assert_eq!(non_empty_string(&attrs, "empty"), None);
    }

    #[test]
    fn reads_collections() {
        let attrs = sample();
        assert_eq!(string_list(&attrs, "ids"), vec!["a", "b"]);
        assert_eq!(string_map(&attrs, "tags").get("env").map(String::as_str), Some("test"));
        assert!(string_list(&attrs, "missing").is_empty());
    }

    #[test]
    fn reads_nested_block() {
        let attrs = sample();
        let dns = block(&attrs, "dns_config").unwrap();
        assert_eq!(int(dns, "ttl"), Some(60));
        assert!(block(&attrs, "monitor_config").is_none());
    }

    #[test]
    fn set_opt_skips_none() {
        let attrs = AttributesBuilder::new()
            .set_opt("fqdn", None::<String>)
            .set_opt("ttl", Some(5i64))
            .build();
        assert!(!attrs.contains_key("fqdn"));
        assert_eq!(attrs.get("ttl"), Some(&Value::Int(5)));
    }
}
