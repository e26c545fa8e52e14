//! Validators for Media Services attributes

use std::sync::LazyLock;

use azurerm_core::resource::Value;
use azurerm_core::schema::types::string_matching;
use azurerm_core::schema::{AttributeType, Validator};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;

static ACCOUNT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-z0-9]{3,24}$").expect("valid regex"));

static CHILD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9(_)]{1,128}$").expect("valid regex"));

/// Media Services account name
pub fn account_name() -> AttributeType {
    string_matching(
        "MediaServicesAccountName",
        &ACCOUNT_NAME,
        "Media Services Account name must be 3 - 24 characters long, contain only lowercase letters, numbers and hyphens",
    )
}

/// Name of a transform, streaming policy or content key policy
pub fn child_name() -> AttributeType {
    string_matching(
        "MediaChildResourceName",
        &CHILD_NAME,
        "name must be 1 - 128 characters long, can contain letters, numbers, underscores, parentheses and hyphens",
    )
}

fn string_check(
    name: &str,
    check: impl Fn(&str) -> Result<(), String> + Send + Sync + 'static,
) -> AttributeType {
    AttributeType::Custom {
        name: name.to_string(),
        base: Box::new(AttributeType::String),
        validate: Validator::new(move |value: &Value| check(value.as_str().unwrap_or_default())),
    }
}

/// Integer drawn from a fixed set (e.g., PlayReady output protection levels)
pub fn int_one_of(values: &'static [i64]) -> AttributeType {
    AttributeType::Custom {
        name: "IntOneOf".to_string(),
        base: Box::new(AttributeType::Int),
        validate: Validator::new(move |value: &Value| match value.as_int() {
            Some(n) if values.contains(&n) => Ok(()),
            Some(n) => Err(format!("Value {} must be one of {:?}", n, values)),
            None => Err("Expected integer".to_string()),
        }),
    }
}

/// Timestamp such as `2024-01-01T00:00:00Z`
pub fn rfc3339_time() -> AttributeType {
    string_check("Rfc3339Time", |s| {
        chrono::DateTime::parse_from_rfc3339(s)
            .map(|_| ())
            .map_err(|e| format!("'{}' is not an RFC 3339 timestamp: {}", s, e))
    })
}

/// Content key identifier
pub fn key_id() -> AttributeType {
    string_check("KeyId", |s| {
        uuid::Uuid::parse_str(s)
            .map(|_| ())
            .map_err(|e| format!("'{}' is not a UUID: {}", s, e))
    })
}

/// Non-empty hex encoded bytes (FairPlay application secret key)
pub fn hex_bytes() -> AttributeType {
    string_check("HexBytes", |s| match hex::decode(s) {
        Ok(bytes) if !bytes.is_empty() => Ok(()),
        Ok(_) => Err("Value must not be empty".to_string()),
        Err(e) => Err(format!("value is not hex encoded: {}", e)),
    })
}

/// Non-empty base64 encoded bytes
pub fn base64_bytes() -> AttributeType {
    string_check("Base64Bytes", |s| match STANDARD.decode(s) {
        Ok(bytes) if !bytes.is_empty() => Ok(()),
        Ok(_) => Err("Value must not be empty".to_string()),
        Err(e) => Err(format!("value is not base64 encoded: {}", e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_names() {
        let t = account_name();
        assert!(t.validate(&Value::from("media-acct1")).is_ok());
        assert!(t.validate(&Value::from("ab")).is_err());
        assert!(t.validate(&Value::from("MediaAcct")).is_err());
        assert!(t.validate(&Value::from("a".repeat(25))).is_err());
    }

    #[test]
    fn child_names() {
        let t = child_name();
        assert!(t.validate(&Value::from("Transform-1_(copy)")).is_ok());
        assert!(t.validate(&Value::from("")).is_err());
        assert!(t.validate(&Value::from("has space")).is_err());
        assert!(t.validate(&Value::from("x".repeat(129))).is_err());
    }

    #[test]
    fn encoded_values() {
        assert!(rfc3339_time().validate(&Value::from("2024-03-01T10:00:00Z")).is_ok());
        assert!(rfc3339_time().validate(&Value::from("2024-03-01")).is_err());

        assert!(key_id().validate(&Value::from("0ac8a2e5-7e2b-4a3c-9a4c-26b3b6c1a0f1")).is_ok());
        assert!(key_id().validate(&Value::from("not-a-uuid")).is_err());

        assert!(hex_bytes().validate(&Value::from("0123456789abcdef")).is_ok());
        assert!(hex_bytes().validate(&Value::from("xyz")).is_err());
        assert!(hex_bytes().validate(&Value::from("")).is_err());

        assert!(base64_bytes().validate(&Value::from("AAAAAAAAAAAAAAAAAAAAAA==")).is_ok());
        assert!(base64_bytes().validate(&Value::from("***")).is_err());

        let opl = int_one_of(&[400, 500]);
        assert!(opl.validate(&Value::from(500)).is_ok());
        assert!(opl.validate(&Value::from(450)).is_err());
    }
}
