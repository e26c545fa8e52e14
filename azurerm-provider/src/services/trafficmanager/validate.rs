//! Validators for Traffic Manager attributes

use std::sync::LazyLock;

use azurerm_core::arm_id::ParsedArmId;
use azurerm_core::resource::Value;
use azurerm_core::schema::types::string_matching;
use azurerm_core::schema::{AttributeType, Validator};
use regex::Regex;

static STATUS_CODE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([1-9][0-9]{2})-([1-9][0-9]{2})$").expect("valid regex"));

/// HTTP status code range such as `200-299`
pub fn status_code_range() -> AttributeType {
    string_matching(
        "StatusCodeRange",
        &STATUS_CODE_RANGE,
        "expected a status code range such as 200-299",
    )
}

/// Split `200-299` into its bounds
pub fn parse_status_code_range(s: &str) -> Option<(i64, i64)> {
    let captures = STATUS_CODE_RANGE.captures(s)?;
    Some((captures[1].parse().ok()?, captures[2].parse().ok()?))
}

/// Probing interval: 10 or 30 seconds
pub fn monitor_interval() -> AttributeType {
    AttributeType::Custom {
        name: "MonitorInterval".to_string(),
        base: Box::new(AttributeType::Int),
        validate: Validator::new(|value: &Value| match value.as_int() {
            Some(10 | 30) => Ok(()),
            Some(n) => Err(format!("interval_in_seconds must be 10 or 30, got {}", n)),
            None => Err("Expected integer".to_string()),
        }),
    }
}

/// Any well-formed ARM resource ID
pub fn resource_id() -> AttributeType {
    AttributeType::Custom {
        name: "ResourceId".to_string(),
        base: Box::new(AttributeType::String),
        validate: Validator::new(|value: &Value| {
            ParsedArmId::parse(value.as_str().unwrap_or_default())
                .map(|_| ())
                .map_err(|e| e.to_string())
        }),
    }
}
