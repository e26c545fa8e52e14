//! Schema - Define type schemas for resources
//!
//! Providers define a schema for each resource type so configuration is
//! rejected before any ARM call is made.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::resource::{Attributes, Value};

/// Validation function attached to a custom attribute type
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>);

impl Validator {
    pub fn new(f: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn check(&self, value: &Value) -> Result<(), String> {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Floating point (integers are accepted)
    Float,
    /// Boolean
    Bool,
    /// Enum (list of allowed values, case-sensitive)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: Validator,
    },
    /// List
    List(Box<AttributeType>),
    /// Map with string keys
    Map(Box<AttributeType>),
    /// Nested configuration block(s)
    Block(Box<BlockSchema>),
}

impl AttributeType {
    /// Check if a value conforms to this type, stopping at the first error
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        let mut errors = Vec::new();
        self.validate_into("", value, &mut errors);
        match errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn validate_into(&self, path: &str, value: &Value, errors: &mut Vec<TypeError>) {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => {}
            (AttributeType::Int, Value::Int(_)) => {}
            (AttributeType::Float, Value::Float(_) | Value::Int(_)) => {}
            (AttributeType::Bool, Value::Bool(_)) => {}

            (AttributeType::Enum(variants), Value::String(s)) => {
                if !variants.iter().any(|v| v == s) {
                    errors.push(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    });
                }
            }

            (AttributeType::Custom { base, validate, .. }, v) => {
                let before = errors.len();
                base.validate_into(path, v, errors);
                if errors.len() == before
                    && let Err(message) = validate.check(v)
                {
                    errors.push(TypeError::ValidationFailed { message });
                }
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if let Err(e) = inner.validate(item) {
                        errors.push(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(e),
                        });
                    }
                }
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    if let Err(e) = inner.validate(v) {
                        errors.push(TypeError::MapValueError {
                            key: k.clone(),
                            inner: Box::new(e),
                        });
                    }
                }
            }

            (AttributeType::Block(block), Value::List(items)) => {
                block.validate_items(path, items, errors);
            }

            _ => errors.push(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Float => "Float".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("Block '{name}' needs at least {min} item(s), got {got}")]
    TooFewItems { name: String, min: usize, got: usize },

    #[error("Block '{name}' allows at most {max} item(s), got {got}")]
    TooManyItems { name: String, max: usize, got: usize },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by Azure only; configuration may not set it
    pub computed: bool,
    /// Changing the value requires the resource to be recreated
    pub force_new: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Canonical form used when comparing configuration with remote state
    pub normalize: Option<fn(&str) -> String>,
    /// Azure picks a value when configuration leaves it unset
    pub remote_default: bool,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            force_new: false,
            default: None,
            description: None,
            normalize: None,
            remote_default: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Compare string values by `f(value)` (e.g., locations)
    pub fn normalized(mut self, f: fn(&str) -> String) -> Self {
        self.normalize = Some(f);
        self
    }

    pub fn remote_default(mut self) -> Self {
        self.remote_default = true;
        self
    }
}

/// Nested block schema
#[derive(Debug, Clone, Default)]
pub struct BlockSchema {
    pub attributes: BTreeMap<String, AttributeSchema>,
    pub min_items: usize,
    pub max_items: Option<usize>,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Wrap as an attribute type
    pub fn into_type(self) -> AttributeType {
        AttributeType::Block(Box::new(self))
    }

    fn validate_items(&self, path: &str, items: &[Value], errors: &mut Vec<TypeError>) {
        if items.len() < self.min_items {
            errors.push(TypeError::TooFewItems {
                name: path.to_string(),
                min: self.min_items,
                got: items.len(),
            });
        }
        if let Some(max) = self.max_items
            && items.len() > max
        {
            errors.push(TypeError::TooManyItems {
                name: path.to_string(),
                max,
                got: items.len(),
            });
        }

        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{}.{}", path, i);
            match item {
                Value::Map(attrs) => validate_attributes(&self.attributes, &item_path, attrs, errors),
                other => errors.push(TypeError::AttributeError {
                    name: item_path,
                    inner: Box::new(TypeError::TypeMismatch {
                        expected: "Map".to_string(),
                        got: other.type_name(),
                    }),
                }),
            }
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn validate_attributes(
    schemas: &BTreeMap<String, AttributeSchema>,
    prefix: &str,
    attributes: &Attributes,
    errors: &mut Vec<TypeError>,
) {
    for (name, schema) in schemas {
        if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
            errors.push(TypeError::MissingRequired {
                name: join_path(prefix, name),
            });
        }
    }

    let mut names: Vec<&String> = attributes.keys().collect();
    names.sort();
    for name in names {
        let path = join_path(prefix, name);
        let Some(schema) = schemas.get(name) else {
            errors.push(TypeError::UnknownAttribute { name: path });
            continue;
        };
        if schema.computed {
            errors.push(TypeError::ComputedAttribute { name: path });
            continue;
        }

        let mut nested = Vec::new();
        schema
            .attr_type
            .validate_into(&path, &attributes[name], &mut nested);
        for e in nested {
            // Block errors already carry their full path
            match e {
                TypeError::MissingRequired { .. }
                | TypeError::UnknownAttribute { .. }
                | TypeError::ComputedAttribute { .. }
                | TypeError::TooFewItems { .. }
                | TypeError::TooManyItems { .. }
                | TypeError::AttributeError { .. } => errors.push(e),
                other => errors.push(TypeError::AttributeError {
                    name: path.clone(),
                    inner: Box::new(other),
                }),
            }
        }
    }
}

fn apply_defaults_to(schemas: &BTreeMap<String, AttributeSchema>, attributes: &mut Attributes) {
    for (name, schema) in schemas {
        if let Some(default) = &schema.default
            && !attributes.contains_key(name)
        {
            attributes.insert(name.clone(), default.clone());
        }

        if let AttributeType::Block(block) = &schema.attr_type
            && let Some(Value::List(items)) = attributes.get_mut(name)
        {
            for item in items.iter_mut() {
                if let Value::Map(nested) = item {
                    apply_defaults_to(&block.attributes, nested);
                }
            }
        }
    }
}

// =============================================================================
// Diff
// =============================================================================

/// Differences between configuration and remote state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Paths of every attribute whose value differs
    pub changed: Vec<String>,
    /// Changed paths that can only be applied by recreating the resource
    pub replace: Vec<String>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn requires_replacement(&self) -> bool {
        !self.replace.is_empty()
    }
}

/// Unset and zero values read back the same way from ARM
fn is_zero(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Int(i)) => *i == 0,
        Some(Value::Float(f)) => *f == 0.0,
        Some(Value::Bool(b)) => !b,
        Some(Value::List(items)) => items.is_empty(),
        Some(Value::Map(map)) => map.is_empty(),
    }
}

fn scalar_equal(schema: &AttributeSchema, desired: &Value, current: &Value) -> bool {
    match (desired, current) {
        (Value::String(a), Value::String(b)) => match schema.normalize {
            Some(f) => f(a) == f(b),
            None => a == b,
        },
        (Value::Float(_) | Value::Int(_), Value::Float(_) | Value::Int(_)) => {
            desired.as_float() == current.as_float()
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| scalar_equal(schema, v, w)))
        }
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(v, w)| scalar_equal(schema, v, w))
        }
        _ => desired == current,
    }
}

fn diff_attributes(
    schemas: &BTreeMap<String, AttributeSchema>,
    prefix: &str,
    replacing: bool,
    desired: &Attributes,
    current: &Attributes,
    diff: &mut SchemaDiff,
) {
    for (name, schema) in schemas {
        if schema.computed {
            continue;
        }
        let path = join_path(prefix, name);
        let forces = replacing || schema.force_new;
        let d = desired.get(name);
        let c = current.get(name);

        if let AttributeType::Block(block) = &schema.attr_type {
            let d_items = d.and_then(Value::as_list).unwrap_or_default();
            let c_items = c.and_then(Value::as_list).unwrap_or_default();
            if d_items.len() != c_items.len() {
                diff.changed.push(path.clone());
                if forces && d.is_some() {
                    diff.replace.push(path);
                }
                continue;
            }
            let empty = Attributes::new();
            for (i, (d_item, c_item)) in d_items.iter().zip(c_items).enumerate() {
                diff_attributes(
                    &block.attributes,
                    &format!("{}.{}", path, i),
                    forces,
                    d_item.as_map().unwrap_or(&empty),
                    c_item.as_map().unwrap_or(&empty),
                    diff,
                );
            }
            continue;
        }

        let equal = match (d, c) {
            _ if is_zero(d) && (is_zero(c) || schema.remote_default) => true,
            (Some(d), Some(c)) => scalar_equal(schema, d, c),
            _ => false,
        };
        if equal {
            continue;
        }
        diff.changed.push(path.clone());
        // Remote values the configuration leaves unset never force replacement
        if forces && d.is_some() {
            diff.replace.push(path);
        }
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: BTreeMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: BTreeMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes, collecting every error
    pub fn validate(&self, attributes: &Attributes) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();
        validate_attributes(&self.attributes, "", attributes, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Fill in declared defaults, including inside nested blocks
    pub fn apply_defaults(&self, attributes: &mut Attributes) {
        apply_defaults_to(&self.attributes, attributes);
    }

    /// Compare configuration (defaults applied) with the state read from Azure
    ///
    /// Computed attributes are ignored. A force-new attribute, or any
    /// attribute nested in a force-new block, lands in `replace` as well.
    pub fn diff(&self, desired: &Attributes, current: &Attributes) -> SchemaDiff {
        let mut diff = SchemaDiff::default();
        diff_attributes(&self.attributes, "", false, desired, current, &mut diff);
        diff
    }
}

/// Helper functions for common types
pub mod types {
    use std::sync::LazyLock;

    use regex::Regex;

    use super::*;
    use crate::arm_id::ArmResourceId;

    fn custom(
        name: &str,
        base: AttributeType,
        f: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> AttributeType {
        AttributeType::Custom {
            name: name.to_string(),
            base: Box::new(base),
            validate: Validator::new(f),
        }
    }

    /// Enum from string literals
    pub fn one_of(values: &[&str]) -> AttributeType {
        AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    /// Enum compared without regard to case (e.g., `HTTP` / `http`)
    pub fn one_of_ignore_case(name: &str, values: &'static [&'static str]) -> AttributeType {
        custom(name, AttributeType::String, move |value| {
            let s = value.as_str().unwrap_or_default();
            if values.iter().any(|v| v.eq_ignore_ascii_case(s)) {
                Ok(())
            } else {
                Err(format!(
                    "Invalid value '{}', expected one of: {}",
                    s,
                    values.join(", ")
                ))
            }
        })
    }

    /// String that must not be empty
    pub fn non_empty_string() -> AttributeType {
        custom("NonEmptyString", AttributeType::String, |value| {
            match value.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(()),
                _ => Err("Value must not be empty".to_string()),
            }
        })
    }

    /// Name used as an ID path segment: non-empty and free of `/`
    pub fn segment_name() -> AttributeType {
        custom("SegmentName", AttributeType::String, |value| {
            match value.as_str() {
                Some(s) if crate::arm_id::is_valid_segment(s) => Ok(()),
                _ => Err("Value must be non-empty and may not contain '/'".to_string()),
            }
        })
    }

    /// String matching a regular expression
    pub fn string_matching(
        name: &str,
        pattern: &'static Regex,
        message: &'static str,
    ) -> AttributeType {
        custom(name, AttributeType::String, move |value| {
            let s = value.as_str().unwrap_or_default();
            if pattern.is_match(s) {
                Ok(())
            } else {
                Err(format!("'{}' is invalid: {}", s, message))
            }
        })
    }

    /// Integer within an inclusive range
    pub fn int_between(min: i64, max: i64) -> AttributeType {
        custom(
            &format!("Int[{}..={}]", min, max),
            AttributeType::Int,
            move |value| match value.as_int() {
                Some(n) if n >= min && n <= max => Ok(()),
                Some(n) => Err(format!("Value {} must be between {} and {}", n, min, max)),
                None => Err("Expected integer".to_string()),
            },
        )
    }

    /// Integer no smaller than `min`
    pub fn int_at_least(min: i64) -> AttributeType {
        custom(
            &format!("Int[{}..]", min),
            AttributeType::Int,
            move |value| match value.as_int() {
                Some(n) if n >= min => Ok(()),
                Some(n) => Err(format!("Value {} must be at least {}", n, min)),
                None => Err("Expected integer".to_string()),
            },
        )
    }

    /// Float no smaller than `min`
    pub fn float_at_least(min: f64) -> AttributeType {
        custom(
            &format!("Float[{}..]", min),
            AttributeType::Float,
            move |value| match value.as_float() {
                Some(n) if n >= min => Ok(()),
                Some(n) => Err(format!("Value {} must be at least {}", n, min)),
                None => Err("Expected number".to_string()),
            },
        )
    }

    /// Absolute URL with the `https` scheme
    pub fn https_url() -> AttributeType {
        custom("HttpsUrl", AttributeType::String, |value| {
            let s = value.as_str().unwrap_or_default();
            validate_https_url(s)
        })
    }

    static RESOURCE_GROUP_NAME: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[-\w._()]+$").expect("valid regex"));

    /// Resource group name: 1-90 characters of letters, digits, `-_.()`,
    /// not ending in a period
    pub fn resource_group_name() -> AttributeType {
        custom("ResourceGroupName", AttributeType::String, |value| {
            validate_resource_group_name(value.as_str().unwrap_or_default())
        })
    }

    /// Azure location (e.g., "westeurope" or "West Europe")
    pub fn location() -> AttributeType {
        custom("Location", AttributeType::String, |value| {
            match value.as_str() {
                Some(s) if !normalize_location(s).is_empty() => Ok(()),
                _ => Err("Location must not be empty".to_string()),
            }
        })
    }

    /// String holding an ARM ID of a given typed kind
    pub fn arm_id<T: ArmResourceId + 'static>(name: &str) -> AttributeType {
        custom(name, AttributeType::String, |value| {
            T::parse(value.as_str().unwrap_or_default())
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
    }

    /// Tags (string map)
    pub fn tags() -> AttributeType {
        AttributeType::Map(Box::new(AttributeType::String))
    }

    /// List of strings
    pub fn string_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::String))
    }

    pub fn validate_resource_group_name(s: &str) -> Result<(), String> {
        if s.is_empty() || s.len() > 90 {
            return Err(format!(
                "Resource group name '{}' must be between 1 and 90 characters",
                s
            ));
        }
        if s.ends_with('.') {
            return Err(format!("Resource group name '{}' cannot end with a period", s));
        }
        if !RESOURCE_GROUP_NAME.is_match(s) {
            return Err(format!(
                "Resource group name '{}' may only contain alphanumeric characters, dash, underscore, parentheses and periods",
                s
            ));
        }
        Ok(())
    }

    pub fn validate_https_url(s: &str) -> Result<(), String> {
        let parsed = url::Url::parse(s).map_err(|e| format!("'{}' is not a valid URL: {}", s, e))?;
        if parsed.scheme() != "https" {
            return Err(format!("'{}' must use the https scheme", s));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(format!("'{}' must have a host", s));
        }
        Ok(())
    }

    /// Normalize a location for comparison ("West Europe" -> "westeurope")
    pub fn normalize_location(s: &str) -> String {
        s.replace(' ', "").to_lowercase()
    }
}
