//! ARM resource IDs
//!
//! `ParsedArmId` splits an ID such as
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Media/mediaServices/{name}`
//! into its parts. Typed IDs are declared with [`resource_id!`] and pop
//! their segments off a `ParsedArmId` in order.

use std::fmt;

/// Errors raised while parsing a resource ID
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceIdError {
    #[error("Cannot parse Azure ID {input:?}: the ID must be an absolute path starting with '/'")]
    NotAbsolute { input: String },

    #[error("The number of path segments is not divisible by 2 in {path:?}")]
    OddSegments { path: String },

    #[error("Key/Value cannot be empty strings. Key: '{key}', Value: '{value}'")]
    EmptySegment { key: String, value: String },

    #[error("No subscription ID found in: {path:?}")]
    MissingSubscription { path: String },

    #[error("ID was missing the `{key}` element")]
    MissingSegment { key: String },

    #[error("ID contained more segments than required: {input:?}")]
    UnexpectedSegments { input: String },

    #[error("Segment `{key}` must be non-empty and contain no '/', got {value:?}")]
    InvalidSegment { key: String, value: String },

    #[error("{message}")]
    Invalid { message: String },
}

/// Generic decomposition of an ARM resource ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArmId {
    pub subscription_id: String,
    /// Empty for subscription-level IDs
    pub resource_group: String,
    /// First `providers` namespace (e.g., "Microsoft.Media")
    pub provider: String,
    /// Second `providers` namespace, for extension resources
    pub secondary_provider: String,
    /// Remaining key/value pairs in input order
    pub path: Vec<(String, String)>,
}

impl ParsedArmId {
    pub fn parse(input: &str) -> Result<Self, ResourceIdError> {
        let Some(path) = input.strip_prefix('/') else {
            return Err(ResourceIdError::NotAbsolute {
                input: input.to_string(),
            });
        };
        let path = path.strip_suffix('/').unwrap_or(path);

        let components: Vec<&str> = path.split('/').collect();
        if components.len() % 2 != 0 {
            return Err(ResourceIdError::OddSegments {
                path: path.to_string(),
            });
        }

        let mut subscription_id = String::new();
        let mut provider = String::new();
        let mut secondary_provider = String::new();
        let mut pairs = Vec::new();

        for pair in components.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() || value.is_empty() {
                return Err(ResourceIdError::EmptySegment {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }

            match key {
                "subscriptions" if subscription_id.is_empty() => {
                    subscription_id = value.to_string();
                }
                "providers" if provider.is_empty() => {
                    provider = value.to_string();
                }
                "providers" if secondary_provider.is_empty() => {
                    secondary_provider = value.to_string();
                }
                _ => pairs.push((key.to_string(), value.to_string())),
            }
        }

        if subscription_id.is_empty() {
            return Err(ResourceIdError::MissingSubscription {
                path: path.to_string(),
            });
        }

        let mut id = Self {
            subscription_id,
            resource_group: String::new(),
            provider,
            secondary_provider,
            path: pairs,
        };

        // Some APIs return the lowercase form
        if let Some(rg) = id
            .take("resourceGroups")
            .or_else(|| id.take("resourcegroups"))
        {
            id.resource_group = rg;
        }

        Ok(id)
    }

    fn take(&mut self, key: &str) -> Option<String> {
        let index = self.path.iter().position(|(k, _)| k == key)?;
        Some(self.path.remove(index).1)
    }

    /// Whether an unconsumed segment with this key is present
    pub fn has_segment(&self, key: &str) -> bool {
        self.path.iter().any(|(k, _)| k == key)
    }

    /// Remove and return the value of a path segment
    pub fn pop_segment(&mut self, key: &str) -> Result<String, ResourceIdError> {
        self.take(key).ok_or_else(|| ResourceIdError::MissingSegment {
            key: key.to_string(),
        })
    }

    /// The resource group, or an error for subscription-level IDs
    pub fn require_resource_group(&self) -> Result<String, ResourceIdError> {
        if self.resource_group.is_empty() {
            return Err(ResourceIdError::MissingSegment {
                key: "resourceGroups".to_string(),
            });
        }
        Ok(self.resource_group.clone())
    }

    /// Fail when segments remain after a typed parser popped what it needs
    pub fn validate_no_empty_segments(&self, input: &str) -> Result<(), ResourceIdError> {
        if self.path.is_empty() {
            Ok(())
        } else {
            Err(ResourceIdError::UnexpectedSegments {
                input: input.to_string(),
            })
        }
    }
}

/// Whether `value` can stand as the value of an ID path segment
pub fn is_valid_segment(value: &str) -> bool {
    !value.is_empty() && !value.contains('/')
}

/// Check named segment values before building an ID from them
pub fn check_segments(values: &[(&str, &str)]) -> Result<(), ResourceIdError> {
    match values.iter().find(|(_, value)| !is_valid_segment(value)) {
        Some((key, value)) => Err(ResourceIdError::InvalidSegment {
            key: key.to_string(),
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}

/// Panics in debug builds when a typed ID is built from values it could not
/// parse back
#[doc(hidden)]
pub fn debug_assert_segments(values: &[&str]) {
    for value in values {
        debug_assert!(
            is_valid_segment(value),
            "invalid resource ID segment value {:?}",
            value
        );
    }
}

/// A typed ARM resource ID
pub trait ArmResourceId: Sized + fmt::Display {
    /// Parse from the string form
    fn parse(input: &str) -> Result<Self, ResourceIdError>;

    /// Format as the canonical string form
    fn id(&self) -> String;
}

/// Declare a typed resource ID below a resource group
///
/// ```
/// azurerm_core::resource_id! {
///     /// A Media Services transform
///     pub struct TransformId {
///         provider: "Microsoft.Media",
///         segments: {
///             account_name: "mediaServices",
///             name: "transforms",
///         }
///     }
/// }
///
/// use azurerm_core::arm_id::ArmResourceId;
/// let id = TransformId::new("sub", "rg", "acct", "t1");
/// assert_eq!(TransformId::parse(&id.id()).unwrap(), id);
/// ```
#[macro_export]
macro_rules! resource_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            provider: $provider:literal,
            segments: { $($field:ident : $segment:literal),+ $(,)? } $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis struct $name {
            pub subscription_id: String,
            pub resource_group: String,
            $(pub $field: String,)+
        }

        impl $name {
            pub const PROVIDER: &'static str = $provider;

            pub fn new(
                subscription_id: impl Into<String>,
                resource_group: impl Into<String>,
                $($field: impl Into<String>,)+
            ) -> Self {
                let id = Self {
                    subscription_id: subscription_id.into(),
                    resource_group: resource_group.into(),
                    $($field: $field.into(),)+
                };
                $crate::arm_id::debug_assert_segments(&[
                    id.subscription_id.as_str(),
                    id.resource_group.as_str(),
                    $(id.$field.as_str(),)+
                ]);
                id
            }

            /// Like `new`, but rejects empty values and values containing '/'
            pub fn try_new(
                subscription_id: impl Into<String>,
                resource_group: impl Into<String>,
                $($field: impl Into<String>,)+
            ) -> ::std::result::Result<Self, $crate::arm_id::ResourceIdError> {
                let id = Self {
                    subscription_id: subscription_id.into(),
                    resource_group: resource_group.into(),
                    $($field: $field.into(),)+
                };
                $crate::arm_id::check_segments(&[
                    ("subscriptions", id.subscription_id.as_str()),
                    ("resourceGroups", id.resource_group.as_str()),
                    $(($segment, id.$field.as_str()),)+
                ])?;
                Ok(id)
            }
        }

        impl $crate::arm_id::ArmResourceId for $name {
            fn parse(input: &str) -> ::std::result::Result<Self, $crate::arm_id::ResourceIdError> {
                let mut parsed = $crate::arm_id::ParsedArmId::parse(input)?;
                let resource_group = parsed.require_resource_group()?;
                $(let $field = parsed.pop_segment($segment)?;)+
                parsed.validate_no_empty_segments(input)?;

                Ok(Self {
                    subscription_id: parsed.subscription_id,
                    resource_group,
                    $($field,)+
                })
            }

            fn id(&self) -> String {
                let mut out = format!(
                    "/subscriptions/{}/resourceGroups/{}/providers/{}",
                    self.subscription_id, self.resource_group, $provider
                );
                $(out.push_str(&format!("/{}/{}", $segment, self.$field));)+
                out
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::arm_id::ResourceIdError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                <Self as $crate::arm_id::ArmResourceId>::parse(s)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&<Self as $crate::arm_id::ArmResourceId>::id(self))
            }
        }
    };
}
