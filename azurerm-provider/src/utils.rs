//! Helpers shared by the resource handlers

use std::collections::HashMap;

use azurerm_core::arm_id::{ArmResourceId, ResourceIdError};
use azurerm_core::attrs;
use azurerm_core::provider::{ErrorKind, ProviderError, ProviderResult};
use azurerm_core::resource::{Attributes, ResourceAddress, Value};
use azurerm_core::schema::types::normalize_location;

use crate::client::{ArmClient, ArmError};

/// Tags from configuration; `None` when unset so the field is omitted
pub fn expand_tags(attributes: &Attributes) -> Option<HashMap<String, String>> {
    attributes
        .contains_key("tags")
        .then(|| attrs::string_map(attributes, "tags"))
}

pub fn flatten_tags(tags: Option<&HashMap<String, String>>) -> Value {
    Value::string_map(tags.into_iter().flatten().map(|(k, v)| (k.clone(), v.clone())))
}

/// Location in the lowercase, space-free form ARM returns
pub fn expand_location(attributes: &Attributes) -> String {
    attrs::string(attributes, "location")
        .map(normalize_location)
        .unwrap_or_default()
}

/// Parse the stored identifier with a typed ID
pub fn parse_id<T: ArmResourceId>(address: &ResourceAddress, identifier: &str) -> ProviderResult<T> {
    T::parse(identifier).map_err(|e| {
        ProviderError::validation(format!("parsing ID {:?}", identifier))
            .for_resource(address.clone())
            .with_cause(e)
    })
}

/// Validation error for an ID built from unusable names
pub fn invalid_id(address: &ResourceAddress, error: ResourceIdError) -> ProviderError {
    ProviderError::validation("building resource ID")
        .for_resource(address.clone())
        .with_cause(error)
}

/// Wrap an ARM failure with the action and resource ID it concerns
pub fn remote_error(
    address: &ResourceAddress,
    action: &str,
    id: &impl ArmResourceId,
    error: ArmError,
) -> ProviderError {
    let kind = if error.is_not_found() {
        ErrorKind::NotFound
    } else {
        ErrorKind::Remote
    };
    ProviderError::new(format!("{} {}: {}", action, id, error))
        .with_kind(kind)
        .for_resource(address.clone())
        .with_cause(error)
}

/// Error for a create that would adopt an existing resource
pub fn already_exists(address: &ResourceAddress, id: &impl ArmResourceId) -> ProviderError {
    ProviderError::new(format!(
        "a resource with the ID {:?} already exists - to be managed via the host it needs to be imported",
        id.id()
    ))
    .with_kind(ErrorKind::AlreadyExists)
    .for_resource(address.clone())
}

/// Fail unless nothing exists at `id` yet
pub async fn require_absent(
    client: &dyn ArmClient,
    address: &ResourceAddress,
    id: &impl ArmResourceId,
    api_version: &str,
) -> ProviderResult<()> {
    match client.get(&id.id(), api_version).await {
        Ok(None) => Ok(()),
        Ok(Some(_)) => Err(already_exists(address, id)),
        Err(e) => Err(remote_error(address, "checking for presence of existing", id, e)),
    }
}

/// Required string attribute; schema validation guarantees presence
pub fn required_string(attributes: &Attributes, key: &str) -> ProviderResult<String> {
    attrs::string(attributes, key)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::validation(format!("`{}` is required", key)))
}
