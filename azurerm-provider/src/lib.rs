//! Azure Resource Manager Provider
//!
//! ## Module Structure
//!
//! - `client` - ARM client trait, HTTP implementation and credentials
//! - `config` - Provider configuration from `ARM_*` variables
//! - `provider` - AzureProvider implementation
//! - `resources` - Resource handler trait and registration table
//! - `services` - Per-service IDs, validators, wire models and handlers
//! - `utils` - Helpers shared by handlers

pub mod client;
pub mod config;
pub mod provider;
pub mod resources;
pub mod services;
pub mod utils;

// Re-export main types
pub use config::{ConfigError, ProviderConfig, Timeouts};
pub use provider::{AzureProvider, validate_resource, validation_errors};
pub use resources::{get_handler, handlers};

use azurerm_core::provider::{BoxFuture, Provider, ProviderResult};
use azurerm_core::resource::{Resource, ResourceAddress, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AzureProvider {
    fn name(&self) -> &'static str {
        "azurerm"
    }

    fn resource_types(&self) -> Vec<Box<dyn azurerm_core::provider::ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        address: &ResourceAddress,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let address = address.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.read_resource(&address, &identifier).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        _address: &ResourceAddress,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&identifier, &to).await })
    }

    fn delete(&self, address: &ResourceAddress, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let address = address.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&address, &identifier).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockArmClient;
    use azurerm_core::attrs::AttributesBuilder;
    use azurerm_core::provider::ErrorKind;
    use azurerm_core::resource::Value;
    use std::sync::Arc;

    fn provider(client: Arc<MockArmClient>) -> Box<dyn Provider> {
        Box::new(AzureProvider::with_client(
            "sub",
            client,
            Timeouts::default(),
        ))
    }

    fn transform() -> Resource {
        let output = AttributesBuilder::new()
            .set(
                "builtin_preset",
                Value::block(
                    AttributesBuilder::new()
                        .set("preset_name", "AACGoodQualityAudio")
                        .build(),
                ),
            )
            .build();
        Resource::new("azurerm_media_transform", "example")
            .with_attribute("name", "transform1")
            .with_attribute("resource_group_name", "rg")
            .with_attribute("media_services_account_name", "mediaacct1")
            .with_attribute("output", Value::blocks(vec![output]))
    }

    #[test]
    fn lists_registered_types() {
        let provider = provider(Arc::new(MockArmClient::new()));
        assert_eq!(provider.name(), "azurerm");
        let names: Vec<_> = provider.resource_types().iter().map(|t| t.name()).collect();
        assert!(names.contains(&"azurerm_media_services_account"));
        assert!(names.contains(&"azurerm_media_content_key_policy"));
        assert!(names.contains(&"azurerm_traffic_manager_endpoint"));
    }

    #[tokio::test]
    async fn invalid_configuration_never_reaches_azure() {
        let client = Arc::new(MockArmClient::new());
        let provider = provider(client.clone());
        let mut resource = transform();
        resource
            .attributes
            .insert("output".to_string(), Value::blocks(vec![Default::default()]));

        let err = provider.create(&resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("at least one type of preset"));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn create_update_read_delete() {
        let client = Arc::new(MockArmClient::new());
        let provider = provider(client.clone());

        let state = provider.create(&transform()).await.unwrap();
        let identifier = state.identifier.clone().unwrap();
        assert!(identifier.ends_with("/mediaServices/mediaacct1/transforms/transform1"));

        let mut desired = transform();
        desired
            .attributes
            .insert("description".to_string(), Value::from("updated"));
        let updated = provider
            .update(&desired.address, &identifier, &state, &desired)
            .await
            .unwrap();
        assert_eq!(updated.attributes["description"], Value::from("updated"));

        provider.delete(&desired.address, &identifier).await.unwrap();
        let state = provider.read(&desired.address, &identifier).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn unknown_type_is_unsupported() {
        let provider = provider(Arc::new(MockArmClient::new()));
        let address = ResourceAddress::new("azurerm_virtual_machine", "vm");
        let err = provider.read(&address, "/subscriptions/sub").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
    }

    fn streaming_policy(protocol: &str) -> Resource {
        Resource::new("azurerm_media_streaming_policy", "policy")
            .with_attribute("name", "policy1")
            .with_attribute("resource_group_name", "rg")
            .with_attribute("media_services_account_name", "mediaacct1")
            .with_attribute(
                "no_encryption_enabled_protocols",
                Value::block(AttributesBuilder::new().set(protocol, true).build()),
            )
    }

    #[tokio::test]
    async fn reapplying_unchanged_streaming_policy_succeeds() {
        let client = Arc::new(MockArmClient::new());
        let provider = provider(client.clone());
        let resource = streaming_policy("download");
        let state = provider.create(&resource).await.unwrap();
        let identifier = state.identifier.clone().unwrap();

        let again = provider
            .update(&resource.address, &identifier, &state, &resource)
            .await
            .unwrap();
        assert!(again.exists);
        assert_eq!(
            client.requests().iter().filter(|r| r.method == "PUT").count(),
            1
        );
    }

    #[tokio::test]
    async fn streaming_policy_changes_require_replacement() {
        let provider = provider(Arc::new(MockArmClient::new()));
        let state = provider.create(&streaming_policy("download")).await.unwrap();
        let identifier = state.identifier.clone().unwrap();

        let changed = streaming_policy("hls");
        let err = provider
            .update(&changed.address, &identifier, &state, &changed)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert!(err.message.contains("no_encryption_enabled_protocols.0.hls"));
    }
}
