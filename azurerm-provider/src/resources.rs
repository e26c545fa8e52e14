//! Resource handler registration
//!
//! This module defines:
//! - The `ResourceHandler` trait every supported resource type implements
//! - The registration table mapping resource type names to handlers

use std::sync::Arc;

use async_trait::async_trait;
use azurerm_core::provider::{ProviderError, ProviderResult, ResourceType};
use azurerm_core::resource::{Attributes, ResourceAddress, State};
use azurerm_core::schema::ResourceSchema;

use crate::client::ArmClient;
use crate::services::media::{
    MediaContentKeyPolicy, MediaServicesAccount, MediaStreamingPolicy, MediaTransform,
};
use crate::services::trafficmanager::{TrafficManagerEndpoint, TrafficManagerProfile};

/// What a handler needs to reach Azure
#[derive(Clone)]
pub struct ProviderContext {
    pub subscription_id: String,
    pub client: Arc<dyn ArmClient>,
}

impl ProviderContext {
    pub fn new(subscription_id: impl Into<String>, client: Arc<dyn ArmClient>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            client,
        }
    }
}

/// CRUD for a single resource type
///
/// Attributes passed to `create` and `update` have already been validated
/// against `schema()` and `validate()`, with defaults applied.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Resource type name (e.g., "azurerm_media_transform")
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    /// Rules spanning several attributes; one message per violation
    fn validate(&self, _attributes: &Attributes) -> Vec<String> {
        Vec::new()
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        attributes: &Attributes,
    ) -> ProviderResult<State>;

    async fn read(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<State>;

    /// In-place update; resources whose attributes all force replacement keep the default
    async fn update(
        &self,
        _ctx: &ProviderContext,
        address: &ResourceAddress,
        _identifier: &str,
        _attributes: &Attributes,
    ) -> ProviderResult<State> {
        Err(ProviderError::unsupported(format!(
            "{} does not support in-place updates",
            self.type_name()
        ))
        .for_resource(address.clone()))
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<()>;
}

// =============================================================================
// Registration Table
// =============================================================================

static HANDLERS: &[&dyn ResourceHandler] = &[
    &MediaContentKeyPolicy,
    &MediaServicesAccount,
    &MediaStreamingPolicy,
    &MediaTransform,
    &TrafficManagerEndpoint,
    &TrafficManagerProfile,
];

/// Every registered handler, in type-name order
pub fn handlers() -> &'static [&'static dyn ResourceHandler] {
    HANDLERS
}

/// Get the handler for a resource type name
pub fn get_handler(type_name: &str) -> Option<&'static dyn ResourceHandler> {
    HANDLERS.iter().copied().find(|h| h.type_name() == type_name)
}

/// `ResourceType` view of a registered handler
pub struct RegisteredType(&'static dyn ResourceHandler);

impl ResourceType for RegisteredType {
    fn name(&self) -> &'static str {
        self.0.type_name()
    }

    fn schema(&self) -> ResourceSchema {
        self.0.schema()
    }
}

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    HANDLERS
        .iter()
        .map(|h| Box::new(RegisteredType(*h)) as Box<dyn ResourceType>)
        .collect()
}
