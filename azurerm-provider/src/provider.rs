//! Azure Resource Manager provider implementation
//!
//! Looks up the handler for a resource type, validates configuration before
//! any network call and runs each handler call under its timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use azurerm_core::provider::{ErrorKind, ProviderError, ProviderResult};
use azurerm_core::resource::{Attributes, Resource, ResourceAddress, State};
use log::debug;

use crate::client::ArmClient;
use crate::config::{ConfigError, ProviderConfig, Timeouts};
use crate::resources::{ProviderContext, ResourceHandler, get_handler};

/// Azure Resource Manager Provider
pub struct AzureProvider {
    ctx: ProviderContext,
    timeouts: Timeouts,
}

fn handler_for(address: &ResourceAddress) -> ProviderResult<&'static dyn ResourceHandler> {
    get_handler(&address.resource_type).ok_or_else(|| {
        ProviderError::unsupported(format!(
            "resource type {:?} is not supported",
            address.resource_type
        ))
        .for_resource(address.clone())
    })
}

/// Defaults applied, then every configuration problem, schema errors first
fn prepare(resource: &Resource) -> ProviderResult<(Attributes, Vec<String>)> {
    let handler = handler_for(&resource.address)?;
    let schema = handler.schema();
    let mut attributes = resource.attributes.clone();
    schema.apply_defaults(&mut attributes);

    let mut errors: Vec<String> = match schema.validate(&attributes) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };
    errors.extend(handler.validate(&attributes));
    Ok((attributes, errors))
}

/// Every configuration problem of `resource`; fails only for unknown types
pub fn validation_errors(resource: &Resource) -> ProviderResult<Vec<String>> {
    prepare(resource).map(|(_, errors)| errors)
}

/// Attributes of `resource` with defaults applied, or a validation error
pub fn validate_resource(resource: &Resource) -> ProviderResult<Attributes> {
    let (attributes, errors) = prepare(resource)?;
    if !errors.is_empty() {
        return Err(ProviderError::validation(errors.join("; "))
            .for_resource(resource.address.clone()));
    }
    Ok(attributes)
}

async fn with_timeout<T>(
    address: &ResourceAddress,
    operation: &str,
    limit: Duration,
    future: impl Future<Output = ProviderResult<T>>,
) -> ProviderResult<T> {
    tokio::time::timeout(limit, future).await.unwrap_or_else(|_| {
        Err(ProviderError::new(format!(
            "{} timed out after {}s",
            operation,
            limit.as_secs()
        ))
        .with_kind(ErrorKind::Timeout)
        .for_resource(address.clone()))
    })
}

impl AzureProvider {
    /// Create a provider talking to Azure over HTTP
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let client = config.build_client()?;
        Ok(Self::with_client(
            &config.subscription_id,
            Arc::new(client),
            config.timeouts,
        ))
    }

    /// Create a provider over any ARM client
    pub fn with_client(
        subscription_id: impl Into<String>,
        client: Arc<dyn ArmClient>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            ctx: ProviderContext::new(subscription_id, client),
            timeouts,
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.ctx.subscription_id
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    pub async fn read_resource(
        &self,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<State> {
        let handler = handler_for(address)?;
        debug!("reading {} ({})", address, identifier);
        with_timeout(
            address,
            "reading",
            self.timeouts.read,
            handler.read(&self.ctx, address, identifier),
        )
        .await
    }

    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        let handler = handler_for(&resource.address)?;
        let attributes = validate_resource(resource)?;
        debug!("creating {}", resource.address);
        with_timeout(
            &resource.address,
            "creating",
            self.timeouts.create,
            handler.create(&self.ctx, &resource.address, &attributes),
        )
        .await
    }

    /// Update in place, or return the current state when nothing differs
    ///
    /// Changes to force-new attributes are refused with `Unsupported`: they
    /// need the resource deleted and created again.
    pub async fn update_resource(
        &self,
        identifier: &str,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let handler = handler_for(&resource.address)?;
        let attributes = validate_resource(resource)?;
        let current = self.read_resource(&resource.address, identifier).await?;
        if !current.exists {
            return Err(ProviderError::new(format!("{} no longer exists", identifier))
                .with_kind(ErrorKind::NotFound)
                .for_resource(resource.address.clone()));
        }

        let diff = handler.schema().diff(&attributes, &current.attributes);
        if diff.requires_replacement() {
            return Err(ProviderError::unsupported(format!(
                "requires replacement: {}",
                diff.replace.join(", ")
            ))
            .for_resource(resource.address.clone()));
        }
        if diff.is_empty() {
            debug!("{} is up to date", resource.address);
            return Ok(current);
        }

        debug!(
            "updating {} ({}): {}",
            resource.address,
            identifier,
            diff.changed.join(", ")
        );
        with_timeout(
            &resource.address,
            "updating",
            self.timeouts.update,
            handler.update(&self.ctx, &resource.address, identifier, &attributes),
        )
        .await
    }

    pub async fn delete_resource(
        &self,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<()> {
        let handler = handler_for(address)?;
        debug!("deleting {} ({})", address, identifier);
        with_timeout(
            address,
            "deleting",
            self.timeouts.delete,
            handler.delete(&self.ctx, address, identifier),
        )
        .await
    }
}
