//! Provider - Trait abstracting resource operations
//!
//! A Provider translates declarative resources into ARM calls and turns the
//! responses back into `State`.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceAddress, State};
use crate::schema::ResourceSchema;

/// Category of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration rejected before any remote call
    Validation,
    /// The resource does not exist
    NotFound,
    /// Create found a resource that is not yet managed
    AlreadyExists,
    /// Azure returned an error or could not be reached
    Remote,
    /// The operation exceeded its timeout
    Timeout,
    /// Resource type or operation not supported
    Unsupported,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    pub address: Option<ResourceAddress>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref address) = self.address {
            write!(f, "[{}] {}", address, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Remote,
            message: message.into(),
            address: None,
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Validation)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Unsupported)
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn for_resource(mut self, address: ResourceAddress) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "azurerm_media_transform")
    fn name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;
}

/// Main Provider trait
///
/// All operations are async and involve side effects. Implementations
/// validate configuration against the resource schema before calling out.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "azurerm")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Get the current state of a resource by its ARM ID
    ///
    /// Returns `State::not_found()` if the resource no longer exists.
    fn read(
        &self,
        address: &ResourceAddress,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the ARM resource ID
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(
        &self,
        address: &ResourceAddress,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    fn delete(
        &self,
        address: &ResourceAddress,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn read(
        &self,
        address: &ResourceAddress,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(address, identifier)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        address: &ResourceAddress,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(address, identifier, from, to)
    }

    fn delete(
        &self,
        address: &ResourceAddress,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(address, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProvider;

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn read(
            &self,
            address: &ResourceAddress,
            _identifier: &str,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let address = address.clone();
            Box::pin(async move { Ok(State::not_found(address)) })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let address = resource.address.clone();
            let attrs = resource.attributes.clone();
            Box::pin(async move {
                Ok(State::existing(address, attrs).with_identifier("/subscriptions/x/resourceGroups/rg"))
            })
        }

        fn update(
            &self,
            address: &ResourceAddress,
            _identifier: &str,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let address = address.clone();
            let attrs = to.attributes.clone();
            Box::pin(async move { Ok(State::existing(address, attrs)) })
        }

        fn delete(
            &self,
            address: &ResourceAddress,
            _identifier: &str,
        ) -> BoxFuture<'_, ProviderResult<()>> {
            let address = address.clone();
            Box::pin(async move {
                Err(ProviderError::unsupported("delete is not supported").for_resource(address))
            })
        }
    }

    #[tokio::test]
    async fn mock_provider_read_returns_not_found() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        let address = ResourceAddress::new("test", "example");
        let state = provider.read(&address, "/subscriptions/x").await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn mock_provider_create_returns_existing() {
        let provider = MockProvider;
        let resource = Resource::new("test", "example");
        let state = provider.create(&resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(
            state.identifier.as_deref(),
            Some("/subscriptions/x/resourceGroups/rg")
        );
    }

    #[tokio::test]
    async fn error_display_includes_address() {
        let provider = MockProvider;
        let address = ResourceAddress::new("test", "example");
        let err = provider.delete(&address, "id").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert_eq!(err.to_string(), "[test.example] delete is not supported");
    }

    #[test]
    fn error_source_is_cause() {
        use std::error::Error;
        let err = ProviderError::validation("bad input")
            .with_cause(std::io::Error::other("inner"));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("inner"));
    }
}
