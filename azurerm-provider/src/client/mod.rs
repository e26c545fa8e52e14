//! Azure Resource Manager client
//!
//! Handlers talk to ARM through the [`ArmClient`] trait so tests can swap in
//! an in-memory implementation. Long-running operations are resolved inside
//! the client: `put` and `delete` return once Azure reports completion.

pub mod auth;
pub mod http;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as Json;

pub use auth::{
    ClientSecretCredential, CloudEnvironment, StaticTokenCredential, TokenCredential,
};
pub use http::HttpArmClient;

/// Errors returned by ARM calls
#[derive(Debug, thiserror::Error)]
pub enum ArmError {
    #[error("unexpected status {status} with error: {code}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("sending request: {0}")]
    Transport(String),

    #[error("decoding response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("obtaining access token: {0}")]
    Authentication(String),

    #[error("long running operation finished with status {status:?}: {message}")]
    OperationFailed { status: String, message: String },

    #[error("timed out waiting for the long running operation after {attempts} polls")]
    OperationTimedOut { attempts: u32 },
}

impl ArmError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for ArmError {
    fn from(e: reqwest::Error) -> Self {
        ArmError::Transport(e.to_string())
    }
}

pub type ArmResult<T> = Result<T, ArmError>;

/// Operations on ARM resources addressed by their resource ID
#[async_trait]
pub trait ArmClient: Send + Sync {
    /// GET a resource; `None` when Azure answers 404
    async fn get(&self, id: &str, api_version: &str) -> ArmResult<Option<Json>>;

    /// PUT a resource and wait for provisioning to finish
    async fn put(&self, id: &str, api_version: &str, body: &Json) -> ArmResult<Json>;

    /// DELETE a resource and wait for removal to finish
    async fn delete(&self, id: &str, api_version: &str) -> ArmResult<()>;

    /// POST to a resource action such as `listKeys`; `None` when Azure answers 404
    async fn action(&self, id: &str, action: &str, api_version: &str) -> ArmResult<Option<Json>>;
}

/// GET a resource and decode it into its model
pub async fn get_resource<T: DeserializeOwned>(
    client: &dyn ArmClient,
    id: &str,
    api_version: &str,
) -> ArmResult<Option<T>> {
    match client.get(id, api_version).await? {
        Some(body) => Ok(Some(serde_json::from_value(body)?)),
        None => Ok(None),
    }
}

/// POST a resource action and decode its response
pub async fn action_resource<T: DeserializeOwned>(
    client: &dyn ArmClient,
    id: &str,
    action: &str,
    api_version: &str,
) -> ArmResult<Option<T>> {
    match client.action(id, action, api_version).await? {
        Some(body) => Ok(Some(serde_json::from_value(body)?)),
        None => Ok(None),
    }
}

/// PUT a model and decode the provisioned resource
pub async fn put_resource<B: Serialize, T: DeserializeOwned>(
    client: &dyn ArmClient,
    id: &str,
    api_version: &str,
    body: &B,
) -> ArmResult<T> {
    let body = serde_json::to_value(body)?;
    let response = client.put(id, api_version, &body).await?;
    Ok(serde_json::from_value(response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::mock::MockArmClient;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Group {
        location: String,
    }

    #[test]
    fn not_found_is_status_404_only() {
        let err = ArmError::Status {
            status: 404,
            code: "ResourceNotFound".to_string(),
            message: "gone".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!ArmError::OperationTimedOut { attempts: 3 }.is_not_found());
    }

    #[tokio::test]
    async fn typed_helpers_round_trip_through_client() {
        let client = MockArmClient::new();
        let id = "/subscriptions/s/resourceGroups/rg";

        let missing: Option<Group> = get_resource(&client, id, "2020-06-01").await.unwrap();
        assert!(missing.is_none());

        let created: Group = put_resource(
            &client,
            id,
            "2020-06-01",
            &Group {
                location: "westeurope".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(created.location, "westeurope");

        let raw = client.get(id, "2020-06-01").await.unwrap().unwrap();
        assert_eq!(raw["id"], json!(id));
    }
}
