//! Provider configuration
//!
//! Credentials and subscription come from the `ARM_*` environment variables
//! unless the host passes them in explicitly.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{
    ClientSecretCredential, CloudEnvironment, HttpArmClient, StaticTokenCredential,
    TokenCredential,
};

pub const ENV_SUBSCRIPTION_ID: &str = "ARM_SUBSCRIPTION_ID";
pub const ENV_TENANT_ID: &str = "ARM_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "ARM_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ARM_CLIENT_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "ARM_ACCESS_TOKEN";
pub const ENV_ENVIRONMENT: &str = "ARM_ENVIRONMENT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("ARM_ENVIRONMENT: {0}")]
    UnknownEnvironment(String),

    #[error("building HTTP client: {0}")]
    HttpClient(String),

    #[error("building credential: {0}")]
    Credential(String),
}

/// Per-operation time limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(30 * 60),
            delete: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Pre-issued bearer token; takes precedence over the client secret
    pub access_token: Option<String>,
    pub environment: CloudEnvironment,
    pub timeouts: Timeouts,
}

impl ProviderConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let environment = match get(ENV_ENVIRONMENT) {
            Some(name) => name.parse::<CloudEnvironment>().map_err(ConfigError::UnknownEnvironment)?,
            None => CloudEnvironment::default(),
        };

        Ok(Self {
            subscription_id: get(ENV_SUBSCRIPTION_ID).unwrap_or_default(),
            tenant_id: get(ENV_TENANT_ID),
            client_id: get(ENV_CLIENT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            access_token: get(ENV_ACCESS_TOKEN),
            environment,
            timeouts: Timeouts::default(),
        })
    }

    /// Check that enough is set to authenticate
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subscription_id.is_empty() {
            return Err(ConfigError::Missing(ENV_SUBSCRIPTION_ID));
        }
        if self.access_token.is_some() {
            return Ok(());
        }
        if self.tenant_id.is_none() {
            return Err(ConfigError::Missing(ENV_TENANT_ID));
        }
        if self.client_id.is_none() {
            return Err(ConfigError::Missing(ENV_CLIENT_ID));
        }
        if self.client_secret.is_none() {
            return Err(ConfigError::Missing(ENV_CLIENT_SECRET));
        }
        Ok(())
    }

    fn credential(&self) -> Result<Arc<dyn TokenCredential>, ConfigError> {
        if let Some(token) = &self.access_token {
            return Ok(Arc::new(StaticTokenCredential::new(token.clone())));
        }
        match (&self.tenant_id, &self.client_id, &self.client_secret) {
            (Some(tenant), Some(client), Some(secret)) => {
                let credential =
                    ClientSecretCredential::new(self.environment, tenant, client, secret)
                        .map_err(|e| ConfigError::Credential(e.to_string()))?;
                Ok(Arc::new(credential))
            }
            (None, _, _) => Err(ConfigError::Missing(ENV_TENANT_ID)),
            (_, None, _) => Err(ConfigError::Missing(ENV_CLIENT_ID)),
            (_, _, None) => Err(ConfigError::Missing(ENV_CLIENT_SECRET)),
        }
    }

    /// Build the HTTP ARM client for this configuration
    pub fn build_client(&self) -> Result<HttpArmClient, ConfigError> {
        self.validate()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("azurerm-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let credential = self.credential()?;

        Ok(HttpArmClient::new(
            http,
            self.environment.resource_manager_endpoint(),
            credential,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_service_principal_from_env() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (ENV_SUBSCRIPTION_ID, "sub"),
            (ENV_TENANT_ID, "tenant"),
            (ENV_CLIENT_ID, "client"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_ENVIRONMENT, "china"),
        ]))
        .unwrap();

        assert_eq!(config.subscription_id, "sub");
        assert_eq!(config.environment, CloudEnvironment::China);
        assert!(config.validate().is_ok());
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn access_token_alone_is_enough() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (ENV_SUBSCRIPTION_ID, "sub"),
            (ENV_ACCESS_TOKEN, "token"),
        ]))
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_names_the_missing_variable() {
        let config = ProviderConfig::from_lookup(lookup(&[(ENV_SUBSCRIPTION_ID, "sub")])).unwrap();
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "ARM_TENANT_ID must be set"
        );

        let config = ProviderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "ARM_SUBSCRIPTION_ID must be set"
        );
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = ProviderConfig::from_lookup(lookup(&[(ENV_ENVIRONMENT, "mars")])).unwrap_err();
        assert!(err.to_string().starts_with("ARM_ENVIRONMENT:"));
    }

    #[test]
    fn default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.read, Duration::from_secs(300));
        assert_eq!(timeouts.create, Duration::from_secs(1800));
    }
}
