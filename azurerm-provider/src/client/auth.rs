//! Azure authentication
//!
//! Bearer tokens for ARM come from a service principal's client secret
//! (through `azure_identity`) or from a token supplied up front.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use azure_core::auth::TokenCredential as _;
use log::debug;
use tokio::sync::RwLock;
use url::Url;

use super::{ArmError, ArmResult};

/// Refresh tokens this long before Azure considers them expired
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Sovereign cloud the provider talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudEnvironment {
    #[default]
    Public,
    China,
    UsGovernment,
}

impl CloudEnvironment {
    pub fn resource_manager_endpoint(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://management.azure.com",
            CloudEnvironment::China => "https://management.chinacloudapi.cn",
            CloudEnvironment::UsGovernment => "https://management.usgovcloudapi.net",
        }
    }

    pub fn authority_host(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://login.microsoftonline.com",
            CloudEnvironment::China => "https://login.chinacloudapi.cn",
            CloudEnvironment::UsGovernment => "https://login.microsoftonline.us",
        }
    }

    /// OAuth2 scope for the resource manager audience
    pub fn token_scope(&self) -> String {
        format!("{}/.default", self.resource_manager_endpoint())
    }
}

impl FromStr for CloudEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" | "azurecloud" => Ok(CloudEnvironment::Public),
            "china" | "azurechinacloud" => Ok(CloudEnvironment::China),
            "usgovernment" | "azureusgovernmentcloud" => Ok(CloudEnvironment::UsGovernment),
            other => Err(format!(
                "unknown environment {:?}, expected one of: public, china, usgovernment",
                other
            )),
        }
    }
}

/// Source of bearer tokens for ARM requests
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> ArmResult<String>;
}

/// A token obtained out of band (e.g., `az account get-access-token`)
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> ArmResult<String> {
        Ok(self.token.clone())
    }
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// Expiry with the buffer already applied
    expires_at: Instant,
}

impl CachedToken {
    fn new(token: String, expires_in: Duration, now: Instant) -> Self {
        Self {
            token,
            expires_at: now + expires_in.saturating_sub(TOKEN_EXPIRY_BUFFER),
        }
    }

    fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Seconds from now until `expires_on` (a Unix timestamp), zero when past
fn seconds_until(expires_on: i64) -> Duration {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Duration::from_secs(u64::try_from(expires_on).unwrap_or_default().saturating_sub(now))
}

/// Service principal authenticating with a client secret
///
/// Token acquisition is delegated to `azure_identity`; this wrapper pins the
/// resource manager scope of the cloud and keeps the token until shortly
/// before it expires.
pub struct ClientSecretCredential {
    inner: azure_identity::ClientSecretCredential,
    scope: String,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl ClientSecretCredential {
    pub fn new(
        environment: CloudEnvironment,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> ArmResult<Self> {
        let authority = Url::parse(environment.authority_host()).map_err(|e| {
            ArmError::Authentication(format!(
                "invalid authority host {:?}: {}",
                environment.authority_host(),
                e
            ))
        })?;
        let inner = azure_identity::ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority,
            tenant_id.into(),
            client_id.into(),
            client_secret.into(),
        );

        Ok(Self {
            inner,
            scope: environment.token_scope(),
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    async fn request_token(&self) -> ArmResult<CachedToken> {
        debug!("requesting token for {}", self.scope);
        let token = self
            .inner
            .get_token(&[self.scope.as_str()])
            .await
            .map_err(|e| ArmError::Authentication(e.to_string()))?;

        Ok(CachedToken::new(
            token.token.secret().to_string(),
            seconds_until(token.expires_on.unix_timestamp()),
            Instant::now(),
        ))
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> ArmResult<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid_at(Instant::now()) {
                    return Ok(cached.token.clone());
                }
                debug!("Cached token expired, requesting a new one");
            }
        }

        let fresh = self.request_token().await?;
        let token = fresh.token.clone();
        *self.token_cache.write().await = Some(fresh);

        Ok(token)
    }
}
