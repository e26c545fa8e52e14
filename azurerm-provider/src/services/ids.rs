//! Resource IDs shared across services

use std::fmt;
use std::str::FromStr;

use azurerm_core::arm_id::{ArmResourceId, ParsedArmId, ResourceIdError, debug_assert_segments};
use azurerm_core::resource_id;

/// A resource group: `/subscriptions/{s}/resourceGroups/{rg}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceGroupId {
    pub subscription_id: String,
    pub resource_group: String,
}

impl ResourceGroupId {
    pub fn new(subscription_id: impl Into<String>, resource_group: impl Into<String>) -> Self {
        let id = Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
        };
        debug_assert_segments(&[id.subscription_id.as_str(), id.resource_group.as_str()]);
        id
    }
}

impl ArmResourceId for ResourceGroupId {
    fn parse(input: &str) -> Result<Self, ResourceIdError> {
        let parsed = ParsedArmId::parse(input)?;
        let resource_group = parsed.require_resource_group()?;
        if !parsed.provider.is_empty() {
            return Err(ResourceIdError::UnexpectedSegments {
                input: input.to_string(),
            });
        }
        parsed.validate_no_empty_segments(input)?;

        Ok(Self {
            subscription_id: parsed.subscription_id,
            resource_group,
        })
    }

    fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )
    }
}

impl FromStr for ResourceGroupId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ArmResourceId>::parse(s)
    }
}

impl fmt::Display for ResourceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

resource_id! {
    /// A storage account
    pub struct StorageAccountId {
        provider: "Microsoft.Storage",
        segments: { name: "storageAccounts" }
    }
}

resource_id! {
    /// A user-assigned managed identity
    pub struct UserAssignedIdentityId {
        provider: "Microsoft.ManagedIdentity",
        segments: { name: "userAssignedIdentities" }
    }
}
