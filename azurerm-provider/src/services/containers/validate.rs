//! Name validators for container resources

use std::sync::LazyLock;

use azurerm_core::arm_id::{ArmResourceId, ResourceIdError};
use azurerm_core::resource::Value;
use azurerm_core::schema::AttributeType;
use azurerm_core::schema::types::string_matching;
use regex::Regex;

use super::ids::{ContainerRegistryId, ManagedClusterId, NodePoolId};

static CLUSTER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([-_a-zA-Z0-9]{0,61}[a-zA-Z0-9])?$").expect("valid regex")
});

static NODE_POOL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]{0,11}$").expect("valid regex"));

static REGISTRY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{5,50}$").expect("valid regex"));

pub fn kubernetes_cluster_name() -> AttributeType {
    string_matching(
        "KubernetesClusterName",
        &CLUSTER_NAME,
        "cluster name must be 1 - 63 characters long, start and end with a letter or number and contain only letters, numbers, hyphens and underscores",
    )
}

/// Node pool names are lowercase and at most 12 characters
pub fn node_pool_name() -> AttributeType {
    string_matching(
        "NodePoolName",
        &NODE_POOL_NAME,
        "node pool name must start with a lowercase letter, have max length of 12, and only have characters a-z0-9",
    )
}

pub fn container_registry_name() -> AttributeType {
    string_matching(
        "ContainerRegistryName",
        &REGISTRY_NAME,
        "alpha numeric characters only are allowed and between 5 and 50 characters",
    )
}

fn check_name(kind: AttributeType, name: &str) -> Result<(), ResourceIdError> {
    kind.validate(&Value::from(name))
        .map_err(|e| ResourceIdError::Invalid {
            message: e.to_string(),
        })
}

/// Parse a managed cluster ID whose name Azure would accept
pub fn managed_cluster_id(input: &str) -> Result<ManagedClusterId, ResourceIdError> {
    let id = ManagedClusterId::parse(input)?;
    check_name(kubernetes_cluster_name(), &id.name)?;
    Ok(id)
}

/// Parse a node pool ID, checking both the cluster and the pool name
pub fn node_pool_id(input: &str) -> Result<NodePoolId, ResourceIdError> {
    let id = NodePoolId::parse(input)?;
    check_name(kubernetes_cluster_name(), &id.cluster_name)?;
    check_name(node_pool_name(), &id.name)?;
    Ok(id)
}

pub fn container_registry_id(input: &str) -> Result<ContainerRegistryId, ResourceIdError> {
    let id = ContainerRegistryId::parse(input)?;
    check_name(container_registry_name(), &id.name)?;
    Ok(id)
}
