//! Azure services: typed IDs, validators and resource handlers

use std::fmt::Debug;

use azurerm_core::arm_id::{ArmResourceId, ResourceIdError};

pub mod containers;
pub mod ids;
pub mod media;
pub mod trafficmanager;

/// A typed ID parsed from its string form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedId {
    /// Canonical string form
    pub id: String,
    /// Pretty-printed fields
    pub fields: String,
}

type ParseFn = fn(&str) -> Result<ParsedId, ResourceIdError>;

fn describe<T: ArmResourceId + Debug>(input: &str) -> Result<ParsedId, ResourceIdError> {
    T::parse(input).map(|id| describe_id(&id))
}

fn describe_id<T: ArmResourceId + Debug>(id: &T) -> ParsedId {
    ParsedId {
        id: id.id(),
        fields: format!("{:#?}", id),
    }
}

// Container names are also checked against Azure's naming rules

fn managed_cluster(input: &str) -> Result<ParsedId, ResourceIdError> {
    containers::validate::managed_cluster_id(input).map(|id| describe_id(&id))
}

fn node_pool(input: &str) -> Result<ParsedId, ResourceIdError> {
    containers::validate::node_pool_id(input).map(|id| describe_id(&id))
}

fn container_registry(input: &str) -> Result<ParsedId, ResourceIdError> {
    containers::validate::container_registry_id(input).map(|id| describe_id(&id))
}

static ID_KINDS: &[(&str, ParseFn)] = &[
    ("container_group", describe::<containers::ids::ContainerGroupId>),
    ("container_registry", container_registry),
    ("content_key_policy", describe::<media::ids::ContentKeyPolicyId>),
    ("managed_cluster", managed_cluster),
    ("media_services_account", describe::<media::ids::MediaServicesAccountId>),
    ("node_pool", node_pool),
    ("resource_group", describe::<ids::ResourceGroupId>),
    ("storage_account", describe::<ids::StorageAccountId>),
    ("streaming_policy", describe::<media::ids::StreamingPolicyId>),
    ("traffic_manager_endpoint", describe::<trafficmanager::ids::TrafficManagerEndpointId>),
    ("traffic_manager_profile", describe::<trafficmanager::ids::TrafficManagerProfileId>),
    ("transform", describe::<media::ids::TransformId>),
    ("user_assigned_identity", describe::<ids::UserAssignedIdentityId>),
];

/// Names accepted by [`parse_id_kind`], sorted
pub fn id_kinds() -> impl Iterator<Item = &'static str> {
    ID_KINDS.iter().map(|(name, _)| *name)
}

/// Parse `input` as the ID kind `kind`; `None` for an unknown kind
pub fn parse_id_kind(kind: &str, input: &str) -> Option<Result<ParsedId, ResourceIdError>> {
    ID_KINDS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, parse)| parse(input))
}
