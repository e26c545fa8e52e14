//! Property-based round trips for every typed resource ID

use azurerm_core::arm_id::ArmResourceId;
use azurerm_provider::services::containers::ids::{
    ContainerGroupId, ContainerRegistryId, ManagedClusterId, NodePoolId,
};
use azurerm_provider::services::ids::{ResourceGroupId, StorageAccountId, UserAssignedIdentityId};
use azurerm_provider::services::media::ids::{
    ContentKeyPolicyId, MediaServicesAccountId, StreamingPolicyId, TransformId,
};
use azurerm_provider::services::trafficmanager::ids::{
    EndpointType, TrafficManagerEndpointId, TrafficManagerProfileId,
};
use proptest::prelude::*;

/// Any non-empty value without a path separator
const SEGMENT: &str = "[A-Za-z0-9._()-]{1,24}";

fn endpoint_type() -> impl Strategy<Value = EndpointType> {
    prop::sample::select(EndpointType::ALL.to_vec())
}

fn round_trips<T: ArmResourceId + PartialEq + std::fmt::Debug>(id: &T) -> Result<(), TestCaseError> {
    let parsed = T::parse(&id.id()).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(&parsed, id);
    prop_assert_eq!(parsed.id(), id.id());
    Ok(())
}

proptest! {
    #[test]
    fn resource_group_id_round_trips(sub in SEGMENT, rg in SEGMENT) {
        round_trips(&ResourceGroupId::new(sub, rg))?;
    }

    #[test]
    fn top_level_ids_round_trip(sub in SEGMENT, rg in SEGMENT, name in SEGMENT) {
        round_trips(&StorageAccountId::new(&sub, &rg, &name))?;
        round_trips(&UserAssignedIdentityId::new(&sub, &rg, &name))?;
        round_trips(&ManagedClusterId::new(&sub, &rg, &name))?;
        round_trips(&ContainerRegistryId::new(&sub, &rg, &name))?;
        round_trips(&ContainerGroupId::new(&sub, &rg, &name))?;
        round_trips(&MediaServicesAccountId::new(&sub, &rg, &name))?;
        round_trips(&TrafficManagerProfileId::new(&sub, &rg, &name))?;
    }

    #[test]
    fn child_ids_round_trip(sub in SEGMENT, rg in SEGMENT, parent in SEGMENT, name in SEGMENT) {
        round_trips(&NodePoolId::new(&sub, &rg, &parent, &name))?;
        round_trips(&TransformId::new(&sub, &rg, &parent, &name))?;
        round_trips(&StreamingPolicyId::new(&sub, &rg, &parent, &name))?;
        round_trips(&ContentKeyPolicyId::new(&sub, &rg, &parent, &name))?;
    }

    #[test]
    fn traffic_manager_endpoint_id_round_trips(
        sub in SEGMENT,
        rg in SEGMENT,
        profile in SEGMENT,
        kind in endpoint_type(),
        name in SEGMENT,
    ) {
        let id = TrafficManagerEndpointId::new(&sub, &rg, &profile, kind, &name);
        round_trips(&id)?;
        prop_assert_eq!(id.profile_id(), TrafficManagerProfileId::new(sub, rg, profile));
    }

    #[test]
    fn child_ids_are_not_parents(sub in SEGMENT, rg in SEGMENT, parent in SEGMENT, name in SEGMENT) {
        let pool = NodePoolId::new(&sub, &rg, &parent, &name);
        prop_assert!(ManagedClusterId::parse(&pool.id()).is_err());
        prop_assert!(ResourceGroupId::parse(&pool.id()).is_err());
    }
}
