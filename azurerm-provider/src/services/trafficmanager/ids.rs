use std::fmt;
use std::str::FromStr;

use azurerm_core::arm_id::{
    ArmResourceId, ParsedArmId, ResourceIdError, check_segments, debug_assert_segments,
};
use azurerm_core::resource_id;

resource_id! {
    /// A Traffic Manager profile
    pub struct TrafficManagerProfileId {
        provider: "Microsoft.Network",
        segments: { name: "trafficManagerProfiles" }
    }
}

/// Kind of Traffic Manager endpoint; doubles as its ID segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointType {
    Azure,
    External,
    Nested,
}

impl EndpointType {
    pub const ALL: [EndpointType; 3] = [
        EndpointType::Azure,
        EndpointType::External,
        EndpointType::Nested,
    ];

    pub fn segment(&self) -> &'static str {
        match self {
            EndpointType::Azure => "azureEndpoints",
            EndpointType::External => "externalEndpoints",
            EndpointType::Nested => "nestedEndpoints",
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl FromStr for EndpointType {
    type Err = String;

    /// Accepts the bare segment or a full ARM type name
    /// ("Microsoft.Network/trafficManagerProfiles/externalEndpoints")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segment = s.rsplit('/').next().unwrap_or(s);
        EndpointType::ALL
            .into_iter()
            .find(|t| t.segment().eq_ignore_ascii_case(segment))
            .ok_or_else(|| format!("unknown endpoint type {:?}", s))
    }
}

/// A Traffic Manager endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrafficManagerEndpointId {
    pub subscription_id: String,
    pub resource_group: String,
    pub profile_name: String,
    pub endpoint_type: EndpointType,
    pub name: String,
}

impl TrafficManagerEndpointId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        profile_name: impl Into<String>,
        endpoint_type: EndpointType,
        name: impl Into<String>,
    ) -> Self {
        let id = Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            profile_name: profile_name.into(),
            endpoint_type,
            name: name.into(),
        };
        debug_assert_segments(&[
            id.subscription_id.as_str(),
            id.resource_group.as_str(),
            id.profile_name.as_str(),
            id.name.as_str(),
        ]);
        id
    }

    /// Like `new`, but rejects empty values and values containing '/'
    pub fn try_new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        profile_name: impl Into<String>,
        endpoint_type: EndpointType,
        name: impl Into<String>,
    ) -> Result<Self, ResourceIdError> {
        let id = Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            profile_name: profile_name.into(),
            endpoint_type,
            name: name.into(),
        };
        check_segments(&[
            ("subscriptions", id.subscription_id.as_str()),
            ("resourceGroups", id.resource_group.as_str()),
            ("trafficManagerProfiles", id.profile_name.as_str()),
            (endpoint_type.segment(), id.name.as_str()),
        ])?;
        Ok(id)
    }

    pub fn profile_id(&self) -> TrafficManagerProfileId {
        TrafficManagerProfileId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.profile_name,
        )
    }
}

impl ArmResourceId for TrafficManagerEndpointId {
    fn parse(input: &str) -> Result<Self, ResourceIdError> {
        let mut parsed = ParsedArmId::parse(input)?;
        let resource_group = parsed.require_resource_group()?;
        let profile_name = parsed.pop_segment("trafficManagerProfiles")?;

        let endpoint_type = EndpointType::ALL
            .into_iter()
            .find(|t| parsed.has_segment(t.segment()))
            .ok_or_else(|| ResourceIdError::Invalid {
                message: format!(
                    "ID was missing an endpoint type segment (azureEndpoints, externalEndpoints or nestedEndpoints): {:?}",
                    input
                ),
            })?;
        let name = parsed.pop_segment(endpoint_type.segment())?;
        parsed.validate_no_empty_segments(input)?;

        Ok(Self {
            subscription_id: parsed.subscription_id,
            resource_group,
            profile_name,
            endpoint_type,
            name,
        })
    }

    fn id(&self) -> String {
        format!(
            "{}/{}/{}",
            self.profile_id().id(),
            self.endpoint_type.segment(),
            self.name
        )
    }
}

impl FromStr for TrafficManagerEndpointId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ArmResourceId>::parse(s)
    }
}

impl fmt::Display for TrafficManagerEndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str =
        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/trafficManagerProfiles/p1";

    #[test]
    fn endpoint_id_round_trips_every_type() {
        for endpoint_type in EndpointType::ALL {
            let id = TrafficManagerEndpointId::new("sub", "rg", "p1", endpoint_type, "e1");
            assert_eq!(id.id(), format!("{}/{}/e1", PROFILE, endpoint_type.segment()));
            assert_eq!(TrafficManagerEndpointId::parse(&id.id()).unwrap(), id);
        }
    }

    #[test]
    fn endpoint_id_needs_type_segment() {
        assert!(TrafficManagerEndpointId::parse(PROFILE).is_err());
        assert!(TrafficManagerEndpointId::parse(&format!("{}/otherEndpoints/e1", PROFILE)).is_err());
        assert!(
            TrafficManagerEndpointId::parse(&format!("{}/externalendpoints/e1", PROFILE)).is_err()
        );
        assert!(
            TrafficManagerEndpointId::parse(&format!(
                "{}/externalEndpoints/e1/azureEndpoints/e2",
                PROFILE
            ))
            .is_err()
        );
    }

    #[test]
    fn profile_id_rejects_endpoint_path() {
        let id = TrafficManagerProfileId::parse(PROFILE).unwrap();
        assert_eq!(id.name, "p1");
        assert!(TrafficManagerProfileId::parse(&format!("{}/azureEndpoints/e1", PROFILE)).is_err());
    }

    #[test]
    fn endpoint_type_from_arm_type() {
        assert_eq!(
            "Microsoft.Network/trafficManagerProfiles/externalEndpoints"
                .parse::<EndpointType>()
                .unwrap(),
            EndpointType::External
        );
        assert_eq!("nestedEndpoints".parse::<EndpointType>().unwrap(), EndpointType::Nested);
        assert!("endpoints".parse::<EndpointType>().is_err());
    }
}
