//! azurerm_traffic_manager_endpoint

use async_trait::async_trait;
use azurerm_core::arm_id::ArmResourceId;
use azurerm_core::attrs::{self, AttributesBuilder};
use azurerm_core::provider::{ProviderError, ProviderResult};
use azurerm_core::resource::{Attributes, ResourceAddress, State, Value};
use azurerm_core::schema::types::{self, normalize_location};
use azurerm_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema};
use log::{debug, info, warn};

use super::ids::{EndpointType, TrafficManagerEndpointId};
use super::models::{Endpoint, EndpointProperties, EndpointSubnet};
use super::profile::{custom_header_block, expand_custom_headers, flatten_custom_headers};
use super::validate;
use crate::client::{get_resource, put_resource};
use crate::resources::{ProviderContext, ResourceHandler};
use crate::utils::{parse_id, remote_error, require_absent, required_string};

const API_VERSION: &str = "2018-08-01";

pub struct TrafficManagerEndpoint;

fn schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_traffic_manager_endpoint")
        .with_description("Endpoint of a Traffic Manager profile")
        .attribute(
            AttributeSchema::new("name", types::segment_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", types::resource_group_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("profile_name", types::segment_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new(
                "type",
                types::one_of(&["azureEndpoints", "externalEndpoints", "nestedEndpoints"]),
            )
            .required()
            .force_new(),
        )
        .attribute(AttributeSchema::new("target", types::non_empty_string()))
        .attribute(AttributeSchema::new("target_resource_id", validate::resource_id()))
        .attribute(
            AttributeSchema::new("endpoint_status", types::one_of(&["Enabled", "Disabled"]))
                .with_default("Enabled"),
        )
        .attribute(AttributeSchema::new("weight", types::int_between(1, 1000)))
        .attribute(AttributeSchema::new("priority", types::int_between(1, 1000)))
        .attribute(
            AttributeSchema::new("endpoint_location", types::location())
                .normalized(normalize_location),
        )
        .attribute(AttributeSchema::new("min_child_endpoints", types::int_at_least(1)))
        .attribute(AttributeSchema::new("geo_mappings", types::string_list()))
        .attribute(AttributeSchema::new("custom_header", custom_header_block()))
        .attribute(AttributeSchema::new(
            "subnet",
            BlockSchema::new()
                .attribute(AttributeSchema::new("first", types::non_empty_string()).required())
                .attribute(AttributeSchema::new("last", AttributeType::String))
                .attribute(AttributeSchema::new("scope", types::int_between(0, 32)))
                .into_type(),
        ))
        .attribute(AttributeSchema::new("endpoint_monitor_status", AttributeType::String).computed())
}

fn validate_attributes(attributes: &Attributes) -> Vec<String> {
    let Some(endpoint_type) = attrs::string(attributes, "type")
        .and_then(|t| t.parse::<EndpointType>().ok())
    else {
        // the schema reports unknown types
        return Vec::new();
    };

    let mut errors = Vec::new();
    let has_target = attrs::non_empty_string(attributes, "target").is_some();
    let has_target_resource = attrs::non_empty_string(attributes, "target_resource_id").is_some();

    match endpoint_type {
        EndpointType::External if !has_target => {
            errors.push("`target` must be specified for `externalEndpoints`".to_string())
        }
        EndpointType::Azure | EndpointType::Nested if !has_target_resource => errors.push(
            format!("`target_resource_id` must be specified for `{}`", endpoint_type),
        ),
        _ => {}
    }

    if endpoint_type != EndpointType::Nested && attributes.contains_key("min_child_endpoints") {
        errors.push(
            "`min_child_endpoints` can only be specified for `nestedEndpoints`".to_string(),
        );
    }

    errors
}

// =============================================================================
// Expand / Flatten
// =============================================================================

fn expand_subnets(attributes: &Attributes) -> Option<Vec<EndpointSubnet>> {
    attributes.contains_key("subnet").then(|| {
        attrs::blocks(attributes, "subnet")
            .into_iter()
            .map(|block| EndpointSubnet {
                first: attrs::string(block, "first").unwrap_or_default().to_string(),
                last: attrs::non_empty_string(block, "last").map(str::to_string),
                scope: attrs::int(block, "scope"),
            })
            .collect()
    })
}

fn flatten_subnets(subnets: Option<&Vec<EndpointSubnet>>) -> Value {
    Value::blocks(
        subnets
            .into_iter()
            .flatten()
            .map(|subnet| {
                AttributesBuilder::new()
                    .set("first", subnet.first.as_str())
                    .set("last", subnet.last.clone().unwrap_or_default())
                    .set_opt("scope", subnet.scope)
                    .build()
            })
            .collect(),
    )
}

fn expand(endpoint_type: EndpointType, attributes: &Attributes) -> Endpoint {
    Endpoint {
        endpoint_type: Some(format!(
            "Microsoft.Network/trafficManagerProfiles/{}",
            endpoint_type.segment()
        )),
        properties: EndpointProperties {
            target_resource_id: attrs::non_empty_string(attributes, "target_resource_id")
                .map(str::to_string),
            target: attrs::non_empty_string(attributes, "target").map(str::to_string),
            endpoint_status: attrs::string(attributes, "endpoint_status").map(str::to_string),
            weight: attrs::int(attributes, "weight"),
            priority: attrs::int(attributes, "priority"),
            endpoint_location: attrs::non_empty_string(attributes, "endpoint_location")
                .map(normalize_location),
            endpoint_monitor_status: None,
            min_child_endpoints: attrs::int(attributes, "min_child_endpoints"),
            // order is significant to the API
            geo_mapping: attributes
                .contains_key("geo_mappings")
                .then(|| attrs::string_list(attributes, "geo_mappings")),
            subnets: expand_subnets(attributes),
            custom_headers: expand_custom_headers(attributes),
        },
    }
}

fn flatten(id: &TrafficManagerEndpointId, model: &Endpoint) -> Attributes {
    let endpoint_type = model
        .endpoint_type
        .as_deref()
        .and_then(|t| match t.parse::<EndpointType>() {
            Ok(endpoint_type) => Some(endpoint_type),
            Err(e) => {
                warn!("{}: {} - falling back to the resource ID", id, e);
                None
            }
        })
        .unwrap_or(id.endpoint_type);
    let props = &model.properties;

    AttributesBuilder::new()
        .set("name", id.name.as_str())
        .set("resource_group_name", id.resource_group.as_str())
        .set("profile_name", id.profile_name.as_str())
        .set("type", endpoint_type.segment())
        .set_opt("target", props.target.clone())
        .set_opt("target_resource_id", props.target_resource_id.clone())
        .set_opt("endpoint_status", props.endpoint_status.clone())
        .set_opt("weight", props.weight)
        .set_opt("priority", props.priority)
        .set_opt(
            "endpoint_location",
            props.endpoint_location.as_deref().map(normalize_location),
        )
        .set_opt("min_child_endpoints", props.min_child_endpoints)
        .set(
            "geo_mappings",
            Value::string_list(props.geo_mapping.iter().flatten().cloned()),
        )
        .set("custom_header", flatten_custom_headers(props.custom_headers.as_ref()))
        .set("subnet", flatten_subnets(props.subnets.as_ref()))
        .set_opt("endpoint_monitor_status", props.endpoint_monitor_status.clone())
        .build()
}

// =============================================================================
// CRUD
// =============================================================================

fn id_from_attributes(
    ctx: &ProviderContext,
    attributes: &Attributes,
) -> ProviderResult<TrafficManagerEndpointId> {
    let endpoint_type: EndpointType = required_string(attributes, "type")?
        .parse()
        .map_err(ProviderError::validation)?;
    TrafficManagerEndpointId::try_new(
        &ctx.subscription_id,
        required_string(attributes, "resource_group_name")?,
        required_string(attributes, "profile_name")?,
        endpoint_type,
        required_string(attributes, "name")?,
    )
    .map_err(|e| ProviderError::validation("building resource ID").with_cause(e))
}

impl TrafficManagerEndpoint {
    async fn read_id(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        id: &TrafficManagerEndpointId,
    ) -> ProviderResult<State> {
        let model: Option<Endpoint> = get_resource(ctx.client.as_ref(), &id.id(), API_VERSION)
            .await
            .map_err(|e| remote_error(address, "retrieving", id, e))?;

        match model {
            Some(model) => {
                Ok(State::existing(address.clone(), flatten(id, &model)).with_identifier(id.id()))
            }
            None => {
                info!("{} was not found - removing from state", id);
                Ok(State::not_found(address.clone()))
            }
        }
    }

    async fn put(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        id: &TrafficManagerEndpointId,
        attributes: &Attributes,
        action: &str,
    ) -> ProviderResult<State> {
        debug!("{} {}", action, id);
        let _: Endpoint =
            put_resource(
                ctx.client.as_ref(),
                &id.id(),
                API_VERSION,
                &expand(id.endpoint_type, attributes),
            )
                .await
                .map_err(|e| remote_error(address, action, id, e))?;
        self.read_id(ctx, address, id).await
    }
}

#[async_trait]
impl ResourceHandler for TrafficManagerEndpoint {
    fn type_name(&self) -> &'static str {
        "azurerm_traffic_manager_endpoint"
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    fn validate(&self, attributes: &Attributes) -> Vec<String> {
        validate_attributes(attributes)
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        attributes: &Attributes,
    ) -> ProviderResult<State> {
        let id = id_from_attributes(ctx, attributes).map_err(|e| e.for_resource(address.clone()))?;
        require_absent(ctx.client.as_ref(), address, &id, API_VERSION).await?;
        self.put(ctx, address, &id, attributes, "creating").await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<State> {
        let id: TrafficManagerEndpointId = parse_id(address, identifier)?;
        self.read_id(ctx, address, &id).await
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
        attributes: &Attributes,
    ) -> ProviderResult<State> {
        let id: TrafficManagerEndpointId = parse_id(address, identifier)?;
        self.put(ctx, address, &id, attributes, "updating").await
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id: TrafficManagerEndpointId = parse_id(address, identifier)?;
        ctx.client
            .delete(&id.id(), API_VERSION)
            .await
            .map_err(|e| remote_error(address, "deleting", &id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockArmClient;
    use azurerm_core::provider::ErrorKind;
    use serde_json::json;
    use std::sync::Arc;

    const PUBLIC_IP: &str =
        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/publicIPAddresses/ip1";

    fn address() -> ResourceAddress {
        ResourceAddress::new("azurerm_traffic_manager_endpoint", "example")
    }

    fn external() -> Attributes {
        AttributesBuilder::new()
            .set("name", "endpoint1")
            .set("resource_group_name", "rg")
            .set("profile_name", "tm-example")
            .set("type", "externalEndpoints")
            .set("target", "terraform.io")
            .set("weight", 3)
            .build()
    }

    fn prepared(mut attributes: Attributes) -> Attributes {
        schema().apply_defaults(&mut attributes);
        attributes
    }

    #[test]
    fn external_endpoint_is_valid() {
        let attributes = prepared(external());
        assert!(schema().validate(&attributes).is_ok());
        assert!(validate_attributes(&attributes).is_empty());
        assert_eq!(attributes["endpoint_status"], Value::from("Enabled"));
    }

    #[test]
    fn schema_checks_ranges() {
        let mut attributes = prepared(external());
        attributes.insert("weight".to_string(), Value::Int(1001));
        assert!(schema().validate(&attributes).is_err());

        let mut attributes = prepared(external());
        attributes.insert("type".to_string(), Value::from("internalEndpoints"));
        assert!(schema().validate(&attributes).is_err());
        assert!(validate_attributes(&attributes).is_empty());
    }

    #[test]
    fn target_requirements_follow_type() {
        let mut attributes = external();
        attributes.remove("target");
        assert_eq!(validate_attributes(&attributes).len(), 1);

        attributes.insert("type".to_string(), Value::from("azureEndpoints"));
        let errors = validate_attributes(&attributes);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("target_resource_id"));

        attributes.insert("target_resource_id".to_string(), Value::from(PUBLIC_IP));
        assert!(validate_attributes(&attributes).is_empty());
    }

    #[test]
    fn min_child_endpoints_only_for_nested() {
        let mut attributes = external();
        attributes.insert("min_child_endpoints".to_string(), Value::Int(1));
        assert_eq!(validate_attributes(&attributes).len(), 1);

        attributes.insert("type".to_string(), Value::from("nestedEndpoints"));
        attributes.insert("target_resource_id".to_string(), Value::from(PUBLIC_IP));
        assert!(validate_attributes(&attributes).is_empty());
    }

    #[test]
    fn expand_keeps_geo_mapping_order_and_subnets() {
        let mut attributes = external();
        attributes.insert(
            "geo_mappings".to_string(),
            Value::string_list(["GB", "FR", "DE"]),
        );
        attributes.insert(
            "subnet".to_string(),
            Value::blocks(vec![
                AttributesBuilder::new()
                    .set("first", "1.1.1.1")
                    .set("last", "2.2.2.2")
                    .build(),
                AttributesBuilder::new()
                    .set("first", "11.11.11.0")
                    .set("scope", 24)
                    .build(),
            ]),
        );

        let body = serde_json::to_value(expand(EndpointType::External, &attributes)).unwrap();
        let props = &body["properties"];
        assert_eq!(props["geoMapping"], json!(["GB", "FR", "DE"]));
        assert_eq!(
            props["subnets"],
            json!([
                {"first": "1.1.1.1", "last": "2.2.2.2"},
                {"first": "11.11.11.0", "scope": 24}
            ])
        );
        assert_eq!(
            body["type"],
            json!("Microsoft.Network/trafficManagerProfiles/externalEndpoints")
        );
    }

    #[test]
    fn flatten_prefers_api_type() {
        let id = TrafficManagerEndpointId::new("sub", "rg", "tm", EndpointType::External, "e1");
        let model: Endpoint = serde_json::from_value(json!({
            "type": "Microsoft.Network/trafficManagerProfiles/azureEndpoints",
            "properties": {"targetResourceId": PUBLIC_IP, "endpointLocation": "West Europe"}
        }))
        .unwrap();
        let attributes = flatten(&id, &model);
        assert_eq!(attributes["type"], Value::from("azureEndpoints"));
        assert_eq!(attributes["endpoint_location"], Value::from("westeurope"));

        let attributes = flatten(&id, &Endpoint::default());
        assert_eq!(attributes["type"], Value::from("externalEndpoints"));
    }

    #[tokio::test]
    async fn create_read_delete() {
        let client = Arc::new(MockArmClient::new());
        let ctx = ProviderContext::new("sub", client.clone());
        let handler = TrafficManagerEndpoint;

        let state = handler
            .create(&ctx, &address(), &prepared(external()))
            .await
            .unwrap();
        let expected = TrafficManagerEndpointId::new(
            "sub",
            "rg",
            "tm-example",
            EndpointType::External,
            "endpoint1",
        );
        assert_eq!(state.identifier.as_deref(), Some(expected.id().as_str()));
        assert_eq!(state.attributes["type"], Value::from("externalEndpoints"));
        assert_eq!(state.attributes["weight"], Value::Int(3));
        let body = client.last_put(&expected.id()).unwrap();
        assert_eq!(
            body["type"],
            json!("Microsoft.Network/trafficManagerProfiles/externalEndpoints")
        );

        let err = handler
            .create(&ctx, &address(), &prepared(external()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);

        handler.delete(&ctx, &address(), &expected.id()).await.unwrap();
        let state = handler.read(&ctx, &address(), &expected.id()).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn update_failure_names_the_endpoint() {
        let client = Arc::new(MockArmClient::new());
        let ctx = ProviderContext::new("sub", client.clone());
        let handler = TrafficManagerEndpoint;
        let state = handler
            .create(&ctx, &address(), &prepared(external()))
            .await
            .unwrap();
        let identifier = state.identifier.unwrap();

        client.fail_next_put(409, "Conflict");
        let err = handler
            .update(&ctx, &address(), &identifier, &prepared(external()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Remote);
        assert!(err.message.starts_with(&format!("updating {}", identifier)));
    }
}
