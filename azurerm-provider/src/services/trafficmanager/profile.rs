//! azurerm_traffic_manager_profile

use async_trait::async_trait;
use azurerm_core::arm_id::ArmResourceId;
use azurerm_core::attrs::{self, AttributesBuilder};
use azurerm_core::provider::ProviderResult;
use azurerm_core::resource::{Attributes, ResourceAddress, State, Value};
use azurerm_core::schema::types;
use azurerm_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema};
use log::{debug, info};

use super::ids::TrafficManagerProfileId;
use super::models::{
    CustomHeader, DnsConfig, MonitorConfig, Profile, ProfileProperties, StatusCodeRange,
};
use super::validate;
use crate::client::{get_resource, put_resource};
use crate::resources::{ProviderContext, ResourceHandler};
use crate::utils::{
    expand_tags, flatten_tags, invalid_id, parse_id, remote_error, require_absent,
    required_string,
};

const API_VERSION: &str = "2018-08-01";

/// Traffic Manager profiles are not regional
const LOCATION: &str = "global";

const ROUTING_METHODS: &[&str] = &[
    "Geographic",
    "Weighted",
    "Performance",
    "Priority",
    "Subnet",
    "MultiValue",
];

pub struct TrafficManagerProfile;

// =============================================================================
// Schema
// =============================================================================

pub(super) fn custom_header_block() -> AttributeType {
    BlockSchema::new()
        .attribute(AttributeSchema::new("name", types::segment_name()).required())
        .attribute(AttributeSchema::new("value", types::non_empty_string()).required())
        .into_type()
}

fn monitor_config_block() -> AttributeType {
    BlockSchema::new()
        .attribute(
            AttributeSchema::new(
                "protocol",
                types::one_of_ignore_case("MonitorProtocol", &["HTTP", "HTTPS", "TCP"]),
            )
            .required()
            .normalized(str::to_uppercase),
        )
        .attribute(AttributeSchema::new("port", types::int_between(1, 65535)).required())
        .attribute(AttributeSchema::new("path", AttributeType::String))
        .attribute(AttributeSchema::new(
            "expected_status_code_ranges",
            AttributeType::List(Box::new(validate::status_code_range())),
        ))
        .attribute(AttributeSchema::new("custom_header", custom_header_block()))
        .attribute(
            AttributeSchema::new("interval_in_seconds", validate::monitor_interval())
                .with_default(30),
        )
        .attribute(
            AttributeSchema::new("timeout_in_seconds", types::int_between(5, 10))
                .with_default(10),
        )
        .attribute(
            AttributeSchema::new("tolerated_number_of_failures", types::int_between(0, 9))
                .with_default(3),
        )
        .min_items(1)
        .max_items(1)
        .into_type()
}

fn schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_traffic_manager_profile")
        .with_description("Traffic Manager profile")
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
            AttributeSchema::new("profile_status", types::one_of(&["Enabled", "Disabled"]))
                .with_default("Enabled"),
        )
        .attribute(
            AttributeSchema::new("traffic_routing_method", types::one_of(ROUTING_METHODS))
                .required(),
        )
        .attribute(
            AttributeSchema::new(
                "dns_config",
                BlockSchema::new()
                    .attribute(
                        AttributeSchema::new("relative_name", types::non_empty_string())
                            .required()
                            .force_new(),
                    )
                    .attribute(
                        AttributeSchema::new("ttl", types::int_between(0, 2147483647)).required(),
                    )
                    .min_items(1)
                    .max_items(1)
                    .into_type(),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("monitor_config", monitor_config_block()).required())
        .attribute(AttributeSchema::new("fqdn", AttributeType::String).computed())
        .attribute(AttributeSchema::new("traffic_view_enabled", AttributeType::Bool))
        .attribute(AttributeSchema::new("max_return", types::int_between(1, 8)))
        .attribute(AttributeSchema::new("tags", types::tags()))
}

fn validate_attributes(attributes: &Attributes) -> Vec<String> {
    let mut errors = Vec::new();

    let multi_value = attrs::string(attributes, "traffic_routing_method") == Some("MultiValue");
    match (multi_value, attrs::int(attributes, "max_return")) {
        (true, None) => errors.push(
            "`max_return` must be specified when `traffic_routing_method` is `MultiValue`"
                .to_string(),
        ),
        (false, Some(_)) => errors.push(
            "`max_return` can only be specified when `traffic_routing_method` is `MultiValue`"
                .to_string(),
        ),
        _ => {}
    }

    if let Some(monitor) = attrs::block(attributes, "monitor_config") {
        let interval = attrs::int(monitor, "interval_in_seconds").unwrap_or(30);
        let timeout = attrs::int(monitor, "timeout_in_seconds").unwrap_or(10);
        if interval == 10 && !(5..=9).contains(&timeout) {
            errors.push(format!(
                "`timeout_in_seconds` must be between 5 and 9 when `interval_in_seconds` is 10, got {}",
                timeout
            ));
        }

        let protocol = attrs::string(monitor, "protocol").unwrap_or_default();
        let has_path = attrs::non_empty_string(monitor, "path").is_some();
        if protocol.eq_ignore_ascii_case("TCP") {
            if has_path {
                errors.push("`path` must not be set when `protocol` is `TCP`".to_string());
            }
        } else if !has_path {
            errors.push(format!("`path` must be set when `protocol` is `{}`", protocol));
        }
    }

    errors
}

// =============================================================================
// Expand / Flatten
// =============================================================================

pub(super) fn expand_custom_headers(block: &Attributes) -> Option<Vec<CustomHeader>> {
    block.contains_key("custom_header").then(|| {
        attrs::blocks(block, "custom_header")
            .into_iter()
            .map(|header| CustomHeader {
                name: attrs::string(header, "name").unwrap_or_default().to_string(),
                value: attrs::string(header, "value").unwrap_or_default().to_string(),
            })
            .collect()
    })
}

pub(super) fn flatten_custom_headers(headers: Option<&Vec<CustomHeader>>) -> Value {
    Value::blocks(
        headers
            .into_iter()
            .flatten()
            .map(|header| {
                AttributesBuilder::new()
                    .set("name", header.name.as_str())
                    .set("value", header.value.as_str())
                    .build()
            })
            .collect(),
    )
}

fn expand_monitor_config(attributes: &Attributes) -> Option<MonitorConfig> {
    let block = attrs::block(attributes, "monitor_config")?;
    let ranges: Vec<StatusCodeRange> = attrs::string_list(block, "expected_status_code_ranges")
        .iter()
        .filter_map(|range| validate::parse_status_code_range(range))
        .map(|(min, max)| StatusCodeRange { min, max })
        .collect();

    Some(MonitorConfig {
        protocol: attrs::string(block, "protocol").map(str::to_ascii_uppercase),
        port: attrs::int(block, "port"),
        path: attrs::non_empty_string(block, "path").map(str::to_string),
        interval_in_seconds: attrs::int(block, "interval_in_seconds"),
        timeout_in_seconds: attrs::int(block, "timeout_in_seconds"),
        tolerated_number_of_failures: attrs::int(block, "tolerated_number_of_failures"),
        custom_headers: expand_custom_headers(block),
        expected_status_code_ranges: (!ranges.is_empty()).then_some(ranges),
    })
}

fn flatten_monitor_config(config: Option<&MonitorConfig>) -> Value {
    let Some(config) = config else {
        return Value::List(vec![]);
    };
    let ranges = config
        .expected_status_code_ranges
        .iter()
        .flatten()
        .map(|range| format!("{}-{}", range.min, range.max));

    Value::block(
        AttributesBuilder::new()
            .set_opt("protocol", config.protocol.clone())
            .set_opt("port", config.port)
            .set("path", config.path.clone().unwrap_or_default())
            .set("expected_status_code_ranges", Value::string_list(ranges))
            .set("custom_header", flatten_custom_headers(config.custom_headers.as_ref()))
            .set_opt("interval_in_seconds", config.interval_in_seconds)
            .set_opt("timeout_in_seconds", config.timeout_in_seconds)
            .set_opt(
                "tolerated_number_of_failures",
                config.tolerated_number_of_failures,
            )
            .build(),
    )
}

fn expand(attributes: &Attributes) -> Profile {
    let dns_config = attrs::block(attributes, "dns_config").map(|block| DnsConfig {
        relative_name: attrs::string(block, "relative_name")
            .unwrap_or_default()
            .to_string(),
        ttl: attrs::int(block, "ttl"),
        fqdn: None,
    });
    let traffic_view = attrs::bool(attributes, "traffic_view_enabled")
        .map(|enabled| String::from(if enabled { "Enabled" } else { "Disabled" }));

    Profile {
        location: LOCATION.to_string(),
        tags: expand_tags(attributes),
        properties: ProfileProperties {
            profile_status: attrs::string(attributes, "profile_status").map(str::to_string),
            traffic_routing_method: attrs::string(attributes, "traffic_routing_method")
                .map(str::to_string),
            dns_config,
            monitor_config: expand_monitor_config(attributes),
            traffic_view_enrollment_status: traffic_view,
            max_return: attrs::int(attributes, "max_return"),
        },
    }
}

fn flatten(id: &TrafficManagerProfileId, model: &Profile) -> Attributes {
    let props = &model.properties;
    let dns_config = match &props.dns_config {
        Some(dns) => Value::block(
            AttributesBuilder::new()
                .set("relative_name", dns.relative_name.as_str())
                .set_opt("ttl", dns.ttl)
                .build(),
        ),
        None => Value::List(vec![]),
    };

    AttributesBuilder::new()
        .set("name", id.name.as_str())
        .set("resource_group_name", id.resource_group.as_str())
        .set_opt("profile_status", props.profile_status.clone())
        .set_opt("traffic_routing_method", props.traffic_routing_method.clone())
        .set("dns_config", dns_config)
        .set(
            "monitor_config",
            flatten_monitor_config(props.monitor_config.as_ref()),
        )
        .set_opt(
            "fqdn",
            props.dns_config.as_ref().and_then(|dns| dns.fqdn.clone()),
        )
        .set(
            "traffic_view_enabled",
            props
                .traffic_view_enrollment_status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("Enabled")),
        )
        .set_opt("max_return", props.max_return)
        .set("tags", flatten_tags(model.tags.as_ref()))
        .build()
}

// =============================================================================
// CRUD
// =============================================================================

impl TrafficManagerProfile {
    async fn read_id(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        id: &TrafficManagerProfileId,
    ) -> ProviderResult<State> {
        let model: Option<Profile> = get_resource(ctx.client.as_ref(), &id.id(), API_VERSION)
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
        id: &TrafficManagerProfileId,
        attributes: &Attributes,
        action: &str,
    ) -> ProviderResult<State> {
        debug!("{} {}", action, id);
        let _: Profile =
            put_resource(ctx.client.as_ref(), &id.id(), API_VERSION, &expand(attributes))
                .await
                .map_err(|e| remote_error(address, action, id, e))?;
        self.read_id(ctx, address, id).await
    }
}

#[async_trait]
impl ResourceHandler for TrafficManagerProfile {
    fn type_name(&self) -> &'static str {
        "azurerm_traffic_manager_profile"
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
        let id = TrafficManagerProfileId::try_new(
            &ctx.subscription_id,
            required_string(attributes, "resource_group_name")?,
            required_string(attributes, "name")?,
        )
        .map_err(|e| invalid_id(address, e))?;
        require_absent(ctx.client.as_ref(), address, &id, API_VERSION).await?;
        self.put(ctx, address, &id, attributes, "creating").await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<State> {
        let id: TrafficManagerProfileId = parse_id(address, identifier)?;
        self.read_id(ctx, address, &id).await
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
        attributes: &Attributes,
    ) -> ProviderResult<State> {
        let id: TrafficManagerProfileId = parse_id(address, identifier)?;
        self.put(ctx, address, &id, attributes, "updating").await
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id: TrafficManagerProfileId = parse_id(address, identifier)?;
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
    use serde_json::json;
    use std::sync::Arc;

    fn address() -> ResourceAddress {
        ResourceAddress::new("azurerm_traffic_manager_profile", "example")
    }

    fn monitor(protocol: &str, path: Option<&str>) -> Attributes {
        AttributesBuilder::new()
            .set("protocol", protocol)
            .set("port", 443)
            .set_opt("path", path)
            .build()
    }

    fn config() -> Attributes {
        AttributesBuilder::new()
            .set("name", "tm-example")
            .set("resource_group_name", "rg")
            .set("traffic_routing_method", "Weighted")
            .set(
                "dns_config",
                Value::block(
                    AttributesBuilder::new()
                        .set("relative_name", "tm-example")
                        .set("ttl", 30)
                        .build(),
                ),
            )
            .set("monitor_config", Value::block(monitor("https", Some("/health"))))
            .build()
    }

    fn prepared(mut attributes: Attributes) -> Attributes {
        schema().apply_defaults(&mut attributes);
        attributes
    }

    fn set_monitor(attributes: &mut Attributes, monitor: Attributes) {
        attributes.insert("monitor_config".to_string(), Value::block(monitor));
    }

    #[test]
    fn defaults_and_schema() {
        let attributes = prepared(config());
        assert!(schema().validate(&attributes).is_ok());
        assert!(validate_attributes(&attributes).is_empty());
        assert_eq!(attributes["profile_status"], Value::from("Enabled"));

        let monitor = attrs::block(&attributes, "monitor_config").unwrap();
        assert_eq!(monitor["interval_in_seconds"], Value::Int(30));
        assert_eq!(monitor["timeout_in_seconds"], Value::Int(10));
        assert_eq!(monitor["tolerated_number_of_failures"], Value::Int(3));
    }

    #[test]
    fn schema_rejects_out_of_range_values() {
        let mut attributes = prepared(config());
        attributes.insert("traffic_routing_method".to_string(), Value::from("RoundRobin"));
        assert!(schema().validate(&attributes).is_err());

        let mut attributes = prepared(config());
        let mut monitor = monitor("HTTP", Some("/"));
        monitor.insert("interval_in_seconds".to_string(), Value::Int(20));
        monitor.insert(
            "expected_status_code_ranges".to_string(),
            Value::string_list(["200"]),
        );
        set_monitor(&mut attributes, monitor);
        assert!(schema().validate(&attributes).is_err());
    }

    #[test]
    fn max_return_follows_routing_method() {
        let mut attributes = prepared(config());
        attributes.insert("max_return".to_string(), Value::Int(2));
        assert_eq!(validate_attributes(&attributes).len(), 1);

        attributes.insert("traffic_routing_method".to_string(), Value::from("MultiValue"));
        assert!(validate_attributes(&attributes).is_empty());

        attributes.remove("max_return");
        assert_eq!(validate_attributes(&attributes).len(), 1);
    }

    #[test]
    fn fast_probing_needs_short_timeout() {
        let mut attributes = config();
        let mut fast = monitor("HTTP", Some("/"));
        fast.insert("interval_in_seconds".to_string(), Value::Int(10));
        set_monitor(&mut attributes, fast.clone());
        let errors = validate_attributes(&prepared(attributes.clone()));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("between 5 and 9"));

        fast.insert("timeout_in_seconds".to_string(), Value::Int(9));
        set_monitor(&mut attributes, fast);
        assert!(validate_attributes(&prepared(attributes)).is_empty());
    }

    #[test]
    fn path_depends_on_protocol() {
        let mut attributes = config();
        set_monitor(&mut attributes, monitor("TCP", Some("/")));
        assert_eq!(validate_attributes(&prepared(attributes.clone())).len(), 1);

        set_monitor(&mut attributes, monitor("TCP", None));
        assert!(validate_attributes(&prepared(attributes.clone())).is_empty());

        set_monitor(&mut attributes, monitor("HTTP", None));
        assert_eq!(validate_attributes(&prepared(attributes)).len(), 1);
    }

    #[test]
    fn expand_uses_global_location_and_upper_case_protocol() {
        let mut attributes = prepared(config());
        let mut monitor = monitor("https", Some("/health"));
        monitor.insert(
            "expected_status_code_ranges".to_string(),
            Value::string_list(["200-299", "301-302"]),
        );
        monitor.insert(
            "custom_header".to_string(),
            Value::blocks(vec![
                AttributesBuilder::new()
                    .set("name", "host")
                    .set("value", "www.example.com")
                    .build(),
            ]),
        );
        set_monitor(&mut attributes, monitor);

        let body = serde_json::to_value(expand(&attributes)).unwrap();
        assert_eq!(body["location"], json!("global"));
        let monitor = &body["properties"]["monitorConfig"];
        assert_eq!(monitor["protocol"], json!("HTTPS"));
        assert_eq!(
            monitor["expectedStatusCodeRanges"],
            json!([{"min": 200, "max": 299}, {"min": 301, "max": 302}])
        );
        assert_eq!(
            monitor["customHeaders"],
            json!([{"name": "host", "value": "www.example.com"}])
        );
        assert!(body["properties"].get("trafficViewEnrollmentStatus").is_none());
    }

    #[tokio::test]
    async fn create_reads_back_fqdn() {
        let client = Arc::new(MockArmClient::new());
        let ctx = ProviderContext::new("sub", client.clone());
        let handler = TrafficManagerProfile;
        let id = TrafficManagerProfileId::new("sub", "rg", "tm-example");

        let state = handler
            .create(&ctx, &address(), &prepared(config()))
            .await
            .unwrap();
        assert_eq!(state.identifier.as_deref(), Some(id.id().as_str()));
        let dns = attrs::block(&state.attributes, "dns_config").unwrap();
        assert_eq!(dns["ttl"], Value::Int(30));
        assert!(!state.attributes.contains_key("fqdn"));

        let existing = MockArmClient::new().with_resource(
            &id.id(),
            json!({
                "location": "global",
                "properties": {
                    "trafficRoutingMethod": "Weighted",
                    "dnsConfig": {
                        "relativeName": "tm-example",
                        "ttl": 30,
                        "fqdn": "tm-example.trafficmanager.net"
                    },
                    "trafficViewEnrollmentStatus": "Enabled"
                }
            }),
        );
        let state = handler
            .read(
                &ProviderContext::new("sub", Arc::new(existing)),
                &address(),
                &id.id(),
            )
            .await
            .unwrap();
        assert_eq!(
            state.attributes["fqdn"],
            Value::from("tm-example.trafficmanager.net")
        );
        assert_eq!(state.attributes["traffic_view_enabled"], Value::Bool(true));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let client = Arc::new(MockArmClient::new());
        let ctx = ProviderContext::new("sub", client.clone());
        let handler = TrafficManagerProfile;
        let state = handler
            .create(&ctx, &address(), &prepared(config()))
            .await
            .unwrap();
        let identifier = state.identifier.unwrap();

        let mut attributes = prepared(config());
        attributes.insert("profile_status".to_string(), Value::from("Disabled"));
        let updated = handler
            .update(&ctx, &address(), &identifier, &attributes)
            .await
            .unwrap();
        assert_eq!(updated.attributes["profile_status"], Value::from("Disabled"));

        handler.delete(&ctx, &address(), &identifier).await.unwrap();
        assert!(!client.contains(&identifier));
    }
}
