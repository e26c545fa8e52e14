//! azurerm_media_services_account

use std::collections::HashMap;

use async_trait::async_trait;
use azurerm_core::arm_id::ArmResourceId;
use azurerm_core::attrs::{self, AttributesBuilder};
use azurerm_core::provider::ProviderResult;
use azurerm_core::resource::{Attributes, ResourceAddress, State, Value};
use azurerm_core::schema::types::{self, normalize_location};
use azurerm_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema};
use log::{debug, info};

use super::ids::MediaServicesAccountId;
use super::models::{
    AccessControl, KeyDelivery, MediaService, MediaServiceIdentity, MediaServiceProperties,
    StorageAccount, StorageAccountType, UserAssignedIdentity,
};
use super::validate;
use crate::client::{get_resource, put_resource};
use crate::resources::{ProviderContext, ResourceHandler};
use crate::services::ids::{StorageAccountId, UserAssignedIdentityId};
use crate::utils::{
    expand_location, expand_tags, flatten_tags, invalid_id, parse_id, remote_error,
    require_absent, required_string,
};

const API_VERSION: &str = "2021-11-01";

const SYSTEM_ASSIGNED: &str = "SystemAssigned";
const USER_ASSIGNED: &str = "UserAssigned";
const SYSTEM_AND_USER_ASSIGNED: &str = "SystemAssigned, UserAssigned";

pub struct MediaServicesAccount;

// =============================================================================
// Schema
// =============================================================================

fn schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_media_services_account")
        .with_description("Media Services account")
        .attribute(
            AttributeSchema::new("name", validate::account_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("location", types::location())
                .required()
                .force_new()
                .normalized(normalize_location),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", types::resource_group_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new(
                "storage_account",
                BlockSchema::new()
                    .attribute(
                        AttributeSchema::new(
                            "id",
                            types::arm_id::<StorageAccountId>("StorageAccountId"),
                        )
                        .required(),
                    )
                    .attribute(
                        AttributeSchema::new("is_primary", AttributeType::Bool).with_default(false),
                    )
                    .min_items(1)
                    .into_type(),
            )
            .required(),
        )
        .attribute(AttributeSchema::new(
            "storage_authentication_type",
            types::one_of(&["ManagedIdentity", "System"]),
        ))
        .attribute(AttributeSchema::new(
            "identity",
            BlockSchema::new()
                .attribute(
                    AttributeSchema::new(
                        "type",
                        types::one_of(&[SYSTEM_ASSIGNED, USER_ASSIGNED, SYSTEM_AND_USER_ASSIGNED]),
                    )
                    .required(),
                )
                .attribute(AttributeSchema::new(
                    "identity_ids",
                    AttributeType::List(Box::new(types::arm_id::<UserAssignedIdentityId>(
                        "UserAssignedIdentityId",
                    ))),
                ))
                .attribute(AttributeSchema::new("principal_id", AttributeType::String).computed())
                .attribute(AttributeSchema::new("tenant_id", AttributeType::String).computed())
                .max_items(1)
                .into_type(),
        ))
        .attribute(
            AttributeSchema::new("public_network_access_enabled", AttributeType::Bool)
                .with_default(true),
        )
        .attribute(AttributeSchema::new(
            "key_delivery_access_control",
            BlockSchema::new()
                .attribute(AttributeSchema::new(
                    "default_action",
                    types::one_of(&["Allow", "Deny"]),
                ))
                .attribute(AttributeSchema::new("ip_allow_list", types::string_list()))
                .max_items(1)
                .into_type(),
        ))
        .attribute(AttributeSchema::new("tags", types::tags()))
}

fn validate_attributes(attributes: &Attributes) -> Vec<String> {
    let mut errors = Vec::new();

    let primaries = attrs::blocks(attributes, "storage_account")
        .into_iter()
        .filter(|a| attrs::bool(a, "is_primary").unwrap_or(false))
        .count();
    if primaries != 1 {
        errors.push(format!(
            "exactly one `storage_account` must have `is_primary` set to true, found {}",
            primaries
        ));
    }

    if let Some(identity) = attrs::block(attributes, "identity") {
        let identity_type = attrs::string(identity, "type").unwrap_or_default();
        let has_ids = !attrs::string_list(identity, "identity_ids").is_empty();
        let user_assigned = identity_type.contains(USER_ASSIGNED);
        if has_ids && !user_assigned {
            errors.push(
                "`identity_ids` can only be specified when `type` includes `UserAssigned`"
                    .to_string(),
            );
        }
        if user_assigned && !has_ids {
            errors.push(
                "`identity_ids` must be specified when `type` includes `UserAssigned`".to_string(),
            );
        }
    }

    errors
}

// =============================================================================
// Expand / Flatten
// =============================================================================

fn expand_storage_accounts(attributes: &Attributes) -> Vec<StorageAccount> {
    attrs::blocks(attributes, "storage_account")
        .into_iter()
        .map(|block| StorageAccount {
            id: attrs::string(block, "id").unwrap_or_default().to_string(),
            account_type: if attrs::bool(block, "is_primary").unwrap_or(false) {
                StorageAccountType::Primary
            } else {
                StorageAccountType::Secondary
            },
        })
        .collect()
}

fn flatten_storage_accounts(accounts: &[StorageAccount]) -> Value {
    Value::blocks(
        accounts
            .iter()
            .map(|account| {
                AttributesBuilder::new()
                    .set("id", account.id.as_str())
                    .set("is_primary", account.account_type == StorageAccountType::Primary)
                    .build()
            })
            .collect(),
    )
}

fn expand_identity(attributes: &Attributes) -> Option<MediaServiceIdentity> {
    let block = attrs::block(attributes, "identity")?;
    let identity_type = attrs::string(block, "type").unwrap_or_default();
    let ids = attrs::string_list(block, "identity_ids");

    Some(MediaServiceIdentity {
        // ARM spells the combined type without the space
        identity_type: identity_type.replace(", ", ","),
        user_assigned_identities: (!ids.is_empty()).then(|| {
            ids.into_iter()
                .map(|id| (id, UserAssignedIdentity::default()))
                .collect()
        }),
        principal_id: None,
        tenant_id: None,
    })
}

fn flatten_identity(identity: Option<&MediaServiceIdentity>) -> Value {
    let Some(identity) = identity.filter(|i| !i.identity_type.eq_ignore_ascii_case("None")) else {
        return Value::List(vec![]);
    };

    let mut ids: Vec<String> = identity
        .user_assigned_identities
        .iter()
        .flat_map(HashMap::keys)
        .cloned()
        .collect();
    ids.sort();

    Value::block(
        AttributesBuilder::new()
            .set(
                "type",
                identity
                    .identity_type
                    .split(',')
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join(", "),
            )
            .set("identity_ids", Value::string_list(ids))
            .set_opt("principal_id", identity.principal_id.clone())
            .set_opt("tenant_id", identity.tenant_id.clone())
            .build(),
    )
}

fn expand_key_delivery(attributes: &Attributes) -> Option<KeyDelivery> {
    let block = attrs::block(attributes, "key_delivery_access_control")?;
    Some(KeyDelivery {
        access_control: Some(AccessControl {
            default_action: attrs::non_empty_string(block, "default_action").map(str::to_string),
            ip_allow_list: block
                .contains_key("ip_allow_list")
                .then(|| attrs::string_list(block, "ip_allow_list")),
        }),
    })
}

fn flatten_key_delivery(key_delivery: Option<&KeyDelivery>) -> Value {
    let Some(access_control) = key_delivery.and_then(|k| k.access_control.as_ref()) else {
        return Value::List(vec![]);
    };
    Value::block(
        AttributesBuilder::new()
            .set_opt("default_action", access_control.default_action.clone())
            .set(
                "ip_allow_list",
                Value::string_list(access_control.ip_allow_list.iter().flatten().cloned()),
            )
            .build(),
    )
}

fn expand(attributes: &Attributes) -> MediaService {
    let public_network_access = if attrs::bool(attributes, "public_network_access_enabled")
        .unwrap_or(true)
    {
        "Enabled"
    } else {
        "Disabled"
    };

    MediaService {
        location: expand_location(attributes),
        tags: expand_tags(attributes),
        identity: expand_identity(attributes),
        properties: MediaServiceProperties {
            storage_accounts: expand_storage_accounts(attributes),
            storage_authentication: attrs::non_empty_string(
                attributes,
                "storage_authentication_type",
            )
            .map(str::to_string),
            public_network_access: Some(public_network_access.to_string()),
            key_delivery: expand_key_delivery(attributes),
        },
    }
}

fn flatten(id: &MediaServicesAccountId, model: &MediaService) -> Attributes {
    let props = &model.properties;
    AttributesBuilder::new()
        .set("name", id.name.as_str())
        .set("resource_group_name", id.resource_group.as_str())
        .set("location", normalize_location(&model.location))
        .set("storage_account", flatten_storage_accounts(&props.storage_accounts))
        .set_opt(
            "storage_authentication_type",
            props.storage_authentication.clone(),
        )
        .set("identity", flatten_identity(model.identity.as_ref()))
        .set(
            "public_network_access_enabled",
            props
                .public_network_access
                .as_deref()
                .is_none_or(|v| v.eq_ignore_ascii_case("Enabled")),
        )
        .set(
            "key_delivery_access_control",
            flatten_key_delivery(props.key_delivery.as_ref()),
        )
        .set("tags", flatten_tags(model.tags.as_ref()))
        .build()
}

// =============================================================================
// CRUD
// =============================================================================

impl MediaServicesAccount {
    async fn read_id(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        id: &MediaServicesAccountId,
    ) -> ProviderResult<State> {
        let model: Option<MediaService> =
            get_resource(ctx.client.as_ref(), &id.id(), API_VERSION)
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
        id: &MediaServicesAccountId,
        attributes: &Attributes,
        action: &str,
    ) -> ProviderResult<State> {
        debug!("{} {}", action, id);
        let _: MediaService =
            put_resource(ctx.client.as_ref(), &id.id(), API_VERSION, &expand(attributes))
                .await
                .map_err(|e| remote_error(address, action, id, e))?;
        self.read_id(ctx, address, id).await
    }
}

#[async_trait]
impl ResourceHandler for MediaServicesAccount {
    fn type_name(&self) -> &'static str {
        "azurerm_media_services_account"
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
        let id = MediaServicesAccountId::try_new(
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
        let id: MediaServicesAccountId = parse_id(address, identifier)?;
        self.read_id(ctx, address, &id).await
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
        attributes: &Attributes,
    ) -> ProviderResult<State> {
        let id: MediaServicesAccountId = parse_id(address, identifier)?;
        self.put(ctx, address, &id, attributes, "updating").await
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id: MediaServicesAccountId = parse_id(address, identifier)?;
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

    const STORAGE_1: &str =
        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/store1";
    const STORAGE_2: &str =
        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/store2";
    const IDENTITY: &str = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/ident";

    fn address() -> ResourceAddress {
        ResourceAddress::new("azurerm_media_services_account", "example")
    }

    fn storage(id: &str, primary: bool) -> Attributes {
        AttributesBuilder::new()
            .set("id", id)
            .set("is_primary", primary)
            .build()
    }

    fn config() -> Attributes {
        AttributesBuilder::new()
            .set("name", "mediaacct1")
            .set("location", "West Europe")
            .set("resource_group_name", "rg")
            .set(
                "storage_account",
                Value::blocks(vec![storage(STORAGE_1, true), storage(STORAGE_2, false)]),
            )
            .set("tags", Value::string_map([("env", "test")]))
            .build()
    }

    fn context(client: Arc<MockArmClient>) -> ProviderContext {
        ProviderContext::new("sub", client)
    }

    #[test]
    fn schema_accepts_config() {
        let mut attributes = config();
        let schema = schema();
        schema.apply_defaults(&mut attributes);
        assert!(schema.validate(&attributes).is_ok());
        assert!(validate_attributes(&attributes).is_empty());
        assert_eq!(attributes["public_network_access_enabled"], Value::Bool(true));
    }

    #[test]
    fn exactly_one_primary_storage_account() {
        let mut attributes = config();
        attributes.insert(
            "storage_account".to_string(),
            Value::blocks(vec![storage(STORAGE_1, true), storage(STORAGE_2, true)]),
        );
        assert_eq!(validate_attributes(&attributes).len(), 1);

        attributes.insert(
            "storage_account".to_string(),
            Value::blocks(vec![storage(STORAGE_1, false)]),
        );
        let errors = validate_attributes(&attributes);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("found 0"));
    }

    #[test]
    fn storage_account_id_must_be_typed() {
        let mut attributes = config();
        attributes.insert(
            "storage_account".to_string(),
            Value::blocks(vec![storage("/subscriptions/sub/resourceGroups/rg", true)]),
        );
        assert!(schema().validate(&attributes).is_err());
    }

    #[test]
    fn identity_ids_require_user_assigned() {
        let mut attributes = config();
        attributes.insert(
            "identity".to_string(),
            Value::block(
                AttributesBuilder::new()
                    .set("type", "SystemAssigned")
                    .set("identity_ids", Value::string_list([IDENTITY]))
                    .build(),
            ),
        );
        assert_eq!(validate_attributes(&attributes).len(), 1);

        attributes.insert(
            "identity".to_string(),
            Value::block(AttributesBuilder::new().set("type", "UserAssigned").build()),
        );
        assert_eq!(validate_attributes(&attributes).len(), 1);
    }

    #[test]
    fn expand_builds_request_body() {
        let mut attributes = config();
        attributes.insert(
            "identity".to_string(),
            Value::block(
                AttributesBuilder::new()
                    .set("type", "SystemAssigned, UserAssigned")
                    .set("identity_ids", Value::string_list([IDENTITY]))
                    .build(),
            ),
        );
        attributes.insert("public_network_access_enabled".to_string(), Value::Bool(false));

        let body = serde_json::to_value(expand(&attributes)).unwrap();
        assert_eq!(body["location"], json!("westeurope"));
        assert_eq!(body["identity"]["type"], json!("SystemAssigned,UserAssigned"));
        assert_eq!(body["identity"]["userAssignedIdentities"][IDENTITY], json!({}));
        assert_eq!(body["properties"]["publicNetworkAccess"], json!("Disabled"));
        assert_eq!(
            body["properties"]["storageAccounts"],
            json!([
                {"id": STORAGE_1, "type": "Primary"},
                {"id": STORAGE_2, "type": "Secondary"}
            ])
        );
    }

    #[test]
    fn flatten_identity_restores_spacing() {
        let identity = MediaServiceIdentity {
            identity_type: "SystemAssigned,UserAssigned".to_string(),
            user_assigned_identities: Some(HashMap::from([(
                IDENTITY.to_string(),
                UserAssignedIdentity::default(),
            )])),
            principal_id: Some("principal".to_string()),
            tenant_id: Some("tenant".to_string()),
        };
        let Value::List(items) = flatten_identity(Some(&identity)) else {
            panic!("expected block list");
        };
        let block = items[0].as_map().unwrap();
        assert_eq!(block["type"], Value::from("SystemAssigned, UserAssigned"));
        assert_eq!(block["identity_ids"], Value::string_list([IDENTITY]));
        assert_eq!(block["principal_id"], Value::from("principal"));

        let none = MediaServiceIdentity {
            identity_type: "None".to_string(),
            ..Default::default()
        };
        assert_eq!(flatten_identity(Some(&none)), Value::List(vec![]));
    }

    #[tokio::test]
    async fn create_then_read() {
        let client = Arc::new(MockArmClient::new());
        let ctx = context(client.clone());
        let handler = MediaServicesAccount;

        let state = handler.create(&ctx, &address(), &config()).await.unwrap();
        let id = MediaServicesAccountId::new("sub", "rg", "mediaacct1");
        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some(id.id().as_str()));
        assert_eq!(state.attributes["name"], Value::from("mediaacct1"));
        assert_eq!(state.attributes["location"], Value::from("westeurope"));
        assert_eq!(state.attributes["tags"], Value::string_map([("env", "test")]));

        let put = client.last_put(&id.id()).unwrap();
        assert_eq!(put["properties"]["storageAccounts"][0]["type"], json!("Primary"));
        assert!(client.requests().iter().all(|r| r.api_version == API_VERSION));
    }

    #[tokio::test]
    async fn create_refuses_existing_account() {
        let id = MediaServicesAccountId::new("sub", "rg", "mediaacct1");
        let client = Arc::new(MockArmClient::new().with_resource(&id.id(), json!({"location": "westeurope"})));
        let err = MediaServicesAccount
            .create(&context(client.clone()), &address(), &config())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert!(client.last_put(&id.id()).is_none());
    }

    #[tokio::test]
    async fn create_rejects_resource_group_with_slash() {
        let client = Arc::new(MockArmClient::new());
        let mut attributes = config();
        attributes.insert("resource_group_name".to_string(), Value::from("rg/extra"));
        let err = MediaServicesAccount
            .create(&context(client.clone()), &address(), &attributes)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn read_missing_account_clears_state() {
        let client = Arc::new(MockArmClient::new());
        let id = MediaServicesAccountId::new("sub", "rg", "gone");
        let state = MediaServicesAccount
            .read(&context(client), &address(), &id.id())
            .await
            .unwrap();
        assert!(!state.exists);
        assert!(state.identifier.is_none());
    }

    #[tokio::test]
    async fn update_and_delete() {
        let client = Arc::new(MockArmClient::new());
        let ctx = context(client.clone());
        let handler = MediaServicesAccount;
        let state = handler.create(&ctx, &address(), &config()).await.unwrap();
        let identifier = state.identifier.unwrap();

        let mut attributes = config();
        attributes.insert("tags".to_string(), Value::string_map([("env", "prod")]));
        let updated = handler
            .update(&ctx, &address(), &identifier, &attributes)
            .await
            .unwrap();
        assert_eq!(updated.attributes["tags"], Value::string_map([("env", "prod")]));

        handler.delete(&ctx, &address(), &identifier).await.unwrap();
        assert!(!client.contains(&identifier));
    }
}
