//! azurerm_media_streaming_policy
//!
//! Streaming policies are immutable: every attribute forces a new resource.

use async_trait::async_trait;
use azurerm_core::arm_id::ArmResourceId;
use azurerm_core::attrs::{self, AttributesBuilder};
use azurerm_core::provider::ProviderResult;
use azurerm_core::resource::{Attributes, ResourceAddress, State, Value};
use azurerm_core::schema::types;
use azurerm_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema};
use log::{debug, info};

use super::ids::StreamingPolicyId;
use super::models::{
    CbcsDrmConfiguration, CencDrmConfiguration, ClearKeyEncryptionConfiguration,
    CommonEncryptionCbcs, CommonEncryptionCenc, DefaultKey, EnabledProtocols, EnvelopeEncryption,
    FairPlayConfiguration, NoEncryption, PlayReadyConfiguration, StreamingPolicy,
    StreamingPolicyContentKey, StreamingPolicyContentKeys, StreamingPolicyProperties,
    TrackPropertyCondition, TrackSelection, WidevineConfiguration,
};
use super::validate;
use crate::client::{get_resource, put_resource};
use crate::resources::{ProviderContext, ResourceHandler};
use crate::utils::{invalid_id, parse_id, remote_error, require_absent, required_string};

const API_VERSION: &str = "2022-08-01";

pub struct MediaStreamingPolicy;

// =============================================================================
// Schema
// =============================================================================

fn attr(name: &str, attr_type: AttributeType) -> AttributeSchema {
    AttributeSchema::new(name, attr_type).force_new()
}

fn enabled_protocols() -> AttributeType {
    BlockSchema::new()
        .attribute(attr("dash", AttributeType::Bool))
        .attribute(attr("download", AttributeType::Bool))
        .attribute(attr("hls", AttributeType::Bool))
        .attribute(attr("smooth_streaming", AttributeType::Bool))
        .max_items(1)
        .into_type()
}

fn default_content_key() -> AttributeType {
    BlockSchema::new()
        .attribute(attr("label", types::non_empty_string()))
        .attribute(attr("policy_name", types::non_empty_string()))
        .max_items(1)
        .into_type()
}

fn clear_key_encryption() -> AttributeType {
    BlockSchema::new()
        .attribute(attr("custom_keys_acquisition_url_template", types::https_url()).required())
        .max_items(1)
        .into_type()
}

/// Track selection: a set of `condition` blocks
fn track() -> AttributeType {
    let condition = BlockSchema::new()
        .attribute(attr("operation", types::one_of(&["Equal"])).required())
        .attribute(attr("property", types::one_of(&["FourCC"])).required())
        .attribute(attr("value", types::non_empty_string()).required())
        .min_items(1)
        .into_type();
    BlockSchema::new()
        .attribute(attr("condition", condition).required())
        .into_type()
}

fn common_encryption_cenc() -> AttributeType {
    let drm_playready = BlockSchema::new()
        .attribute(attr("custom_license_acquisition_url_template", types::https_url()))
        .attribute(attr("custom_attributes", types::non_empty_string()))
        .max_items(1)
        .into_type();
    let content_key_to_track_mapping = BlockSchema::new()
        .attribute(attr("label", types::non_empty_string()))
        .attribute(attr("policy_name", types::non_empty_string()))
        .attribute(attr("track", track()).required())
        .into_type();

    BlockSchema::new()
        .attribute(attr("clear_key_encryption", clear_key_encryption()))
        .attribute(attr("clear_track", track()))
        .attribute(attr("enabled_protocols", enabled_protocols()))
        .attribute(attr(
            "drm_widevine_custom_license_acquisition_url_template",
            types::https_url(),
        ))
        .attribute(attr("drm_playready", drm_playready))
        .attribute(attr("default_content_key", default_content_key()))
        .attribute(attr("content_key_to_track_mapping", content_key_to_track_mapping))
        .max_items(1)
        .into_type()
}

fn common_encryption_cbcs() -> AttributeType {
    let drm_fairplay = BlockSchema::new()
        .attribute(attr("custom_license_acquisition_url_template", types::https_url()))
        .attribute(attr("allow_persistent_license", AttributeType::Bool))
        .max_items(1)
        .into_type();

    BlockSchema::new()
        .attribute(attr("clear_key_encryption", clear_key_encryption()))
        .attribute(attr("enabled_protocols", enabled_protocols()))
        .attribute(attr("drm_fairplay", drm_fairplay))
        .attribute(attr("default_content_key", default_content_key()))
        .max_items(1)
        .into_type()
}

fn envelope_encryption() -> AttributeType {
    BlockSchema::new()
        .attribute(attr("custom_keys_acquisition_url_template", types::https_url()))
        .attribute(attr("default_content_key", default_content_key()))
        .attribute(attr("enabled_protocols", enabled_protocols()))
        .max_items(1)
        .into_type()
}

fn schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_media_streaming_policy")
        .with_description("Media Services streaming policy")
        .attribute(attr("name", validate::child_name()).required())
        .attribute(attr("resource_group_name", types::resource_group_name()).required())
        .attribute(attr("media_services_account_name", validate::account_name()).required())
        .attribute(attr("no_encryption_enabled_protocols", enabled_protocols()))
        .attribute(attr("common_encryption_cenc", common_encryption_cenc()))
        .attribute(attr("common_encryption_cbcs", common_encryption_cbcs()))
        .attribute(attr("envelope_encryption", envelope_encryption()))
        .attribute(attr("default_content_key_policy_name", types::non_empty_string()))
}

fn validate_attributes(attributes: &Attributes) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(cenc) = attrs::block(attributes, "common_encryption_cenc") {
        let clear_key = attrs::block(cenc, "clear_key_encryption").is_some();
        let widevine =
            attrs::non_empty_string(cenc, "drm_widevine_custom_license_acquisition_url_template")
                .is_some();
        let playready = attrs::block(cenc, "drm_playready");

        if clear_key && (widevine || playready.is_some()) {
            errors.push(
                "common_encryption_cenc.0.clear_key_encryption conflicts with drm_widevine_custom_license_acquisition_url_template and drm_playready"
                    .to_string(),
            );
        }
        if !clear_key && !widevine && playready.is_none() {
            errors.push(
                "common_encryption_cenc: one of clear_key_encryption, drm_widevine_custom_license_acquisition_url_template or drm_playready must be specified"
                    .to_string(),
            );
        }
        if let Some(playready) = playready
            && attrs::non_empty_string(playready, "custom_license_acquisition_url_template")
                .is_none()
            && attrs::non_empty_string(playready, "custom_attributes").is_none()
        {
            errors.push(
                "common_encryption_cenc.0.drm_playready: one of custom_license_acquisition_url_template or custom_attributes must be specified"
                    .to_string(),
            );
        }
    }

    if let Some(cbcs) = attrs::block(attributes, "common_encryption_cbcs") {
        let clear_key = attrs::block(cbcs, "clear_key_encryption").is_some();
        let fairplay = attrs::block(cbcs, "drm_fairplay");

        if clear_key == fairplay.is_some() {
            errors.push(
                "common_encryption_cbcs: exactly one of drm_fairplay or clear_key_encryption must be specified"
                    .to_string(),
            );
        }
        if let Some(fairplay) = fairplay
            && attrs::non_empty_string(fairplay, "custom_license_acquisition_url_template")
                .is_none()
            && !fairplay.contains_key("allow_persistent_license")
        {
            errors.push(
                "common_encryption_cbcs.0.drm_fairplay: one of custom_license_acquisition_url_template or allow_persistent_license must be specified"
                    .to_string(),
            );
        }
    }

    errors
}

// =============================================================================
// Expand
// =============================================================================

fn optional_string(block: &Attributes, key: &str) -> Option<String> {
    attrs::non_empty_string(block, key).map(str::to_string)
}

fn expand_enabled_protocols(block: Option<&Attributes>) -> Option<EnabledProtocols> {
    let block = block?;
    let flag = |key: &str| attrs::bool(block, key).unwrap_or(false);
    Some(EnabledProtocols {
        dash: flag("dash"),
        download: flag("download"),
        hls: flag("hls"),
        smooth_streaming: flag("smooth_streaming"),
    })
}

fn expand_default_key(block: Option<&Attributes>) -> Option<DefaultKey> {
    let block = block?;
    Some(DefaultKey {
        label: optional_string(block, "label"),
        policy_name: optional_string(block, "policy_name"),
    })
}

fn expand_clear_key(block: Option<&Attributes>) -> Option<ClearKeyEncryptionConfiguration> {
    let block = block?;
    Some(ClearKeyEncryptionConfiguration {
        custom_keys_acquisition_url_template: optional_string(
            block,
            "custom_keys_acquisition_url_template",
        ),
    })
}

fn expand_tracks(blocks: Vec<&Attributes>) -> Vec<TrackSelection> {
    blocks
        .into_iter()
        .map(|track| TrackSelection {
            track_selections: attrs::blocks(track, "condition")
                .into_iter()
                .map(|condition| TrackPropertyCondition {
                    property: attrs::string(condition, "property")
                        .unwrap_or_default()
                        .to_string(),
                    operation: attrs::string(condition, "operation")
                        .unwrap_or_default()
                        .to_string(),
                    value: optional_string(condition, "value"),
                })
                .collect(),
        })
        .collect()
}

fn expand_key_to_track_mappings(cenc: &Attributes) -> Vec<StreamingPolicyContentKey> {
    attrs::blocks(cenc, "content_key_to_track_mapping")
        .into_iter()
        .map(|mapping| StreamingPolicyContentKey {
            label: optional_string(mapping, "label"),
            policy_name: optional_string(mapping, "policy_name"),
            tracks: Some(expand_tracks(attrs::blocks(mapping, "track"))),
        })
        .collect()
}

fn expand_content_keys(
    default_key: Option<DefaultKey>,
    mappings: Vec<StreamingPolicyContentKey>,
) -> Option<StreamingPolicyContentKeys> {
    if default_key.is_none() && mappings.is_empty() {
        return None;
    }
    Some(StreamingPolicyContentKeys {
        default_key,
        key_to_track_mappings: (!mappings.is_empty()).then_some(mappings),
    })
}

fn expand_cenc(block: Option<&Attributes>) -> Option<CommonEncryptionCenc> {
    let cenc = block?;

    let widevine = optional_string(cenc, "drm_widevine_custom_license_acquisition_url_template")
        .map(|template| WidevineConfiguration {
            custom_license_acquisition_url_template: Some(template),
        });
    let play_ready = attrs::block(cenc, "drm_playready").map(|playready| PlayReadyConfiguration {
        custom_license_acquisition_url_template: optional_string(
            playready,
            "custom_license_acquisition_url_template",
        ),
        play_ready_custom_attributes: optional_string(playready, "custom_attributes"),
    });
    let drm = (widevine.is_some() || play_ready.is_some())
        .then_some(CencDrmConfiguration { play_ready, widevine });

    let clear_tracks = expand_tracks(attrs::blocks(cenc, "clear_track"));

    Some(CommonEncryptionCenc {
        enabled_protocols: expand_enabled_protocols(attrs::block(cenc, "enabled_protocols")),
        clear_tracks: (!clear_tracks.is_empty()).then_some(clear_tracks),
        content_keys: expand_content_keys(
            expand_default_key(attrs::block(cenc, "default_content_key")),
            expand_key_to_track_mappings(cenc),
        ),
        drm,
        clear_key_encryption_configuration: expand_clear_key(attrs::block(
            cenc,
            "clear_key_encryption",
        )),
    })
}

fn expand_cbcs(block: Option<&Attributes>) -> Option<CommonEncryptionCbcs> {
    let cbcs = block?;

    let drm = attrs::block(cbcs, "drm_fairplay").map(|fairplay| CbcsDrmConfiguration {
        fair_play: Some(FairPlayConfiguration {
            custom_license_acquisition_url_template: optional_string(
                fairplay,
                "custom_license_acquisition_url_template",
            ),
            allow_persistent_license: attrs::bool(fairplay, "allow_persistent_license")
                .unwrap_or(false),
        }),
    });

    Some(CommonEncryptionCbcs {
        enabled_protocols: expand_enabled_protocols(attrs::block(cbcs, "enabled_protocols")),
        content_keys: expand_content_keys(
            expand_default_key(attrs::block(cbcs, "default_content_key")),
            Vec::new(),
        ),
        drm,
        clear_key_encryption_configuration: expand_clear_key(attrs::block(
            cbcs,
            "clear_key_encryption",
        )),
    })
}

fn expand_envelope(block: Option<&Attributes>) -> Option<EnvelopeEncryption> {
    let envelope = block?;
    Some(EnvelopeEncryption {
        enabled_protocols: expand_enabled_protocols(attrs::block(envelope, "enabled_protocols")),
        content_keys: expand_content_keys(
            expand_default_key(attrs::block(envelope, "default_content_key")),
            Vec::new(),
        ),
        custom_key_acquisition_url_template: optional_string(
            envelope,
            "custom_keys_acquisition_url_template",
        ),
    })
}

fn expand(attributes: &Attributes) -> StreamingPolicy {
    StreamingPolicy {
        properties: StreamingPolicyProperties {
            default_content_key_policy_name: optional_string(
                attributes,
                "default_content_key_policy_name",
            ),
            no_encryption: attrs::block(attributes, "no_encryption_enabled_protocols").map(
                |block| NoEncryption {
                    enabled_protocols: expand_enabled_protocols(Some(block)),
                },
            ),
            envelope_encryption: expand_envelope(attrs::block(attributes, "envelope_encryption")),
            common_encryption_cenc: expand_cenc(attrs::block(attributes, "common_encryption_cenc")),
            common_encryption_cbcs: expand_cbcs(attrs::block(attributes, "common_encryption_cbcs")),
        },
    }
}

// =============================================================================
// Flatten
// =============================================================================

fn empty() -> Value {
    Value::List(vec![])
}

fn flatten_enabled_protocols(protocols: Option<&EnabledProtocols>) -> Value {
    let Some(p) = protocols else {
        return empty();
    };
    Value::block(
        AttributesBuilder::new()
            .set("dash", p.dash)
            .set("download", p.download)
            .set("hls", p.hls)
            .set("smooth_streaming", p.smooth_streaming)
            .build(),
    )
}

/// Empty when the key has neither label nor policy name
fn flatten_default_key(keys: Option<&StreamingPolicyContentKeys>) -> Value {
    let Some(key) = keys.and_then(|k| k.default_key.as_ref()) else {
        return empty();
    };
    let label = key.label.clone().unwrap_or_default();
    let policy_name = key.policy_name.clone().unwrap_or_default();
    if label.is_empty() && policy_name.is_empty() {
        return empty();
    }
    Value::block(
        AttributesBuilder::new()
            .set("label", label)
            .set("policy_name", policy_name)
            .build(),
    )
}

fn flatten_clear_key(config: Option<&ClearKeyEncryptionConfiguration>) -> Value {
    let Some(template) = config.and_then(|c| c.custom_keys_acquisition_url_template.clone())
    else {
        return empty();
    };
    Value::block(
        AttributesBuilder::new()
            .set("custom_keys_acquisition_url_template", template)
            .build(),
    )
}

fn flatten_tracks(tracks: &[TrackSelection]) -> Value {
    Value::blocks(
        tracks
            .iter()
            .map(|track| {
                let conditions = track
                    .track_selections
                    .iter()
                    .map(|c| {
                        AttributesBuilder::new()
                            .set("operation", c.operation.as_str())
                            .set("property", c.property.as_str())
                            .set("value", c.value.clone().unwrap_or_default())
                            .build()
                    })
                    .collect();
                AttributesBuilder::new()
                    .set("condition", Value::blocks(conditions))
                    .build()
            })
            .collect(),
    )
}

fn flatten_cenc(cenc: Option<&CommonEncryptionCenc>) -> Value {
    let Some(cenc) = cenc else {
        return empty();
    };
    let drm = cenc.drm.as_ref();

    let widevine = drm
        .and_then(|d| d.widevine.as_ref())
        .and_then(|w| w.custom_license_acquisition_url_template.clone());
    let playready = drm.and_then(|d| d.play_ready.as_ref()).map_or_else(empty, |p| {
        Value::block(
            AttributesBuilder::new()
                .set_opt(
                    "custom_license_acquisition_url_template",
                    p.custom_license_acquisition_url_template.clone(),
                )
                .set_opt("custom_attributes", p.play_ready_custom_attributes.clone())
                .build(),
        )
    });
    let mappings = cenc
        .content_keys
        .as_ref()
        .and_then(|k| k.key_to_track_mappings.as_ref())
        .map(|mappings| {
            mappings
                .iter()
                .map(|m| {
                    AttributesBuilder::new()
                        .set("label", m.label.clone().unwrap_or_default())
                        .set("policy_name", m.policy_name.clone().unwrap_or_default())
                        .set("track", flatten_tracks(m.tracks.as_deref().unwrap_or_default()))
                        .build()
                })
                .collect()
        })
        .unwrap_or_default();

    Value::block(
        AttributesBuilder::new()
            .set(
                "clear_key_encryption",
                flatten_clear_key(cenc.clear_key_encryption_configuration.as_ref()),
            )
            .set(
                "clear_track",
                flatten_tracks(cenc.clear_tracks.as_deref().unwrap_or_default()),
            )
            .set(
                "enabled_protocols",
                flatten_enabled_protocols(cenc.enabled_protocols.as_ref()),
            )
            .set_opt("drm_widevine_custom_license_acquisition_url_template", widevine)
            .set("drm_playready", playready)
            .set(
                "default_content_key",
                flatten_default_key(cenc.content_keys.as_ref()),
            )
            .set("content_key_to_track_mapping", Value::blocks(mappings))
            .build(),
    )
}

fn flatten_cbcs(cbcs: Option<&CommonEncryptionCbcs>) -> Value {
    let Some(cbcs) = cbcs else {
        return empty();
    };
    let fairplay = cbcs
        .drm
        .as_ref()
        .and_then(|d| d.fair_play.as_ref())
        .map_or_else(empty, |f| {
            Value::block(
                AttributesBuilder::new()
                    .set_opt(
                        "custom_license_acquisition_url_template",
                        f.custom_license_acquisition_url_template.clone(),
                    )
                    .set("allow_persistent_license", f.allow_persistent_license)
                    .build(),
            )
        });

    Value::block(
        AttributesBuilder::new()
            .set(
                "clear_key_encryption",
                flatten_clear_key(cbcs.clear_key_encryption_configuration.as_ref()),
            )
            .set(
                "enabled_protocols",
                flatten_enabled_protocols(cbcs.enabled_protocols.as_ref()),
            )
            .set("drm_fairplay", fairplay)
            .set(
                "default_content_key",
                flatten_default_key(cbcs.content_keys.as_ref()),
            )
            .build(),
    )
}

fn flatten_envelope(envelope: Option<&EnvelopeEncryption>) -> Value {
    let Some(envelope) = envelope else {
        return empty();
    };
    Value::block(
        AttributesBuilder::new()
            .set_opt(
                "custom_keys_acquisition_url_template",
                envelope.custom_key_acquisition_url_template.clone(),
            )
            .set(
                "default_content_key",
                flatten_default_key(envelope.content_keys.as_ref()),
            )
            .set(
                "enabled_protocols",
                flatten_enabled_protocols(envelope.enabled_protocols.as_ref()),
            )
            .build(),
    )
}

fn flatten(id: &StreamingPolicyId, model: &StreamingPolicy) -> Attributes {
    let props = &model.properties;
    AttributesBuilder::new()
        .set("name", id.name.as_str())
        .set("media_services_account_name", id.account_name.as_str())
        .set("resource_group_name", id.resource_group.as_str())
        .set(
            "no_encryption_enabled_protocols",
            flatten_enabled_protocols(
                props
                    .no_encryption
                    .as_ref()
                    .and_then(|n| n.enabled_protocols.as_ref()),
            ),
        )
        .set("common_encryption_cenc", flatten_cenc(props.common_encryption_cenc.as_ref()))
        .set("common_encryption_cbcs", flatten_cbcs(props.common_encryption_cbcs.as_ref()))
        .set("envelope_encryption", flatten_envelope(props.envelope_encryption.as_ref()))
        .set_opt(
            "default_content_key_policy_name",
            props.default_content_key_policy_name.clone(),
        )
        .build()
}

// =============================================================================
// CRUD
// =============================================================================

impl MediaStreamingPolicy {
    async fn read_id(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        id: &StreamingPolicyId,
    ) -> ProviderResult<State> {
        let model: Option<StreamingPolicy> =
            get_resource(ctx.client.as_ref(), &id.id(), API_VERSION)
                .await
                .map_err(|e| remote_error(address, "retrieving", id, e))?;

        let Some(model) = model else {
            info!("{} was not found - removing from state", id);
            return Ok(State::not_found(address.clone()));
        };
        Ok(State::existing(address.clone(), flatten(id, &model)).with_identifier(id.id()))
    }
}

#[async_trait]
impl ResourceHandler for MediaStreamingPolicy {
    fn type_name(&self) -> &'static str {
        "azurerm_media_streaming_policy"
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
        let id = StreamingPolicyId::try_new(
            &ctx.subscription_id,
            required_string(attributes, "resource_group_name")?,
            required_string(attributes, "media_services_account_name")?,
            required_string(attributes, "name")?,
        )
        .map_err(|e| invalid_id(address, e))?;
        require_absent(ctx.client.as_ref(), address, &id, API_VERSION).await?;

        debug!("creating {}", id);
        let _: StreamingPolicy =
            put_resource(ctx.client.as_ref(), &id.id(), API_VERSION, &expand(attributes))
                .await
                .map_err(|e| remote_error(address, "creating", &id, e))?;
        self.read_id(ctx, address, &id).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<State> {
        let id: StreamingPolicyId = parse_id(address, identifier)?;
        self.read_id(ctx, address, &id).await
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id: StreamingPolicyId = parse_id(address, identifier)?;
        ctx.client
            .delete(&id.id(), API_VERSION)
            .await
            .map_err(|e| remote_error(address, "deleting", &id, e))
    }
}
