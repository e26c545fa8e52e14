//! azurerm_media_content_key_policy
//!
//! Every `policy_option` pairs one key configuration (clear key, Widevine,
//! PlayReady or FairPlay) with one restriction (open or token). Secrets are
//! only returned by the `getPolicyPropertiesWithSecrets` action, so reads go
//! through it instead of a plain GET.

use async_trait::async_trait;
use azurerm_core::arm_id::ArmResourceId;
use azurerm_core::attrs::{self, AttributesBuilder};
use azurerm_core::provider::{ProviderError, ProviderResult};
use azurerm_core::resource::{Attributes, ResourceAddress, State, Value};
use azurerm_core::schema::types;
use azurerm_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};

use super::ids::ContentKeyPolicyId;
use super::models::{
    ContentKeyLocation, ContentKeyPolicy, ContentKeyPolicyOption, ContentKeyPolicyProperties,
    ExplicitAnalogTelevisionRestriction, FairPlayKeyConfiguration, KeyConfiguration,
    KeyIdentifierLocation, KeyRestriction, OfflineRentalConfiguration, PlayReadyKeyConfiguration,
    PlayReadyLicense, PlayReadyPlayRight, RsaTokenKey, SymmetricTokenKey, TokenClaim, TokenKey,
    TokenRestriction, WidevineConfigurationTemplate, X509TokenKey,
};
use super::validate;
use crate::client::{action_resource, put_resource};
use crate::resources::{ProviderContext, ResourceHandler};
use crate::utils::{invalid_id, parse_id, remote_error, require_absent, required_string};

const API_VERSION: &str = "2022-08-01";

const SECRETS_ACTION: &str = "getPolicyPropertiesWithSecrets";

pub struct MediaContentKeyPolicy;

/// RFC 3339 in UTC with whole seconds, the form Azure echoes back
fn canonical_time(s: &str) -> String {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|_| s.to_string())
}

fn canonical_key_id(s: &str) -> String {
    uuid::Uuid::parse_str(s)
        .map(|u| u.hyphenated().to_string())
        .unwrap_or_else(|_| s.to_string())
}

fn lowercase(s: &str) -> String {
    s.to_ascii_lowercase()
}

// =============================================================================
// Schema
// =============================================================================

fn play_right_block() -> AttributeType {
    let flag = |name: &str| AttributeSchema::new(name, AttributeType::Bool);
    BlockSchema::new()
        .attribute(AttributeSchema::new(
            "agc_and_color_stripe_restriction",
            types::int_between(0, 3),
        ))
        .attribute(AttributeSchema::new(
            "allow_passing_video_content_to_unknown_output",
            types::one_of(&["Allowed", "AllowedWithVideoConstriction", "NotAllowed"]),
        ))
        .attribute(AttributeSchema::new(
            "analog_video_opl",
            validate::int_one_of(&[100, 150, 200]),
        ))
        .attribute(AttributeSchema::new(
            "compressed_digital_audio_opl",
            validate::int_one_of(&[100, 150, 200, 250, 300]),
        ))
        .attribute(AttributeSchema::new(
            "compressed_digital_video_opl",
            validate::int_one_of(&[400, 500]),
        ))
        .attribute(flag("digital_video_only_content_restriction"))
        .attribute(AttributeSchema::new(
            "explicit_analog_television_output_restriction",
            BlockSchema::new()
                .attribute(flag("best_effort_enforced"))
                .attribute(AttributeSchema::new("control_bits", types::int_between(0, 3)).required())
                .max_items(1)
                .into_type(),
        ))
        .attribute(AttributeSchema::new("first_play_expiration", types::non_empty_string()))
        .attribute(flag("image_constraint_for_analog_component_video_restriction"))
        .attribute(flag("image_constraint_for_analog_computer_monitor_restriction"))
        .attribute(AttributeSchema::new("scms_restriction", types::int_between(0, 3)))
        .attribute(AttributeSchema::new(
            "uncompressed_digital_audio_opl",
            validate::int_one_of(&[100, 150, 200, 250, 300]),
        ))
        .attribute(AttributeSchema::new(
            "uncompressed_digital_video_opl",
            validate::int_one_of(&[100, 250, 270, 300]),
        ))
        .max_items(1)
        .into_type()
}

fn playready_license_block() -> AttributeType {
    BlockSchema::new()
        .attribute(AttributeSchema::new("allow_test_devices", AttributeType::Bool))
        .attribute(
            AttributeSchema::new("begin_date", validate::rfc3339_time()).normalized(canonical_time),
        )
        .attribute(AttributeSchema::new(
            "content_key_location_from_header_enabled",
            AttributeType::Bool,
        ))
        .attribute(
            AttributeSchema::new("content_key_location_from_key_id", validate::key_id())
                .normalized(canonical_key_id),
        )
        .attribute(AttributeSchema::new(
            "content_type",
            types::one_of(&["UltraVioletDownload", "UltraVioletStreaming", "Unspecified"]),
        ))
        .attribute(
            AttributeSchema::new("expiration_date", validate::rfc3339_time())
                .normalized(canonical_time),
        )
        .attribute(AttributeSchema::new("grace_period", types::non_empty_string()))
        .attribute(AttributeSchema::new(
            "license_type",
            types::one_of(&["NonPersistent", "Persistent"]),
        ))
        .attribute(AttributeSchema::new("play_right", play_right_block()))
        .attribute(AttributeSchema::new("relative_begin_date", types::non_empty_string()))
        .attribute(AttributeSchema::new("relative_expiration_date", types::non_empty_string()))
        .attribute(AttributeSchema::new(
            "security_level",
            types::one_of(&["SL150", "SL2000", "SL3000"]),
        ))
        .into_type()
}

fn fairplay_block() -> AttributeType {
    BlockSchema::new()
        .attribute(AttributeSchema::new("ask", validate::hex_bytes()).normalized(lowercase))
        .attribute(AttributeSchema::new("pfx", types::non_empty_string()))
        .attribute(AttributeSchema::new("pfx_password", types::non_empty_string()))
        .attribute(AttributeSchema::new(
            "offline_rental_configuration",
            BlockSchema::new()
                .attribute(AttributeSchema::new("playback_duration_seconds", types::int_at_least(1)))
                .attribute(AttributeSchema::new("storage_duration_seconds", types::int_at_least(1)))
                .max_items(1)
                .into_type(),
        ))
        .attribute(AttributeSchema::new(
            "rental_and_lease_key_type",
            types::one_of(&["DualExpiry", "PersistentLimited", "PersistentUnlimited", "Undefined"]),
        ))
        .attribute(AttributeSchema::new("rental_duration_seconds", types::int_at_least(1)))
        .max_items(1)
        .into_type()
}

fn token_restriction_block() -> AttributeType {
    let key = |name: &str| AttributeSchema::new(name, types::non_empty_string());
    BlockSchema::new()
        .attribute(AttributeSchema::new(
            "alternate_key",
            BlockSchema::new()
                .attribute(AttributeSchema::new("symmetric_token_key", validate::base64_bytes()))
                .attribute(key("rsa_token_key_exponent"))
                .attribute(key("rsa_token_key_modulus"))
                .attribute(key("x509_token_key_raw"))
                .into_type(),
        ))
        .attribute(AttributeSchema::new("audience", types::non_empty_string()))
        .attribute(AttributeSchema::new("issuer", types::non_empty_string()))
        .attribute(AttributeSchema::new("token_type", types::one_of(&["Jwt", "Swt"])))
        .attribute(AttributeSchema::new(
            "primary_symmetric_token_key",
            validate::base64_bytes(),
        ))
        .attribute(key("primary_rsa_token_key_exponent"))
        .attribute(key("primary_rsa_token_key_modulus"))
        .attribute(key("primary_x509_token_key_raw"))
        .attribute(AttributeSchema::new(
            "open_id_connect_discovery_document",
            types::non_empty_string(),
        ))
        .attribute(AttributeSchema::new(
            "required_claim",
            BlockSchema::new()
                .attribute(AttributeSchema::new("type", types::non_empty_string()))
                .attribute(AttributeSchema::new("value", types::non_empty_string()))
                .into_type(),
        ))
        .max_items(1)
        .into_type()
}

fn policy_option_block() -> AttributeType {
    BlockSchema::new()
        .attribute(AttributeSchema::new("name", types::non_empty_string()).required())
        .attribute(AttributeSchema::new(
            "clear_key_configuration_enabled",
            AttributeType::Bool,
        ))
        .attribute(AttributeSchema::new("fairplay_configuration", fairplay_block()))
        .attribute(AttributeSchema::new(
            "playready_configuration_license",
            playready_license_block(),
        ))
        .attribute(AttributeSchema::new(
            "playready_response_custom_data",
            types::non_empty_string(),
        ))
        .attribute(AttributeSchema::new(
            "widevine_configuration_template",
            types::non_empty_string(),
        ))
        .attribute(AttributeSchema::new("open_restriction_enabled", AttributeType::Bool))
        .attribute(AttributeSchema::new("token_restriction", token_restriction_block()))
        .min_items(1)
        .into_type()
}

fn schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_media_content_key_policy")
        .with_description("Media Services content key policy")
        .attribute(
            AttributeSchema::new("name", validate::child_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", types::resource_group_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("media_services_account_name", validate::account_name())
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("description", types::non_empty_string()))
        .attribute(AttributeSchema::new("policy_option", policy_option_block()).required())
}

// =============================================================================
// Validation
// =============================================================================

fn flag(block: &Attributes, key: &str) -> bool {
    attrs::bool(block, key).unwrap_or(false)
}

fn has_string(block: &Attributes, key: &str) -> bool {
    attrs::non_empty_string(block, key).is_some()
}

/// How many kinds of token key a block sets, given its attribute prefix
fn token_key_kinds(block: &Attributes, prefix: &str) -> usize {
    let key = |name: &str| has_string(block, &format!("{}{}", prefix, name));
    [
        key("symmetric_token_key"),
        key("rsa_token_key_exponent") || key("rsa_token_key_modulus"),
        key("x509_token_key_raw"),
    ]
    .into_iter()
    .filter(|set| *set)
    .count()
}

fn validate_attributes(attributes: &Attributes) -> Vec<String> {
    let mut errors = Vec::new();
    for (index, option) in attrs::blocks(attributes, "policy_option").into_iter().enumerate() {
        let path = format!("policy_option.{}", index);

        let configurations = [
            flag(option, "clear_key_configuration_enabled"),
            attrs::block(option, "fairplay_configuration").is_some(),
            !attrs::blocks(option, "playready_configuration_license").is_empty(),
            has_string(option, "widevine_configuration_template"),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        match configurations {
            0 => errors.push(format!(
                "{}: policy_option must contain at least one type of configuration: clear_key_configuration_enabled, widevine_configuration_template, playready_configuration_license or fairplay_configuration",
                path
            )),
            1 => {}
            _ => errors.push(format!(
                "{}: more than one type of configuration in the same policy_option is not allowed",
                path
            )),
        }

        let token = attrs::block(option, "token_restriction");
        match (flag(option, "open_restriction_enabled"), token.is_some()) {
            (false, false) => errors.push(format!(
                "{}: policy_option must contain at least one type of restriction: open_restriction_enabled or token_restriction",
                path
            )),
            (true, true) => errors.push(format!(
                "{}: more than one type of restriction in the same policy_option is not allowed",
                path
            )),
            _ => {}
        }

        if let Some(token) = token {
            if token_key_kinds(token, "primary_") > 1 {
                errors.push(format!(
                    "{}.token_restriction.0: more than one type of token key in the same token_restriction is not allowed",
                    path
                ));
            }
            for (i, key) in attrs::blocks(token, "alternate_key").into_iter().enumerate() {
                if token_key_kinds(key, "") != 1 {
                    errors.push(format!(
                        "{}.token_restriction.0.alternate_key.{}: exactly one type of token key must be set",
                        path, i
                    ));
                }
            }
        }

        for (i, license) in attrs::blocks(option, "playready_configuration_license")
            .into_iter()
            .enumerate()
        {
            if flag(license, "content_key_location_from_header_enabled")
                && has_string(license, "content_key_location_from_key_id")
            {
                errors.push(format!(
                    "{}.playready_configuration_license.{}: specify content_key_location_from_header_enabled or content_key_location_from_key_id but not both",
                    path, i
                ));
            }
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

fn string_or_default(block: &Attributes, key: &str) -> String {
    attrs::string(block, key).unwrap_or_default().to_string()
}

fn expand_time(block: &Attributes, key: &str) -> ProviderResult<Option<String>> {
    let Some(value) = attrs::non_empty_string(block, key) else {
        return Ok(None);
    };
    let parsed = DateTime::parse_from_rfc3339(value).map_err(|e| {
        ProviderError::validation(format!("parsing `{}` {:?}", key, value)).with_cause(e)
    })?;
    Ok(Some(
        parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    ))
}

fn expand_play_right(license: &Attributes) -> Option<PlayReadyPlayRight> {
    let block = attrs::block(license, "play_right")?;
    Some(PlayReadyPlayRight {
        first_play_expiration: optional_string(block, "first_play_expiration"),
        scms_restriction: attrs::int(block, "scms_restriction"),
        agc_and_color_stripe_restriction: attrs::int(block, "agc_and_color_stripe_restriction"),
        explicit_analog_television_output_restriction: attrs::block(
            block,
            "explicit_analog_television_output_restriction",
        )
        .map(|r| ExplicitAnalogTelevisionRestriction {
            best_effort: flag(r, "best_effort_enforced"),
            configuration_data: attrs::int(r, "control_bits").unwrap_or_default(),
        }),
        digital_video_only_content_restriction: flag(
            block,
            "digital_video_only_content_restriction",
        ),
        image_constraint_for_analog_component_video_restriction: flag(
            block,
            "image_constraint_for_analog_component_video_restriction",
        ),
        image_constraint_for_analog_computer_monitor_restriction: flag(
            block,
            "image_constraint_for_analog_computer_monitor_restriction",
        ),
        allow_passing_video_content_to_unknown_output: string_or_default(
            block,
            "allow_passing_video_content_to_unknown_output",
        ),
        uncompressed_digital_video_opl: attrs::int(block, "uncompressed_digital_video_opl"),
        uncompressed_digital_audio_opl: attrs::int(block, "uncompressed_digital_audio_opl"),
        compressed_digital_video_opl: attrs::int(block, "compressed_digital_video_opl"),
        compressed_digital_audio_opl: attrs::int(block, "compressed_digital_audio_opl"),
        analog_video_opl: attrs::int(block, "analog_video_opl"),
    })
}

fn expand_license(license: &Attributes) -> ProviderResult<PlayReadyLicense> {
    let content_key_location = match attrs::non_empty_string(license, "content_key_location_from_key_id") {
        Some(key_id) => ContentKeyLocation::KeyIdentifier(KeyIdentifierLocation {
            key_id: canonical_key_id(key_id),
        }),
        None => ContentKeyLocation::Header,
    };
    Ok(PlayReadyLicense {
        allow_test_devices: flag(license, "allow_test_devices"),
        begin_date: expand_time(license, "begin_date")?,
        expiration_date: expand_time(license, "expiration_date")?,
        relative_begin_date: optional_string(license, "relative_begin_date"),
        relative_expiration_date: optional_string(license, "relative_expiration_date"),
        grace_period: optional_string(license, "grace_period"),
        play_right: expand_play_right(license),
        license_type: string_or_default(license, "license_type"),
        content_key_location,
        content_type: string_or_default(license, "content_type"),
        security_level: optional_string(license, "security_level"),
    })
}

fn expand_fairplay(block: &Attributes) -> ProviderResult<FairPlayKeyConfiguration> {
    let ask = attrs::string(block, "ask").unwrap_or_default();
    let ask = hex::decode(ask).map_err(|e| {
        ProviderError::validation("`fairplay_configuration.0.ask` is not hex encoded").with_cause(e)
    })?;
    Ok(FairPlayKeyConfiguration {
        ask: STANDARD.encode(ask),
        fair_play_pfx: string_or_default(block, "pfx"),
        fair_play_pfx_password: string_or_default(block, "pfx_password"),
        rental_and_lease_key_type: string_or_default(block, "rental_and_lease_key_type"),
        rental_duration: attrs::int(block, "rental_duration_seconds").unwrap_or_default(),
        offline_rental_configuration: attrs::block(block, "offline_rental_configuration").map(|o| {
            OfflineRentalConfiguration {
                playback_duration_seconds: attrs::int(o, "playback_duration_seconds")
                    .unwrap_or_default(),
                storage_duration_seconds: attrs::int(o, "storage_duration_seconds")
                    .unwrap_or_default(),
            }
        }),
    })
}

fn expand_configuration(option: &Attributes) -> ProviderResult<KeyConfiguration> {
    if flag(option, "clear_key_configuration_enabled") {
        return Ok(KeyConfiguration::ClearKey);
    }
    if let Some(fairplay) = attrs::block(option, "fairplay_configuration") {
        return Ok(KeyConfiguration::FairPlay(expand_fairplay(fairplay)?));
    }
    let licenses = attrs::blocks(option, "playready_configuration_license");
    if !licenses.is_empty() {
        return Ok(KeyConfiguration::PlayReady(PlayReadyKeyConfiguration {
            licenses: licenses
                .into_iter()
                .map(expand_license)
                .collect::<ProviderResult<_>>()?,
            response_custom_data: optional_string(option, "playready_response_custom_data"),
        }));
    }
    match optional_string(option, "widevine_configuration_template") {
        Some(widevine_template) => Ok(KeyConfiguration::Widevine(WidevineConfigurationTemplate {
            widevine_template,
        })),
        None => Err(ProviderError::validation(
            "policy_option must contain at least one type of configuration",
        )),
    }
}

/// Token key from `<prefix>symmetric_token_key` and friends
fn expand_token_key(block: &Attributes, prefix: &str) -> Option<TokenKey> {
    let key = |name: &str| optional_string(block, &format!("{}{}", prefix, name));
    if let Some(key_value) = key("symmetric_token_key") {
        return Some(TokenKey::Symmetric(SymmetricTokenKey { key_value }));
    }
    let exponent = key("rsa_token_key_exponent");
    let modulus = key("rsa_token_key_modulus");
    if exponent.is_some() || modulus.is_some() {
        return Some(TokenKey::Rsa(RsaTokenKey {
            exponent: exponent.unwrap_or_default(),
            modulus: modulus.unwrap_or_default(),
        }));
    }
    key("x509_token_key_raw").map(|raw_body| TokenKey::X509(X509TokenKey { raw_body }))
}

fn expand_restriction(option: &Attributes) -> KeyRestriction {
    let Some(token) = attrs::block(option, "token_restriction") else {
        return KeyRestriction::Open;
    };
    let alternate: Vec<TokenKey> = attrs::blocks(token, "alternate_key")
        .into_iter()
        .filter_map(|key| expand_token_key(key, ""))
        .collect();
    let claims: Vec<TokenClaim> = attrs::blocks(token, "required_claim")
        .into_iter()
        .map(|claim| TokenClaim {
            claim_type: optional_string(claim, "type"),
            claim_value: optional_string(claim, "value"),
        })
        .collect();
    KeyRestriction::Token(TokenRestriction {
        issuer: string_or_default(token, "issuer"),
        audience: string_or_default(token, "audience"),
        primary_verification_key: expand_token_key(token, "primary_"),
        alternate_verification_keys: (!alternate.is_empty()).then_some(alternate),
        required_claims: (!claims.is_empty()).then_some(claims),
        restriction_token_type: string_or_default(token, "token_type"),
        open_id_connect_discovery_document: optional_string(
            token,
            "open_id_connect_discovery_document",
        ),
    })
}

fn expand(attributes: &Attributes) -> ProviderResult<ContentKeyPolicy> {
    let options = attrs::blocks(attributes, "policy_option")
        .into_iter()
        .map(|option| -> ProviderResult<ContentKeyPolicyOption> {
            Ok(ContentKeyPolicyOption {
                name: optional_string(option, "name"),
                configuration: expand_configuration(option)?,
                restriction: expand_restriction(option),
            })
        })
        .collect::<ProviderResult<_>>()?;
    Ok(ContentKeyPolicy {
        properties: ContentKeyPolicyProperties {
            description: optional_string(attributes, "description"),
            options,
        },
    })
}

// =============================================================================
// Flatten
// =============================================================================

fn flatten_play_right(right: &PlayReadyPlayRight) -> Attributes {
    let explicit = right
        .explicit_analog_television_output_restriction
        .as_ref()
        .map(|r| {
            AttributesBuilder::new()
                .set("best_effort_enforced", r.best_effort)
                .set("control_bits", r.configuration_data)
                .build()
        });
    AttributesBuilder::new()
        .set_opt("first_play_expiration", right.first_play_expiration.clone())
        .set_opt("scms_restriction", right.scms_restriction)
        .set_opt(
            "agc_and_color_stripe_restriction",
            right.agc_and_color_stripe_restriction,
        )
        .set(
            "explicit_analog_television_output_restriction",
            Value::blocks(explicit.into_iter().collect()),
        )
        .set(
            "digital_video_only_content_restriction",
            right.digital_video_only_content_restriction,
        )
        .set(
            "image_constraint_for_analog_component_video_restriction",
            right.image_constraint_for_analog_component_video_restriction,
        )
        .set(
            "image_constraint_for_analog_computer_monitor_restriction",
            right.image_constraint_for_analog_computer_monitor_restriction,
        )
        .set_opt(
            "allow_passing_video_content_to_unknown_output",
            Some(right.allow_passing_video_content_to_unknown_output.clone())
                .filter(|s| !s.is_empty()),
        )
        .set_opt(
            "uncompressed_digital_video_opl",
            right.uncompressed_digital_video_opl,
        )
        .set_opt(
            "uncompressed_digital_audio_opl",
            right.uncompressed_digital_audio_opl,
        )
        .set_opt("compressed_digital_video_opl", right.compressed_digital_video_opl)
        .set_opt("compressed_digital_audio_opl", right.compressed_digital_audio_opl)
        .set_opt("analog_video_opl", right.analog_video_opl)
        .build()
}

fn flatten_license(license: &PlayReadyLicense) -> Attributes {
    let (from_header, key_id) = match &license.content_key_location {
        ContentKeyLocation::Header => (true, None),
        ContentKeyLocation::KeyIdentifier(k) => (false, Some(k.key_id.clone())),
        ContentKeyLocation::Unsupported => {
            warn!("PlayReady license uses a content key location that cannot be represented");
            (false, None)
        }
    };
    let play_right = license.play_right.iter().map(flatten_play_right).collect();
    AttributesBuilder::new()
        .set("allow_test_devices", license.allow_test_devices)
        .set_opt("begin_date", license.begin_date.as_deref().map(canonical_time))
        .set_opt(
            "expiration_date",
            license.expiration_date.as_deref().map(canonical_time),
        )
        .set_opt("relative_begin_date", license.relative_begin_date.clone())
        .set_opt(
            "relative_expiration_date",
            license.relative_expiration_date.clone(),
        )
        .set_opt("grace_period", license.grace_period.clone())
        .set("play_right", Value::blocks(play_right))
        .set("license_type", license.license_type.as_str())
        .set("content_key_location_from_header_enabled", from_header)
        .set_opt("content_key_location_from_key_id", key_id)
        .set("content_type", license.content_type.as_str())
        .set_opt("security_level", license.security_level.clone())
        .build()
}

fn flatten_fairplay(fairplay: &FairPlayKeyConfiguration) -> ProviderResult<Attributes> {
    let ask = STANDARD.decode(&fairplay.ask).map_err(|e| {
        ProviderError::new(format!("base64-decoding FairPlay ask {:?}", fairplay.ask)).with_cause(e)
    })?;
    let offline = fairplay.offline_rental_configuration.as_ref().map(|o| {
        AttributesBuilder::new()
            .set("playback_duration_seconds", o.playback_duration_seconds)
            .set("storage_duration_seconds", o.storage_duration_seconds)
            .build()
    });
    Ok(AttributesBuilder::new()
        .set("ask", hex::encode(ask))
        .set("pfx", fairplay.fair_play_pfx.as_str())
        .set("pfx_password", fairplay.fair_play_pfx_password.as_str())
        .set(
            "offline_rental_configuration",
            Value::blocks(offline.into_iter().collect()),
        )
        .set(
            "rental_and_lease_key_type",
            fairplay.rental_and_lease_key_type.as_str(),
        )
        .set("rental_duration_seconds", fairplay.rental_duration)
        .build())
}

/// Write a token key into `builder` under `<prefix>symmetric_token_key` and friends
fn flatten_token_key(
    builder: AttributesBuilder,
    prefix: &str,
    key: Option<&TokenKey>,
) -> AttributesBuilder {
    let name = |n: &str| format!("{}{}", prefix, n);
    match key {
        Some(TokenKey::Symmetric(k)) => builder.set(&name("symmetric_token_key"), k.key_value.as_str()),
        Some(TokenKey::Rsa(k)) => builder
            .set(&name("rsa_token_key_exponent"), k.exponent.as_str())
            .set(&name("rsa_token_key_modulus"), k.modulus.as_str()),
        Some(TokenKey::X509(k)) => builder.set(&name("x509_token_key_raw"), k.raw_body.as_str()),
        Some(TokenKey::Unsupported) => {
            warn!("token restriction uses a key type that cannot be represented");
            builder
        }
        None => builder,
    }
}

fn flatten_token_restriction(token: &TokenRestriction) -> Attributes {
    let alternate = token
        .alternate_verification_keys
        .iter()
        .flatten()
        .map(|key| flatten_token_key(AttributesBuilder::new(), "", Some(key)).build())
        .collect();
    let claims = token
        .required_claims
        .iter()
        .flatten()
        .map(|claim| {
            AttributesBuilder::new()
                .set_opt("type", claim.claim_type.clone())
                .set_opt("value", claim.claim_value.clone())
                .build()
        })
        .collect();
    let builder = AttributesBuilder::new()
        .set("alternate_key", Value::blocks(alternate))
        .set_opt("audience", Some(token.audience.clone()).filter(|s| !s.is_empty()))
        .set_opt("issuer", Some(token.issuer.clone()).filter(|s| !s.is_empty()))
        .set_opt(
            "token_type",
            Some(token.restriction_token_type.clone()).filter(|s| !s.is_empty()),
        )
        .set_opt(
            "open_id_connect_discovery_document",
            token.open_id_connect_discovery_document.clone(),
        )
        .set("required_claim", Value::blocks(claims));
    flatten_token_key(builder, "primary_", token.primary_verification_key.as_ref()).build()
}

fn flatten_option(option: &ContentKeyPolicyOption) -> ProviderResult<Attributes> {
    let mut builder = AttributesBuilder::new()
        .set_opt("name", option.name.clone())
        .set("clear_key_configuration_enabled", false)
        .set("fairplay_configuration", Value::List(vec![]))
        .set("playready_configuration_license", Value::List(vec![]))
        .set("open_restriction_enabled", false)
        .set("token_restriction", Value::List(vec![]));

    builder = match &option.configuration {
        KeyConfiguration::ClearKey => builder.set("clear_key_configuration_enabled", true),
        KeyConfiguration::Widevine(w) => {
            builder.set("widevine_configuration_template", w.widevine_template.as_str())
        }
        KeyConfiguration::PlayReady(p) => builder
            .set(
                "playready_configuration_license",
                Value::blocks(p.licenses.iter().map(flatten_license).collect()),
            )
            .set_opt("playready_response_custom_data", p.response_custom_data.clone()),
        KeyConfiguration::FairPlay(f) => {
            builder.set("fairplay_configuration", Value::block(flatten_fairplay(f)?))
        }
        KeyConfiguration::Unsupported => {
            warn!("policy option uses a configuration type that cannot be represented");
            builder
        }
    };

    builder = match &option.restriction {
        KeyRestriction::Open => builder.set("open_restriction_enabled", true),
        KeyRestriction::Token(t) => {
            builder.set("token_restriction", Value::block(flatten_token_restriction(t)))
        }
        KeyRestriction::Unsupported => {
            warn!("policy option uses a restriction type that cannot be represented");
            builder
        }
    };
    Ok(builder.build())
}

fn flatten(
    id: &ContentKeyPolicyId,
    properties: &ContentKeyPolicyProperties,
) -> ProviderResult<Attributes> {
    let options = properties
        .options
        .iter()
        .map(flatten_option)
        .collect::<ProviderResult<_>>()?;
    Ok(AttributesBuilder::new()
        .set("name", id.name.as_str())
        .set("media_services_account_name", id.account_name.as_str())
        .set("resource_group_name", id.resource_group.as_str())
        .set_opt("description", properties.description.clone())
        .set("policy_option", Value::blocks(options))
        .build())
}

// =============================================================================
// CRUD
// =============================================================================

impl MediaContentKeyPolicy {
    async fn read_id(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        id: &ContentKeyPolicyId,
    ) -> ProviderResult<State> {
        let properties: Option<ContentKeyPolicyProperties> =
            action_resource(ctx.client.as_ref(), &id.id(), SECRETS_ACTION, API_VERSION)
                .await
                .map_err(|e| remote_error(address, "retrieving", id, e))?;

        let Some(properties) = properties else {
            info!("{} was not found - removing from state", id);
            return Ok(State::not_found(address.clone()));
        };
        let attributes = flatten(id, &properties).map_err(|e| e.for_resource(address.clone()))?;
        Ok(State::existing(address.clone(), attributes).with_identifier(id.id()))
    }

    async fn create_or_update(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        id: &ContentKeyPolicyId,
        attributes: &Attributes,
    ) -> ProviderResult<State> {
        debug!("creating/updating {}", id);
        let payload = expand(attributes).map_err(|e| e.for_resource(address.clone()))?;
        let _: ContentKeyPolicy = put_resource(ctx.client.as_ref(), &id.id(), API_VERSION, &payload)
            .await
            .map_err(|e| remote_error(address, "creating/updating", id, e))?;
        self.read_id(ctx, address, id).await
    }
}

#[async_trait]
impl ResourceHandler for MediaContentKeyPolicy {
    fn type_name(&self) -> &'static str {
        "azurerm_media_content_key_policy"
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
        let id = ContentKeyPolicyId::try_new(
            &ctx.subscription_id,
            required_string(attributes, "resource_group_name")?,
            required_string(attributes, "media_services_account_name")?,
            required_string(attributes, "name")?,
        )
        .map_err(|e| invalid_id(address, e))?;
        require_absent(ctx.client.as_ref(), address, &id, API_VERSION).await?;
        self.create_or_update(ctx, address, &id, attributes).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<State> {
        let id: ContentKeyPolicyId = parse_id(address, identifier)?;
        self.read_id(ctx, address, &id).await
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
        attributes: &Attributes,
    ) -> ProviderResult<State> {
        let id: ContentKeyPolicyId = parse_id(address, identifier)?;
        self.create_or_update(ctx, address, &id, attributes).await
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id: ContentKeyPolicyId = parse_id(address, identifier)?;
        ctx.client
            .delete(&id.id(), API_VERSION)
            .await
            .map_err(|e| remote_error(address, "deleting", &id, e))
    }
}
