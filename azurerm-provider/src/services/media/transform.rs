//! azurerm_media_transform
//!
//! Each `output` block carries exactly one preset block; the preset travels
//! to ARM as an `@odata.type`-tagged union (see [`Preset`]). The
//! `custom_preset` block lives in [`super::encoder`].

use std::collections::HashMap;

use async_trait::async_trait;
use azurerm_core::arm_id::ArmResourceId;
use azurerm_core::attrs::{self, AttributesBuilder};
use azurerm_core::provider::ProviderResult;
use azurerm_core::resource::{Attributes, ResourceAddress, State, Value};
use azurerm_core::schema::types;
use azurerm_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema};
use log::{debug, info, warn};

use super::encoder;
use super::ids::TransformId;
use super::models::{
    AudioAnalyzerPreset, BuiltInStandardEncoderPreset, FaceDetectorPreset, PresetConfigurations,
    Preset, Transform, TransformOutput, TransformProperties, VideoAnalyzerPreset,
};
use super::validate;
use crate::client::{get_resource, put_resource};
use crate::resources::{ProviderContext, ResourceHandler};
use crate::utils::{invalid_id, parse_id, remote_error, require_absent, required_string};

const API_VERSION: &str = "2022-07-01";

const PRESET_BLOCKS: [&str; 5] = [
    "builtin_preset",
    "custom_preset",
    "face_detector_preset",
    "video_analyzer_preset",
    "audio_analyzer_preset",
];

const ENCODER_NAMED_PRESETS: &[&str] = &[
    "AACGoodQualityAudio",
    "AdaptiveStreaming",
    "ContentAwareEncoding",
    "ContentAwareEncodingExperimental",
    "CopyAllBitrateNonInterleaved",
    "H265AdaptiveStreaming",
    "H265ContentAwareEncoding",
    "H265SingleBitrate4K",
    "H265SingleBitrate1080p",
    "H265SingleBitrate720p",
    "H264MultipleBitrate1080p",
    "H264MultipleBitrateSD",
    "H264MultipleBitrate720p",
    "H264SingleBitrate1080p",
    "H264SingleBitrateSD",
    "H264SingleBitrate720p",
];

pub struct MediaTransform;

// =============================================================================
// Schema
// =============================================================================

fn experimental_options() -> AttributeSchema {
    AttributeSchema::new("experimental_options", types::tags())
}

fn preset_configuration_block() -> AttributeType {
    let non_negative = |name: &str| AttributeSchema::new(name, types::int_at_least(0));
    BlockSchema::new()
        .attribute(AttributeSchema::new(
            "complexity",
            types::one_of(&["Balanced", "Quality", "Speed"]),
        ))
        .attribute(AttributeSchema::new(
            "interleave_output",
            types::one_of(&["InterleavedOutput", "NonInterleavedOutput"]),
        ))
        .attribute(AttributeSchema::new(
            "key_frame_interval_in_seconds",
            types::float_at_least(0.0),
        ))
        .attribute(non_negative("max_bitrate_bps"))
        .attribute(non_negative("max_height"))
        .attribute(non_negative("max_layers"))
        .attribute(non_negative("min_bitrate_bps"))
        .attribute(non_negative("min_height"))
        .max_items(1)
        .into_type()
}

fn output_block() -> AttributeType {
    let audio_language = || AttributeSchema::new("audio_language", types::non_empty_string());
    let audio_analysis_mode = || {
        AttributeSchema::new("audio_analysis_mode", types::one_of(&["Basic", "Standard"]))
            .with_default("Standard")
    };

    BlockSchema::new()
        .attribute(
            AttributeSchema::new(
                "on_error_action",
                types::one_of(&["ContinueJob", "StopProcessingJob"]),
            )
            .with_default("StopProcessingJob"),
        )
        .attribute(
            AttributeSchema::new("relative_priority", types::one_of(&["High", "Low", "Normal"]))
                .with_default("Normal"),
        )
        .attribute(AttributeSchema::new(
            "builtin_preset",
            BlockSchema::new()
                .attribute(
                    AttributeSchema::new("preset_name", types::one_of(ENCODER_NAMED_PRESETS))
                        .required(),
                )
                .attribute(AttributeSchema::new(
                    "preset_configuration",
                    preset_configuration_block(),
                ))
                .max_items(1)
                .into_type(),
        ))
        .attribute(AttributeSchema::new(
            "custom_preset",
            encoder::custom_preset_block(),
        ))
        .attribute(AttributeSchema::new(
            "audio_analyzer_preset",
            BlockSchema::new()
                .attribute(audio_language())
                .attribute(audio_analysis_mode())
                .attribute(experimental_options())
                .max_items(1)
                .into_type(),
        ))
        .attribute(AttributeSchema::new(
            "video_analyzer_preset",
            BlockSchema::new()
                .attribute(audio_language())
                .attribute(audio_analysis_mode())
                .attribute(
                    AttributeSchema::new(
                        "insights_type",
                        types::one_of(&["AllInsights", "AudioInsightsOnly", "VideoInsightsOnly"]),
                    )
                    .with_default("AllInsights"),
                )
                .attribute(experimental_options())
                .max_items(1)
                .into_type(),
        ))
        .attribute(AttributeSchema::new(
            "face_detector_preset",
            BlockSchema::new()
                .attribute(
                    AttributeSchema::new(
                        "analysis_resolution",
                        types::one_of(&["SourceResolution", "StandardDefinition"]),
                    )
                    .with_default("SourceResolution"),
                )
                .attribute(AttributeSchema::new(
                    "blur_type",
                    types::one_of(&["Black", "Box", "High", "Low", "Med"]),
                ))
                .attribute(
                    AttributeSchema::new(
                        "face_redactor_mode",
                        types::one_of(&["Analyze", "Combined", "Redact"]),
                    )
                    .with_default("Analyze"),
                )
                .attribute(experimental_options())
                .max_items(1)
                .into_type(),
        ))
        .min_items(1)
        .into_type()
}

fn schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_media_transform")
        .with_description("Media Services transform")
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
        .attribute(AttributeSchema::new("output", output_block()))
}

fn validate_attributes(attributes: &Attributes) -> Vec<String> {
    let mut errors = Vec::new();
    for (index, output) in attrs::blocks(attributes, "output").into_iter().enumerate() {
        let presets = PRESET_BLOCKS
            .iter()
            .filter(|key| attrs::block(output, key).is_some())
            .count();
        match presets {
            0 => errors.push(format!(
                "output.{}: output must contain at least one type of preset: builtin_preset, custom_preset, face_detector_preset, video_analyzer_preset or audio_analyzer_preset",
                index
            )),
            1 => {}
            _ => errors.push(format!(
                "output.{}: more than one type of preset in the same output is not allowed",
                index
            )),
        }
        if let Some(preset) = attrs::block(output, "custom_preset") {
            let path = format!("output.{}.custom_preset.0", index);
            encoder::validate_custom_preset(&path, preset, &mut errors);
        }
    }
    errors
}

// =============================================================================
// Expand / Flatten
// =============================================================================

fn expand_experimental_options(block: &Attributes) -> Option<HashMap<String, String>> {
    let options = attrs::string_map(block, "experimental_options");
    (!options.is_empty()).then_some(options)
}

fn flatten_experimental_options(options: Option<&HashMap<String, String>>) -> Value {
    Value::string_map(options.into_iter().flatten().map(|(k, v)| (k.clone(), v.clone())))
}

fn optional_string(block: &Attributes, key: &str) -> Option<String> {
    attrs::non_empty_string(block, key).map(str::to_string)
}

fn expand_preset_configuration(block: &Attributes) -> Option<PresetConfigurations> {
    let config = attrs::block(block, "preset_configuration")?;
    Some(PresetConfigurations {
        complexity: optional_string(config, "complexity"),
        interleave_output: optional_string(config, "interleave_output"),
        key_frame_interval_in_seconds: attrs::float(config, "key_frame_interval_in_seconds"),
        max_bitrate_bps: attrs::int(config, "max_bitrate_bps"),
        max_height: attrs::int(config, "max_height"),
        max_layers: attrs::int(config, "max_layers"),
        min_bitrate_bps: attrs::int(config, "min_bitrate_bps"),
        min_height: attrs::int(config, "min_height"),
    })
}

fn flatten_preset_configuration(config: Option<&PresetConfigurations>) -> Value {
    let Some(config) = config else {
        return Value::List(vec![]);
    };
    Value::block(
        AttributesBuilder::new()
            .set_opt("complexity", config.complexity.clone())
            .set_opt("interleave_output", config.interleave_output.clone())
            .set_opt(
                "key_frame_interval_in_seconds",
                config.key_frame_interval_in_seconds,
            )
            .set_opt("max_bitrate_bps", config.max_bitrate_bps)
            .set_opt("max_height", config.max_height)
            .set_opt("max_layers", config.max_layers)
            .set_opt("min_bitrate_bps", config.min_bitrate_bps)
            .set_opt("min_height", config.min_height)
            .build(),
    )
}

/// The single preset block of an output; `None` when validation was skipped
fn expand_preset(output: &Attributes) -> Option<Preset> {
    if let Some(block) = attrs::block(output, "builtin_preset") {
        return Some(Preset::BuiltInStandardEncoder(BuiltInStandardEncoderPreset {
            preset_name: attrs::string(block, "preset_name")
                .unwrap_or_default()
                .to_string(),
            configurations: expand_preset_configuration(block),
        }));
    }
    if let Some(block) = attrs::block(output, "custom_preset") {
        return Some(Preset::StandardEncoder(encoder::expand_custom_preset(block)));
    }
    if let Some(block) = attrs::block(output, "audio_analyzer_preset") {
        return Some(Preset::AudioAnalyzer(AudioAnalyzerPreset {
            audio_language: optional_string(block, "audio_language"),
            mode: optional_string(block, "audio_analysis_mode"),
            experimental_options: expand_experimental_options(block),
        }));
    }
    if let Some(block) = attrs::block(output, "video_analyzer_preset") {
        return Some(Preset::VideoAnalyzer(VideoAnalyzerPreset {
            audio_language: optional_string(block, "audio_language"),
            mode: optional_string(block, "audio_analysis_mode"),
            experimental_options: expand_experimental_options(block),
            insights_to_extract: optional_string(block, "insights_type"),
        }));
    }
    if let Some(block) = attrs::block(output, "face_detector_preset") {
        return Some(Preset::FaceDetector(FaceDetectorPreset {
            resolution: optional_string(block, "analysis_resolution"),
            blur_type: optional_string(block, "blur_type"),
            mode: optional_string(block, "face_redactor_mode"),
            experimental_options: expand_experimental_options(block),
        }));
    }
    None
}

fn expand_outputs(attributes: &Attributes) -> Vec<TransformOutput> {
    attrs::blocks(attributes, "output")
        .into_iter()
        .filter_map(|output| {
            Some(TransformOutput {
                on_error: optional_string(output, "on_error_action"),
                relative_priority: optional_string(output, "relative_priority"),
                preset: expand_preset(output)?,
            })
        })
        .collect()
}

fn flatten_output(output: &TransformOutput) -> Attributes {
    let mut builder = AttributesBuilder::new()
        .set_opt("on_error_action", output.on_error.clone())
        .set_opt("relative_priority", output.relative_priority.clone());
    for key in PRESET_BLOCKS {
        builder = builder.set(key, Value::List(vec![]));
    }

    match &output.preset {
        Preset::BuiltInStandardEncoder(preset) => builder.set(
            "builtin_preset",
            Value::block(
                AttributesBuilder::new()
                    .set("preset_name", preset.preset_name.as_str())
                    .set(
                        "preset_configuration",
                        flatten_preset_configuration(preset.configurations.as_ref()),
                    )
                    .build(),
            ),
        ),
        Preset::StandardEncoder(preset) => {
            builder.set("custom_preset", encoder::flatten_custom_preset(preset))
        }
        Preset::AudioAnalyzer(preset) => builder.set(
            "audio_analyzer_preset",
            Value::block(
                AttributesBuilder::new()
                    .set_opt("audio_language", preset.audio_language.clone())
                    .set_opt("audio_analysis_mode", preset.mode.clone())
                    .set(
                        "experimental_options",
                        flatten_experimental_options(preset.experimental_options.as_ref()),
                    )
                    .build(),
            ),
        ),
        Preset::VideoAnalyzer(preset) => builder.set(
            "video_analyzer_preset",
            Value::block(
                AttributesBuilder::new()
                    .set_opt("audio_language", preset.audio_language.clone())
                    .set_opt("audio_analysis_mode", preset.mode.clone())
                    .set_opt("insights_type", preset.insights_to_extract.clone())
                    .set(
                        "experimental_options",
                        flatten_experimental_options(preset.experimental_options.as_ref()),
                    )
                    .build(),
            ),
        ),
        Preset::FaceDetector(preset) => builder.set(
            "face_detector_preset",
            Value::block(
                AttributesBuilder::new()
                    .set_opt("analysis_resolution", preset.resolution.clone())
                    .set_opt("blur_type", preset.blur_type.clone())
                    .set_opt("face_redactor_mode", preset.mode.clone())
                    .set(
                        "experimental_options",
                        flatten_experimental_options(preset.experimental_options.as_ref()),
                    )
                    .build(),
            ),
        ),
        Preset::Unsupported => {
            warn!("transform output uses a preset type that cannot be represented");
            builder
        }
    }
    .build()
}

fn expand(attributes: &Attributes) -> Transform {
    Transform {
        properties: TransformProperties {
            description: optional_string(attributes, "description"),
            outputs: expand_outputs(attributes),
        },
    }
}

fn flatten(id: &TransformId, model: &Transform) -> Attributes {
    AttributesBuilder::new()
        .set("name", id.name.as_str())
        .set("media_services_account_name", id.account_name.as_str())
        .set("resource_group_name", id.resource_group.as_str())
        .set_opt("description", model.properties.description.clone())
        .set(
            "output",
            Value::blocks(model.properties.outputs.iter().map(flatten_output).collect()),
        )
        .build()
}

// =============================================================================
// CRUD
// =============================================================================

impl MediaTransform {
    async fn read_id(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        id: &TransformId,
    ) -> ProviderResult<State> {
        let model: Option<Transform> = get_resource(ctx.client.as_ref(), &id.id(), API_VERSION)
            .await
            .map_err(|e| remote_error(address, "retrieving", id, e))?;

        let Some(model) = model else {
            info!("{} was not found - removing from state", id);
            return Ok(State::not_found(address.clone()));
        };
        Ok(State::existing(address.clone(), flatten(id, &model)).with_identifier(id.id()))
    }

    async fn create_or_update(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        id: &TransformId,
        attributes: &Attributes,
    ) -> ProviderResult<State> {
        debug!("creating/updating {}", id);
        let _: Transform =
            put_resource(ctx.client.as_ref(), &id.id(), API_VERSION, &expand(attributes))
                .await
                .map_err(|e| remote_error(address, "creating/updating", id, e))?;
        self.read_id(ctx, address, id).await
    }
}

#[async_trait]
impl ResourceHandler for MediaTransform {
    fn type_name(&self) -> &'static str {
        "azurerm_media_transform"
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
        let id = TransformId::try_new(
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
        let id: TransformId = parse_id(address, identifier)?;
        self.read_id(ctx, address, &id).await
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
        attributes: &Attributes,
    ) -> ProviderResult<State> {
        let id: TransformId = parse_id(address, identifier)?;
        self.create_or_update(ctx, address, &id, attributes).await
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        address: &ResourceAddress,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id: TransformId = parse_id(address, identifier)?;
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
        ResourceAddress::new("azurerm_media_transform", "example")
    }

    fn output(preset_key: &str, preset: Attributes) -> Attributes {
        AttributesBuilder::new()
            .set(preset_key, Value::block(preset))
            .build()
    }

    fn config(outputs: Vec<Attributes>) -> Attributes {
        AttributesBuilder::new()
            .set("name", "transform1")
            .set("resource_group_name", "rg")
            .set("media_services_account_name", "mediaacct")
            .set("description", "Example transform")
            .set("output", Value::blocks(outputs))
            .build()
    }

    fn builtin(name: &str) -> Attributes {
        AttributesBuilder::new().set("preset_name", name).build()
    }

    #[test]
    fn defaults_fill_output_and_preset() {
        let mut attributes = config(vec![output(
            "video_analyzer_preset",
            AttributesBuilder::new().set("audio_language", "en-US").build(),
        )]);
        let schema = schema();
        schema.apply_defaults(&mut attributes);
        assert!(schema.validate(&attributes).is_ok());

        let out = attrs::blocks(&attributes, "output")[0];
        assert_eq!(out["on_error_action"], Value::from("StopProcessingJob"));
        assert_eq!(out["relative_priority"], Value::from("Normal"));
        let preset = attrs::block(out, "video_analyzer_preset").unwrap();
        assert_eq!(preset["insights_type"], Value::from("AllInsights"));
        assert_eq!(preset["audio_analysis_mode"], Value::from("Standard"));
    }

    #[test]
    fn schema_rejects_bad_values() {
        let attributes = config(vec![output("builtin_preset", builtin("NotAPreset"))]);
        assert!(schema().validate(&attributes).is_err());

        let mut attributes = config(vec![output("builtin_preset", builtin("AdaptiveStreaming"))]);
        attributes.insert("name".to_string(), Value::from("bad name!"));
        assert!(schema().validate(&attributes).is_err());

        let attributes = config(vec![]);
        assert!(schema().validate(&attributes).is_err());
    }

    #[test]
    fn output_needs_exactly_one_preset() {
        let errors = validate_attributes(&config(vec![AttributesBuilder::new().build()]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least one type of preset"));

        let mut two = output("builtin_preset", builtin("AdaptiveStreaming"));
        two.insert(
            "face_detector_preset".to_string(),
            Value::block(AttributesBuilder::new().build()),
        );
        let errors = validate_attributes(&config(vec![two]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("more than one type of preset"));

        let one = output("builtin_preset", builtin("AdaptiveStreaming"));
        assert!(validate_attributes(&config(vec![one])).is_empty());
    }

    #[test]
    fn expand_tags_each_preset() {
        let mut builtin_with_config = builtin("H264MultipleBitrate1080p");
        builtin_with_config.insert(
            "preset_configuration".to_string(),
            Value::block(
                AttributesBuilder::new()
                    .set("complexity", "Speed")
                    .set("key_frame_interval_in_seconds", 2.5)
                    .set("max_height", 720)
                    .build(),
            ),
        );
        let face = AttributesBuilder::new()
            .set("blur_type", "Med")
            .set("face_redactor_mode", "Redact")
            .set("experimental_options", Value::string_map([("k", "v")]))
            .build();

        let body = serde_json::to_value(expand(&config(vec![
            output("builtin_preset", builtin_with_config),
            output("face_detector_preset", face),
        ])))
        .unwrap();

        assert_eq!(
            body["properties"]["outputs"][0]["preset"],
            json!({
                "@odata.type": "#Microsoft.Media.BuiltInStandardEncoderPreset",
                "presetName": "H264MultipleBitrate1080p",
                "configurations": {
                    "complexity": "Speed",
                    "keyFrameIntervalInSeconds": 2.5,
                    "maxHeight": 720
                }
            })
        );
        assert_eq!(
            body["properties"]["outputs"][1]["preset"],
            json!({
                "@odata.type": "#Microsoft.Media.FaceDetectorPreset",
                "blurType": "Med",
                "mode": "Redact",
                "experimentalOptions": {"k": "v"}
            })
        );
        assert_eq!(body["properties"]["description"], json!("Example transform"));
    }

    #[test]
    fn flatten_maps_audio_preset_back() {
        let model: Transform = serde_json::from_value(json!({
            "properties": {
                "outputs": [{
                    "onError": "ContinueJob",
                    "relativePriority": "High",
                    "preset": {
                        "@odata.type": "#Microsoft.Media.AudioAnalyzerPreset",
                        "audioLanguage": "en-US",
                        "mode": "Basic"
                    }
                }]
            }
        }))
        .unwrap();
        let id = TransformId::new("sub", "rg", "acct", "t1");
        let attributes = flatten(&id, &model);

        assert_eq!(attributes["media_services_account_name"], Value::from("acct"));
        let out = attrs::blocks(&attributes, "output")[0];
        assert_eq!(out["on_error_action"], Value::from("ContinueJob"));
        let preset = attrs::block(out, "audio_analyzer_preset").unwrap();
        assert_eq!(preset["audio_analysis_mode"], Value::from("Basic"));
        assert!(attrs::block(out, "builtin_preset").is_none());
    }

    #[test]
    fn custom_preset_codec_errors_carry_output_path() {
        let preset = AttributesBuilder::new()
            .set("codec", Value::blocks(vec![AttributesBuilder::new().build()]))
            .set(
                "format",
                Value::blocks(vec![output(
                    "mp4",
                    AttributesBuilder::new().set("filename_pattern", "{Basename}").build(),
                )]),
            )
            .build();
        let errors = validate_attributes(&config(vec![output("custom_preset", preset)]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("output.0.custom_preset.0.codec.0:"));
    }

    #[test]
    fn custom_preset_expands_to_standard_encoder() {
        let preset = AttributesBuilder::new()
            .set(
                "codec",
                Value::blocks(vec![output(
                    "copy_audio",
                    AttributesBuilder::new().set("label", "audio").build(),
                )]),
            )
            .set(
                "format",
                Value::blocks(vec![output(
                    "mp4",
                    AttributesBuilder::new().set("filename_pattern", "{Basename}{Extension}").build(),
                )]),
            )
            .build();
        let body = serde_json::to_value(expand(&config(vec![output("custom_preset", preset)])))
            .unwrap();

        assert_eq!(
            body["properties"]["outputs"][0]["preset"],
            json!({
                "@odata.type": "#Microsoft.Media.StandardEncoderPreset",
                "codecs": [{"@odata.type": "#Microsoft.Media.CopyAudio", "label": "audio"}],
                "formats": [{
                    "@odata.type": "#Microsoft.Media.Mp4Format",
                    "filenamePattern": "{Basename}{Extension}"
                }]
            })
        );
    }

    #[test]
    fn flatten_maps_standard_encoder_to_custom_preset() {
        let model: Transform = serde_json::from_value(json!({
            "properties": {
                "outputs": [{
                    "preset": {
                        "@odata.type": "#Microsoft.Media.StandardEncoderPreset",
                        "codecs": [{"@odata.type": "#Microsoft.Media.CopyVideo"}],
                        "formats": [{
                            "@odata.type": "#Microsoft.Media.TransportStreamFormat",
                            "filenamePattern": "{Basename}.ts"
                        }]
                    }
                }]
            }
        }))
        .unwrap();
        let attributes = flatten(&TransformId::new("sub", "rg", "acct", "t1"), &model);

        let out = attrs::blocks(&attributes, "output")[0];
        assert!(attrs::block(out, "builtin_preset").is_none());
        let preset = attrs::block(out, "custom_preset").unwrap();
        let codec = attrs::blocks(preset, "codec")[0];
        assert!(attrs::block(codec, "copy_video").is_some());
        let format = attrs::blocks(preset, "format")[0];
        assert_eq!(
            attrs::block(format, "transport_stream").unwrap()["filename_pattern"],
            Value::from("{Basename}.ts")
        );
    }

    #[test]
    fn unsupported_preset_flattens_without_preset_blocks() {
        let output = TransformOutput {
            on_error: None,
            relative_priority: None,
            preset: Preset::Unsupported,
        };
        let flattened = flatten_output(&output);
        assert!(PRESET_BLOCKS.iter().all(|k| attrs::block(&flattened, k).is_none()));
    }

    #[tokio::test]
    async fn create_read_delete() {
        let client = Arc::new(MockArmClient::new());
        let ctx = ProviderContext::new("sub", client.clone());
        let mut attributes = config(vec![output("builtin_preset", builtin("AdaptiveStreaming"))]);
        schema().apply_defaults(&mut attributes);

        let state = MediaTransform.create(&ctx, &address(), &attributes).await.unwrap();
        let id = TransformId::new("sub", "rg", "mediaacct", "transform1");
        assert_eq!(state.identifier.as_deref(), Some(id.id().as_str()));
        let out = attrs::blocks(&state.attributes, "output")[0];
        assert_eq!(
            attrs::block(out, "builtin_preset").unwrap()["preset_name"],
            Value::from("AdaptiveStreaming")
        );

        let err = MediaTransform
            .create(&ctx, &address(), &attributes)
            .await
            .unwrap_err();
        assert!(err.message.contains("already exists"));

        MediaTransform.delete(&ctx, &address(), &id.id()).await.unwrap();
        let state = MediaTransform.read(&ctx, &address(), &id.id()).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn read_rejects_foreign_id() {
        let client = Arc::new(MockArmClient::new());
        let ctx = ProviderContext::new("sub", client);
        let err = MediaTransform
            .read(
                &ctx,
                &address(),
                "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Media/mediaServices/acct",
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, azurerm_core::provider::ErrorKind::Validation);
    }
}
