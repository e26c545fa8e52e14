//! `custom_preset` block of azurerm_media_transform
//!
//! A custom preset is a list of codecs, each producing labelled tracks, and a
//! list of formats that mux those tracks into output files. Every `codec` and
//! `format` item holds exactly one typed block.

use azurerm_core::attrs::{self, AttributesBuilder};
use azurerm_core::resource::{Attributes, Value};
use azurerm_core::schema::types;
use azurerm_core::schema::{AttributeSchema, AttributeType, BlockSchema};
use log::warn;

use super::models::{
    AacAudio, Codec, CopyCodec, DdAudio, Deinterlace, Fade, Filters, Format, MultiBitrateFormat,
    OutputFile, Rectangle, StandardEncoderPreset, VideoCodec, VideoLayer,
};

const CODEC_BLOCKS: [&str; 6] = [
    "aac_audio",
    "copy_audio",
    "copy_video",
    "dd_audio",
    "h264_video",
    "h265_video",
];

const FORMAT_BLOCKS: [&str; 2] = ["mp4", "transport_stream"];

// =============================================================================
// Schema
// =============================================================================

fn label() -> AttributeSchema {
    AttributeSchema::new("label", types::non_empty_string())
}

fn audio_block(default_bitrate: i64, sampling_rate: (i64, i64), aac: bool) -> AttributeType {
    let mut block = BlockSchema::new()
        .attribute(label())
        .attribute(
            AttributeSchema::new("bitrate", types::int_at_least(1)).with_default(default_bitrate),
        )
        .attribute(AttributeSchema::new("channels", types::int_between(1, 6)).with_default(2))
        .attribute(
            AttributeSchema::new(
                "sampling_rate",
                types::int_between(sampling_rate.0, sampling_rate.1),
            )
            .with_default(48000),
        );
    if aac {
        block = block.attribute(
            AttributeSchema::new("profile", types::one_of(&["AacLc", "HeAacV1", "HeAacV2"]))
                .with_default("AacLc"),
        );
    }
    block.max_items(1).into_type()
}

fn copy_block() -> AttributeType {
    BlockSchema::new().attribute(label()).max_items(1).into_type()
}

fn layer_block(h264: bool) -> AttributeType {
    let profiles: &[&str] = if h264 {
        &["Auto", "Baseline", "High", "High422", "High444", "Main"]
    } else {
        &["Auto", "Main", "Main10"]
    };
    let mut block = BlockSchema::new()
        .attribute(AttributeSchema::new("bitrate", types::int_at_least(1)).required())
        .attribute(label())
        .attribute(AttributeSchema::new("adaptive_b_frame_enabled", AttributeType::Bool).with_default(true))
        .attribute(AttributeSchema::new("b_frames", types::int_at_least(0)).remote_default())
        .attribute(AttributeSchema::new("buffer_window", types::non_empty_string()).with_default("PT5S"))
        .attribute(
            AttributeSchema::new("crf", types::float_at_least(0.0))
                .with_default(if h264 { 23.0 } else { 28.0 }),
        )
        .attribute(AttributeSchema::new("frame_rate", types::non_empty_string()))
        .attribute(AttributeSchema::new("height", types::non_empty_string()).remote_default())
        .attribute(AttributeSchema::new("width", types::non_empty_string()).remote_default())
        .attribute(AttributeSchema::new("level", types::non_empty_string()).with_default("auto"))
        .attribute(AttributeSchema::new("max_bitrate", types::int_at_least(1)).remote_default())
        .attribute(AttributeSchema::new("profile", types::one_of(profiles)).with_default("Auto"))
        .attribute(AttributeSchema::new("reference_frames", types::int_at_least(0)).remote_default())
        .attribute(AttributeSchema::new("slices", types::int_at_least(0)).remote_default());
    if h264 {
        block = block.attribute(
            AttributeSchema::new("entropy_mode", types::one_of(&["Cabac", "Cavlc"])).remote_default(),
        );
    }
    block.min_items(1).into_type()
}

fn video_block(h264: bool) -> AttributeType {
    let mut block = BlockSchema::new()
        .attribute(label())
        .attribute(
            AttributeSchema::new("complexity", types::one_of(&["Balanced", "Quality", "Speed"]))
                .with_default("Balanced"),
        )
        .attribute(
            AttributeSchema::new("key_frame_interval", types::non_empty_string())
                .with_default("PT2S"),
        )
        .attribute(AttributeSchema::new("layer", layer_block(h264)))
        .attribute(
            AttributeSchema::new("scene_change_detection_enabled", AttributeType::Bool)
                .with_default(false),
        )
        .attribute(
            AttributeSchema::new("stretch_mode", types::one_of(&["AutoFit", "AutoSize", "None"]))
                .with_default("AutoSize"),
        )
        .attribute(
            AttributeSchema::new("sync_mode", types::one_of(&["Auto", "Cfr", "Passthrough", "Vfr"]))
                .with_default("Auto"),
        );
    if h264 {
        block = block.attribute(
            AttributeSchema::new("rate_control_mode", types::one_of(&["ABR", "CBR", "CRF"]))
                .with_default("ABR"),
        );
    }
    block.max_items(1).into_type()
}

fn multi_bitrate_format_block() -> AttributeType {
    BlockSchema::new()
        .attribute(AttributeSchema::new("filename_pattern", types::non_empty_string()).required())
        .attribute(AttributeSchema::new(
            "output_file",
            BlockSchema::new()
                .attribute(AttributeSchema::new("labels", types::string_list()).required())
                .min_items(1)
                .into_type(),
        ))
        .max_items(1)
        .into_type()
}

fn fade_block() -> AttributeType {
    BlockSchema::new()
        .attribute(AttributeSchema::new("duration", types::non_empty_string()).required())
        .attribute(AttributeSchema::new("fade_color", types::non_empty_string()).required())
        .attribute(AttributeSchema::new("start", types::non_empty_string()).with_default("0"))
        .max_items(1)
        .into_type()
}

fn filter_block() -> AttributeType {
    let edge = |name: &str| AttributeSchema::new(name, types::non_empty_string());
    BlockSchema::new()
        .attribute(AttributeSchema::new(
            "crop_rectangle",
            BlockSchema::new()
                .attribute(edge("left"))
                .attribute(edge("top"))
                .attribute(edge("width"))
                .attribute(edge("height"))
                .max_items(1)
                .into_type(),
        ))
        .attribute(AttributeSchema::new(
            "deinterlace",
            BlockSchema::new()
                .attribute(
                    AttributeSchema::new(
                        "parity",
                        types::one_of(&["Auto", "BottomFieldFirst", "TopFieldFirst"]),
                    )
                    .with_default("Auto"),
                )
                .attribute(
                    AttributeSchema::new("mode", types::one_of(&["AutoPixelAdaptive", "Off"]))
                        .with_default("AutoPixelAdaptive"),
                )
                .max_items(1)
                .into_type(),
        ))
        .attribute(AttributeSchema::new("fade_in", fade_block()))
        .attribute(AttributeSchema::new("fade_out", fade_block()))
        .attribute(
            AttributeSchema::new(
                "rotation",
                types::one_of(&["Auto", "None", "Rotate0", "Rotate90", "Rotate180", "Rotate270"]),
            )
            .with_default("Auto"),
        )
        .max_items(1)
        .into_type()
}

pub(super) fn custom_preset_block() -> AttributeType {
    BlockSchema::new()
        .attribute(
            AttributeSchema::new(
                "codec",
                BlockSchema::new()
                    .attribute(AttributeSchema::new("aac_audio", audio_block(128_000, (11025, 96000), true)))
                    .attribute(AttributeSchema::new("dd_audio", audio_block(192_000, (32000, 48000), false)))
                    .attribute(AttributeSchema::new("copy_audio", copy_block()))
                    .attribute(AttributeSchema::new("copy_video", copy_block()))
                    .attribute(AttributeSchema::new("h264_video", video_block(true)))
                    .attribute(AttributeSchema::new("h265_video", video_block(false)))
                    .min_items(1)
                    .into_type(),
            )
            .required(),
        )
        .attribute(
            AttributeSchema::new(
                "format",
                BlockSchema::new()
                    .attribute(AttributeSchema::new("mp4", multi_bitrate_format_block()))
                    .attribute(AttributeSchema::new("transport_stream", multi_bitrate_format_block()))
                    .min_items(1)
                    .into_type(),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("filter", filter_block()))
        .attribute(AttributeSchema::new("experimental_options", types::tags()))
        .max_items(1)
        .into_type()
}

/// Check that every codec and format item holds exactly one typed block
pub(super) fn validate_custom_preset(path: &str, preset: &Attributes, errors: &mut Vec<String>) {
    let mut exactly_one = |key: &str, kinds: &[&str]| {
        for (index, item) in attrs::blocks(preset, key).into_iter().enumerate() {
            match kinds.iter().filter(|k| attrs::block(item, k).is_some()).count() {
                0 => errors.push(format!(
                    "{}.{}.{}: custom preset {} must contain one of: {}",
                    path,
                    key,
                    index,
                    key,
                    kinds.join(", ")
                )),
                1 => {}
                _ => errors.push(format!(
                    "{}.{}.{}: more than one type of {} in the same custom preset {} is not allowed",
                    path, key, index, key, key
                )),
            }
        }
    };
    exactly_one("codec", &CODEC_BLOCKS);
    exactly_one("format", &FORMAT_BLOCKS);
}

// =============================================================================
// Expand
// =============================================================================

fn optional_string(block: &Attributes, key: &str) -> Option<String> {
    attrs::non_empty_string(block, key).map(str::to_string)
}

fn positive(block: &Attributes, key: &str) -> Option<i64> {
    attrs::int(block, key).filter(|v| *v != 0)
}

fn expand_layer(layer: &Attributes) -> VideoLayer {
    VideoLayer {
        bitrate: attrs::int(layer, "bitrate").unwrap_or_default(),
        label: optional_string(layer, "label"),
        width: optional_string(layer, "width"),
        height: optional_string(layer, "height"),
        max_bitrate: positive(layer, "max_bitrate"),
        b_frames: positive(layer, "b_frames"),
        frame_rate: optional_string(layer, "frame_rate"),
        slices: positive(layer, "slices"),
        adaptive_b_frame: attrs::bool(layer, "adaptive_b_frame_enabled"),
        profile: optional_string(layer, "profile"),
        level: optional_string(layer, "level"),
        buffer_window: optional_string(layer, "buffer_window"),
        crf: attrs::float(layer, "crf").filter(|v| *v != 0.0),
        reference_frames: positive(layer, "reference_frames"),
        entropy_mode: optional_string(layer, "entropy_mode"),
    }
}

fn expand_video(block: &Attributes) -> VideoCodec {
    let layers: Vec<VideoLayer> = attrs::blocks(block, "layer")
        .into_iter()
        .map(expand_layer)
        .collect();
    VideoCodec {
        label: optional_string(block, "label"),
        key_frame_interval: optional_string(block, "key_frame_interval"),
        stretch_mode: optional_string(block, "stretch_mode"),
        sync_mode: optional_string(block, "sync_mode"),
        complexity: optional_string(block, "complexity"),
        rate_control_mode: optional_string(block, "rate_control_mode"),
        scene_change_detection: attrs::bool(block, "scene_change_detection_enabled"),
        layers: (!layers.is_empty()).then_some(layers),
    }
}

fn expand_codec(item: &Attributes) -> Option<Codec> {
    if let Some(b) = attrs::block(item, "aac_audio") {
        return Some(Codec::AacAudio(AacAudio {
            label: optional_string(b, "label"),
            bitrate: positive(b, "bitrate"),
            channels: positive(b, "channels"),
            sampling_rate: positive(b, "sampling_rate"),
            profile: optional_string(b, "profile"),
        }));
    }
    if let Some(b) = attrs::block(item, "dd_audio") {
        return Some(Codec::DdAudio(DdAudio {
            label: optional_string(b, "label"),
            bitrate: positive(b, "bitrate"),
            channels: positive(b, "channels"),
            sampling_rate: positive(b, "sampling_rate"),
        }));
    }
    let copy = |b: &Attributes| CopyCodec {
        label: optional_string(b, "label"),
    };
    if let Some(b) = attrs::block(item, "copy_audio") {
        return Some(Codec::CopyAudio(copy(b)));
    }
    if let Some(b) = attrs::block(item, "copy_video") {
        return Some(Codec::CopyVideo(copy(b)));
    }
    if let Some(b) = attrs::block(item, "h264_video") {
        return Some(Codec::H264Video(expand_video(b)));
    }
    if let Some(b) = attrs::block(item, "h265_video") {
        let mut video = expand_video(b);
        video.rate_control_mode = None;
        if let Some(layers) = video.layers.as_mut() {
            layers.iter_mut().for_each(|l| l.entropy_mode = None);
        }
        return Some(Codec::H265Video(video));
    }
    None
}

fn expand_multi_bitrate_format(block: &Attributes) -> MultiBitrateFormat {
    let output_files: Vec<OutputFile> = attrs::blocks(block, "output_file")
        .into_iter()
        .map(|file| OutputFile {
            labels: attrs::string_list(file, "labels"),
        })
        .collect();
    MultiBitrateFormat {
        filename_pattern: attrs::string(block, "filename_pattern")
            .unwrap_or_default()
            .to_string(),
        output_files: (!output_files.is_empty()).then_some(output_files),
    }
}

fn expand_format(item: &Attributes) -> Option<Format> {
    if let Some(b) = attrs::block(item, "mp4") {
        return Some(Format::Mp4(expand_multi_bitrate_format(b)));
    }
    attrs::block(item, "transport_stream")
        .map(|b| Format::TransportStream(expand_multi_bitrate_format(b)))
}

fn expand_fade(block: Option<&Attributes>) -> Option<Fade> {
    let block = block?;
    Some(Fade {
        duration: attrs::string(block, "duration").unwrap_or_default().to_string(),
        fade_color: attrs::string(block, "fade_color").unwrap_or_default().to_string(),
        start: optional_string(block, "start"),
    })
}

fn expand_filters(preset: &Attributes) -> Option<Filters> {
    let filter = attrs::block(preset, "filter")?;
    Some(Filters {
        crop: attrs::block(filter, "crop_rectangle").map(|b| Rectangle {
            left: optional_string(b, "left"),
            top: optional_string(b, "top"),
            width: optional_string(b, "width"),
            height: optional_string(b, "height"),
        }),
        deinterlace: attrs::block(filter, "deinterlace").map(|b| Deinterlace {
            parity: optional_string(b, "parity"),
            mode: optional_string(b, "mode"),
        }),
        fade_in: expand_fade(attrs::block(filter, "fade_in")),
        fade_out: expand_fade(attrs::block(filter, "fade_out")),
        rotation: optional_string(filter, "rotation"),
    })
}

pub(super) fn expand_custom_preset(preset: &Attributes) -> StandardEncoderPreset {
    let options = attrs::string_map(preset, "experimental_options");
    StandardEncoderPreset {
        codecs: attrs::blocks(preset, "codec")
            .into_iter()
            .filter_map(expand_codec)
            .collect(),
        formats: attrs::blocks(preset, "format")
            .into_iter()
            .filter_map(expand_format)
            .collect(),
        filters: expand_filters(preset),
        experimental_options: (!options.is_empty()).then_some(options),
    }
}

// =============================================================================
// Flatten
// =============================================================================

fn optional_block(attributes: Option<Attributes>) -> Value {
    Value::blocks(attributes.into_iter().collect())
}

fn flatten_layer(layer: &VideoLayer) -> Attributes {
    AttributesBuilder::new()
        .set("bitrate", layer.bitrate)
        .set_opt("label", layer.label.clone())
        .set_opt("width", layer.width.clone())
        .set_opt("height", layer.height.clone())
        .set_opt("max_bitrate", layer.max_bitrate)
        .set_opt("b_frames", layer.b_frames)
        .set_opt("frame_rate", layer.frame_rate.clone())
        .set_opt("slices", layer.slices)
        .set_opt("adaptive_b_frame_enabled", layer.adaptive_b_frame)
        .set_opt("profile", layer.profile.clone())
        .set_opt("level", layer.level.clone())
        .set_opt("buffer_window", layer.buffer_window.clone())
        .set_opt("crf", layer.crf)
        .set_opt("reference_frames", layer.reference_frames)
        .set_opt("entropy_mode", layer.entropy_mode.clone())
        .build()
}

fn flatten_video(video: &VideoCodec) -> Attributes {
    let layers = video.layers.iter().flatten().map(flatten_layer).collect();
    AttributesBuilder::new()
        .set_opt("label", video.label.clone())
        .set_opt("key_frame_interval", video.key_frame_interval.clone())
        .set_opt("stretch_mode", video.stretch_mode.clone())
        .set_opt("sync_mode", video.sync_mode.clone())
        .set_opt("complexity", video.complexity.clone())
        .set_opt("rate_control_mode", video.rate_control_mode.clone())
        .set_opt("scene_change_detection_enabled", video.scene_change_detection)
        .set("layer", Value::blocks(layers))
        .build()
}

fn flatten_codec(codec: &Codec) -> Option<Attributes> {
    let (key, block) = match codec {
        Codec::AacAudio(a) => (
            "aac_audio",
            AttributesBuilder::new()
                .set_opt("label", a.label.clone())
                .set_opt("bitrate", a.bitrate)
                .set_opt("channels", a.channels)
                .set_opt("sampling_rate", a.sampling_rate)
                .set_opt("profile", a.profile.clone())
                .build(),
        ),
        Codec::DdAudio(a) => (
            "dd_audio",
            AttributesBuilder::new()
                .set_opt("label", a.label.clone())
                .set_opt("bitrate", a.bitrate)
                .set_opt("channels", a.channels)
                .set_opt("sampling_rate", a.sampling_rate)
                .build(),
        ),
        Codec::CopyAudio(c) => (
            "copy_audio",
            AttributesBuilder::new().set_opt("label", c.label.clone()).build(),
        ),
        Codec::CopyVideo(c) => (
            "copy_video",
            AttributesBuilder::new().set_opt("label", c.label.clone()).build(),
        ),
        Codec::H264Video(v) => ("h264_video", flatten_video(v)),
        Codec::H265Video(v) => ("h265_video", flatten_video(v)),
        Codec::Unsupported => {
            warn!("custom preset uses a codec type that cannot be represented");
            return None;
        }
    };

    let mut item = AttributesBuilder::new();
    for kind in CODEC_BLOCKS {
        item = item.set(kind, Value::List(vec![]));
    }
    Some(item.set(key, Value::block(block)).build())
}

fn flatten_format(format: &Format) -> Option<Attributes> {
    let (key, f) = match format {
        Format::Mp4(f) => ("mp4", f),
        Format::TransportStream(f) => ("transport_stream", f),
        Format::Unsupported => {
            warn!("custom preset uses a format type that cannot be represented");
            return None;
        }
    };
    let files = f
        .output_files
        .iter()
        .flatten()
        .map(|file| {
            AttributesBuilder::new()
                .set("labels", Value::string_list(file.labels.iter().cloned()))
                .build()
        })
        .collect();
    let block = AttributesBuilder::new()
        .set("filename_pattern", f.filename_pattern.as_str())
        .set("output_file", Value::blocks(files))
        .build();

    let mut item = AttributesBuilder::new();
    for kind in FORMAT_BLOCKS {
        item = item.set(kind, Value::List(vec![]));
    }
    Some(item.set(key, Value::block(block)).build())
}

fn flatten_fade(fade: Option<&Fade>) -> Value {
    optional_block(fade.map(|f| {
        AttributesBuilder::new()
            .set("duration", f.duration.as_str())
            .set("fade_color", f.fade_color.as_str())
            .set_opt("start", f.start.clone())
            .build()
    }))
}

fn flatten_filters(filters: Option<&Filters>) -> Value {
    optional_block(filters.map(|f| {
        AttributesBuilder::new()
            .set(
                "crop_rectangle",
                optional_block(f.crop.as_ref().map(|r| {
                    AttributesBuilder::new()
                        .set_opt("left", r.left.clone())
                        .set_opt("top", r.top.clone())
                        .set_opt("width", r.width.clone())
                        .set_opt("height", r.height.clone())
                        .build()
                })),
            )
            .set(
                "deinterlace",
                optional_block(f.deinterlace.as_ref().map(|d| {
                    AttributesBuilder::new()
                        .set_opt("parity", d.parity.clone())
                        .set_opt("mode", d.mode.clone())
                        .build()
                })),
            )
            .set("fade_in", flatten_fade(f.fade_in.as_ref()))
            .set("fade_out", flatten_fade(f.fade_out.as_ref()))
            .set_opt("rotation", f.rotation.clone())
            .build()
    }))
}

pub(super) fn flatten_custom_preset(preset: &StandardEncoderPreset) -> Value {
    Value::block(
        AttributesBuilder::new()
            .set(
                "codec",
                Value::blocks(preset.codecs.iter().filter_map(flatten_codec).collect()),
            )
            .set(
                "format",
                Value::blocks(preset.formats.iter().filter_map(flatten_format).collect()),
            )
            .set("filter", flatten_filters(preset.filters.as_ref()))
            .set(
                "experimental_options",
                Value::string_map(
                    preset
                        .experimental_options
                        .iter()
                        .flatten()
                        .map(|(k, v)| (k.clone(), v.clone())),
                ),
            )
            .build(),
    )
}
