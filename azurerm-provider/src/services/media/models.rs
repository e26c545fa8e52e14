//! Wire models for the Media Services REST API

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Media Services Account (2021-11-01)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaService {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<MediaServiceIdentity>,
    #[serde(default)]
    pub properties: MediaServiceProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaServiceIdentity {
    /// "SystemAssigned", "UserAssigned", "SystemAssigned,UserAssigned" or "None"
    #[serde(rename = "type")]
    pub identity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_assigned_identities: Option<HashMap<String, UserAssignedIdentity>>,
    #[serde(default, skip_serializing)]
    pub principal_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub tenant_id: Option<String>,
}

/// Details Azure fills in for each user-assigned identity; sent as `{}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAssignedIdentity {
    #[serde(default, skip_serializing)]
    pub principal_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaServiceProperties {
    #[serde(default)]
    pub storage_accounts: Vec<StorageAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_authentication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_network_access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_delivery: Option<KeyDelivery>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccount {
    pub id: String,
    #[serde(rename = "type")]
    pub account_type: StorageAccountType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageAccountType {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDelivery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_control: Option<AccessControl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_allow_list: Option<Vec<String>>,
}

// =============================================================================
// Transform (2022-07-01)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    #[serde(default)]
    pub properties: TransformProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub outputs: Vec<TransformOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_priority: Option<String>,
    pub preset: Preset,
}

/// Preset union, discriminated by `@odata.type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum Preset {
    #[serde(rename = "#Microsoft.Media.BuiltInStandardEncoderPreset")]
    BuiltInStandardEncoder(BuiltInStandardEncoderPreset),
    #[serde(rename = "#Microsoft.Media.AudioAnalyzerPreset")]
    AudioAnalyzer(AudioAnalyzerPreset),
    #[serde(rename = "#Microsoft.Media.VideoAnalyzerPreset")]
    VideoAnalyzer(VideoAnalyzerPreset),
    #[serde(rename = "#Microsoft.Media.FaceDetectorPreset")]
    FaceDetector(FaceDetectorPreset),
    #[serde(rename = "#Microsoft.Media.StandardEncoderPreset")]
    StandardEncoder(StandardEncoderPreset),
    /// Preset types this provider does not model
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltInStandardEncoderPreset {
    pub preset_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configurations: Option<PresetConfigurations>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetConfigurations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interleave_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_frame_interval_in_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bitrate_bps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_layers: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bitrate_bps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioAnalyzerPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental_options: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalyzerPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental_options: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights_to_extract: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetectorPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental_options: Option<HashMap<String, String>>,
}

/// A custom encoding recipe: codecs produce tracks, formats mux them into files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardEncoderPreset {
    #[serde(default)]
    pub codecs: Vec<Codec>,
    #[serde(default)]
    pub formats: Vec<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental_options: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum Codec {
    #[serde(rename = "#Microsoft.Media.AacAudio")]
    AacAudio(AacAudio),
    #[serde(rename = "#Microsoft.Media.DDAudio")]
    DdAudio(DdAudio),
    #[serde(rename = "#Microsoft.Media.CopyAudio")]
    CopyAudio(CopyCodec),
    #[serde(rename = "#Microsoft.Media.CopyVideo")]
    CopyVideo(CopyCodec),
    #[serde(rename = "#Microsoft.Media.H264Video")]
    H264Video(VideoCodec),
    #[serde(rename = "#Microsoft.Media.H265Video")]
    H265Video(VideoCodec),
    /// Image codecs and anything newer
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AacAudio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DdAudio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyCodec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Shared shape of the H.264 and H.265 codecs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCodec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_frame_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stretch_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    /// H.264 only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_control_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_change_detection: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<VideoLayer>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLayer {
    pub bitrate: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bitrate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_frames: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slices: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive_b_frame: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crf: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_frames: Option<i64>,
    /// H.264 only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum Format {
    #[serde(rename = "#Microsoft.Media.Mp4Format")]
    Mp4(MultiBitrateFormat),
    #[serde(rename = "#Microsoft.Media.TransportStreamFormat")]
    TransportStream(MultiBitrateFormat),
    /// Image formats and anything newer
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiBitrateFormat {
    pub filename_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_files: Option<Vec<OutputFile>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Rectangle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deinterlace: Option<Deinterlace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<Fade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<Fade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deinterlace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fade {
    pub duration: String,
    pub fade_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
}

// =============================================================================
// Streaming Policy (2022-08-01)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingPolicy {
    #[serde(default)]
    pub properties: StreamingPolicyProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingPolicyProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_content_key_policy_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_encryption: Option<NoEncryption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope_encryption: Option<EnvelopeEncryption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_encryption_cenc: Option<CommonEncryptionCenc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_encryption_cbcs: Option<CommonEncryptionCbcs>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnabledProtocols {
    pub dash: bool,
    pub download: bool,
    pub hls: bool,
    pub smooth_streaming: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoEncryption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_protocols: Option<EnabledProtocols>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeEncryption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_protocols: Option<EnabledProtocols>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_keys: Option<StreamingPolicyContentKeys>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_key_acquisition_url_template: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonEncryptionCenc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_protocols: Option<EnabledProtocols>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_tracks: Option<Vec<TrackSelection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_keys: Option<StreamingPolicyContentKeys>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drm: Option<CencDrmConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_key_encryption_configuration: Option<ClearKeyEncryptionConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonEncryptionCbcs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_protocols: Option<EnabledProtocols>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_keys: Option<StreamingPolicyContentKeys>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drm: Option<CbcsDrmConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_key_encryption_configuration: Option<ClearKeyEncryptionConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CencDrmConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_ready: Option<PlayReadyConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widevine: Option<WidevineConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CbcsDrmConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fair_play: Option<FairPlayConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayReadyConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_license_acquisition_url_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_ready_custom_attributes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidevineConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_license_acquisition_url_template: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairPlayConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_license_acquisition_url_template: Option<String>,
    #[serde(default)]
    pub allow_persistent_license: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearKeyEncryptionConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_keys_acquisition_url_template: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingPolicyContentKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_key: Option<DefaultKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_to_track_mappings: Option<Vec<StreamingPolicyContentKey>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingPolicyContentKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<TrackSelection>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSelection {
    #[serde(default)]
    pub track_selections: Vec<TrackPropertyCondition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPropertyCondition {
    pub property: String,
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

// =============================================================================
// Content Key Policy (2022-08-01)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentKeyPolicy {
    #[serde(default)]
    pub properties: ContentKeyPolicyProperties,
}

/// Also the response body of `getPolicyPropertiesWithSecrets`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentKeyPolicyProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<ContentKeyPolicyOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentKeyPolicyOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub configuration: KeyConfiguration,
    pub restriction: KeyRestriction,
}

/// How the key is delivered to the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum KeyConfiguration {
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicyClearKeyConfiguration")]
    ClearKey,
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicyWidevineConfiguration")]
    Widevine(WidevineConfigurationTemplate),
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicyPlayReadyConfiguration")]
    PlayReady(PlayReadyKeyConfiguration),
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicyFairPlayConfiguration")]
    FairPlay(FairPlayKeyConfiguration),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidevineConfigurationTemplate {
    pub widevine_template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayReadyKeyConfiguration {
    #[serde(default)]
    pub licenses: Vec<PlayReadyLicense>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_custom_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayReadyLicense {
    #[serde(default)]
    pub allow_test_devices: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_begin_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_right: Option<PlayReadyPlayRight>,
    #[serde(default)]
    pub license_type: String,
    pub content_key_location: ContentKeyLocation,
    #[serde(default)]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum ContentKeyLocation {
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicyPlayReadyContentEncryptionKeyFromHeader")]
    Header,
    #[serde(
        rename = "#Microsoft.Media.ContentKeyPolicyPlayReadyContentEncryptionKeyFromKeyIdentifier"
    )]
    KeyIdentifier(KeyIdentifierLocation),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyIdentifierLocation {
    pub key_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayReadyPlayRight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_play_expiration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scms_restriction: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agc_and_color_stripe_restriction: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_analog_television_output_restriction: Option<ExplicitAnalogTelevisionRestriction>,
    #[serde(default)]
    pub digital_video_only_content_restriction: bool,
    #[serde(default)]
    pub image_constraint_for_analog_component_video_restriction: bool,
    #[serde(default)]
    pub image_constraint_for_analog_computer_monitor_restriction: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub allow_passing_video_content_to_unknown_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncompressed_digital_video_opl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncompressed_digital_audio_opl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_digital_video_opl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_digital_audio_opl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analog_video_opl: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplicitAnalogTelevisionRestriction {
    #[serde(default)]
    pub best_effort: bool,
    pub configuration_data: i64,
}

/// `ask` is base64 on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairPlayKeyConfiguration {
    #[serde(default)]
    pub ask: String,
    #[serde(default)]
    pub fair_play_pfx: String,
    #[serde(default)]
    pub fair_play_pfx_password: String,
    #[serde(default)]
    pub rental_and_lease_key_type: String,
    #[serde(default)]
    pub rental_duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_rental_configuration: Option<OfflineRentalConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineRentalConfiguration {
    pub playback_duration_seconds: i64,
    pub storage_duration_seconds: i64,
}

/// Who may obtain the key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum KeyRestriction {
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicyOpenRestriction")]
    Open,
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicyTokenRestriction")]
    Token(TokenRestriction),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRestriction {
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_verification_key: Option<TokenKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_verification_keys: Option<Vec<TokenKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_claims: Option<Vec<TokenClaim>>,
    #[serde(default)]
    pub restriction_token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_discovery_document: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum TokenKey {
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicySymmetricTokenKey")]
    Symmetric(SymmetricTokenKey),
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicyRsaTokenKey")]
    Rsa(RsaTokenKey),
    #[serde(rename = "#Microsoft.Media.ContentKeyPolicyX509CertificateTokenKey")]
    X509(X509TokenKey),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymmetricTokenKey {
    pub key_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RsaTokenKey {
    pub exponent: String,
    pub modulus: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X509TokenKey {
    pub raw_body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaim {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_value: Option<String>,
}
