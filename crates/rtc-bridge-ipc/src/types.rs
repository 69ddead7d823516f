//! Common types used across IPC messages.

use serde::{Deserialize, Serialize};

/// Remote participant identifier, as the SDK understands it.
pub type Uid = u32;

/// Configuration for creating an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Application identifier issued by the RTC vendor.
    pub app_id: String,
}

/// Per-channel media options.
///
/// Every field is optional: `None` leaves the SDK's own default in place,
/// so a partial request only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMediaOptions {
    /// Publish the camera track.
    pub publish_camera_track: Option<bool>,

    /// Publish the microphone track.
    pub publish_microphone_track: Option<bool>,

    /// Automatically subscribe to remote audio.
    pub auto_subscribe_audio: Option<bool>,

    /// Automatically subscribe to remote video.
    pub auto_subscribe_video: Option<bool>,

    /// Audience latency level.
    pub audience_latency_level: Option<i32>,

    /// Channel profile.
    pub channel_profile: Option<i32>,

    /// Client role type.
    pub client_role_type: Option<i32>,
}

/// Audience latency levels accepted by `setClientRole`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudienceLatencyLevel {
    /// Low latency.
    #[default]
    LowLatency,

    /// Ultra-low latency.
    UltraLowLatency,
}

impl AudienceLatencyLevel {
    /// Maps the request value; anything but `2` selects low latency.
    pub fn from_request(level: i32) -> Self {
        match level {
            2 => Self::UltraLowLatency,
            _ => Self::LowLatency,
        }
    }
}

/// Options passed along with a client role change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRoleOptions {
    pub audience_latency_level: AudienceLatencyLevel,
}

/// Identifies the stream a media recorder captures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderStreamInfo {
    pub channel_id: String,
    pub uid: Uid,
}

/// Recording container format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// MPEG-4.
    #[default]
    Mp4,
}

impl ContainerFormat {
    /// Returns the SDK's raw value.
    pub fn raw(self) -> i32 {
        match self {
            Self::Mp4 => 1,
        }
    }

    /// Parses the SDK's raw value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(Self::Mp4),
            _ => None,
        }
    }
}

/// Which media a recorder writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecorderStreamType {
    /// Audio only.
    Audio,

    /// Video only.
    Video,

    /// Audio and video.
    #[default]
    Both,
}

impl RecorderStreamType {
    /// Returns the SDK's raw value.
    pub fn raw(self) -> i32 {
        match self {
            Self::Audio => 1,
            Self::Video => 2,
            Self::Both => 3,
        }
    }

    /// Parses the SDK's raw value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(Self::Audio),
            2 => Some(Self::Video),
            3 => Some(Self::Both),
            _ => None,
        }
    }
}

/// Default maximum recording duration in milliseconds.
pub const DEFAULT_MAX_DURATION_MS: u32 = 120_000;

/// Configuration for a recording session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecorderConfig {
    /// Output file path.
    pub storage_path: String,

    /// Container format (default: MP4).
    pub container_format: ContainerFormat,

    /// Recorded streams (default: both).
    pub stream_type: RecorderStreamType,

    /// Maximum duration in milliseconds (default: 120000).
    pub max_duration_ms: u32,

    /// Interval between `onRecorderInfoUpdated` events; 0 disables them.
    pub recorder_info_update_interval_ms: u32,
}

impl MediaRecorderConfig {
    /// Creates a config for `storage_path` with every other field defaulted.
    pub fn new(storage_path: impl Into<String>) -> Self {
        Self {
            storage_path: storage_path.into(),
            container_format: ContainerFormat::default(),
            stream_type: RecorderStreamType::default(),
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
            recorder_info_update_interval_ms: 0,
        }
    }
}

/// Session statistics reported when leaving a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveChannelStats {
    /// Call duration in seconds.
    pub duration: u32,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    #[serde(rename = "txKBitRate")]
    pub tx_kbit_rate: u32,
    #[serde(rename = "rxKBitRate")]
    pub rx_kbit_rate: u32,
    pub tx_audio_bytes: u64,
    pub rx_audio_bytes: u64,
    pub tx_video_bytes: u64,
    pub rx_video_bytes: u64,
}

/// How video is fitted into a surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Fit the whole frame inside the surface.
    #[default]
    Fit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_level_mapping() {
        assert_eq!(AudienceLatencyLevel::from_request(1), AudienceLatencyLevel::LowLatency);
        assert_eq!(
            AudienceLatencyLevel::from_request(2),
            AudienceLatencyLevel::UltraLowLatency
        );
        assert_eq!(AudienceLatencyLevel::from_request(7), AudienceLatencyLevel::LowLatency);
    }

    #[test]
    fn test_recorder_config_defaults() {
        let config = MediaRecorderConfig::new("/tmp/a.mp4");
        assert_eq!(config.container_format, ContainerFormat::Mp4);
        assert_eq!(config.stream_type, RecorderStreamType::Both);
        assert_eq!(config.max_duration_ms, 120_000);
        assert_eq!(config.recorder_info_update_interval_ms, 0);
    }

    #[test]
    fn test_stream_type_raw_values() {
        for ty in [RecorderStreamType::Audio, RecorderStreamType::Video, RecorderStreamType::Both] {
            assert_eq!(RecorderStreamType::from_raw(ty.raw()), Some(ty));
        }
        assert_eq!(RecorderStreamType::from_raw(0), None);
        assert_eq!(ContainerFormat::from_raw(9), None);
    }
}
