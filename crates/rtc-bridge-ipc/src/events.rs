//! Events sent from the engine to the framework.
//!
//! Every SDK callback maps to exactly one variant with a fixed field set.
//! Serialization is adjacently tagged, so an event travels as
//! `{"type": "onUserJoined", "data": {"uid": 7, "elapsed": 120}}`.
//! Strings the SDK may leave null are normalized to `""` by the
//! constructors below, keeping the payload shape stable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{LeaveChannelStats, Uid};

/// Events that the engine can send to the framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RtcEvent {
    #[serde(rename = "onJoinChannelSuccess")]
    JoinChannelSuccess {
        channel: String,
        uid: Uid,
        elapsed: i32,
    },

    #[serde(rename = "onRejoinChannelSuccess")]
    RejoinChannelSuccess {
        channel: String,
        uid: Uid,
        elapsed: i32,
    },

    #[serde(rename = "onLeaveChannel")]
    LeaveChannel(LeaveChannelStats),

    #[serde(rename = "onUserJoined")]
    UserJoined { uid: Uid, elapsed: i32 },

    #[serde(rename = "onUserOffline")]
    UserOffline { uid: Uid, reason: i32 },

    #[serde(rename = "onFirstRemoteVideoFrame", rename_all = "camelCase")]
    FirstRemoteVideoFrame {
        uid: Uid,
        channel_id: String,
        width: i32,
        height: i32,
    },

    #[serde(rename = "onClientRoleChangeFailed")]
    ClientRoleChangeFailed { reason: i32 },

    #[serde(rename = "onConnectionStateChanged")]
    ConnectionStateChanged { state: i32, reason: i32 },

    #[serde(rename = "onRequestToken")]
    RequestToken {},

    #[serde(rename = "onTokenPrivilegeWillExpire")]
    TokenPrivilegeWillExpire { token: String },

    #[serde(rename = "onError")]
    Error { error: i32, message: String },

    #[serde(rename = "onAudioPublishStateChanged", rename_all = "camelCase")]
    AudioPublishStateChanged {
        channel: String,
        old_state: i32,
        new_state: i32,
        elapse_since_last_state: i32,
    },

    #[serde(rename = "onUserMuteVideo", rename_all = "camelCase")]
    UserMuteVideo {
        channel_id: String,
        uid: Uid,
        muted: bool,
    },

    #[serde(rename = "onSnapshotTaken", rename_all = "camelCase")]
    SnapshotTaken {
        connection: Map<String, Value>,
        uid: Uid,
        file_path: String,
        width: i32,
        height: i32,
        err_code: i32,
    },

    #[serde(rename = "onRecorderStateChanged", rename_all = "camelCase")]
    RecorderStateChanged {
        channel_id: String,
        uid: Uid,
        state: i32,
        reason: i32,
    },

    #[serde(rename = "onRecorderInfoUpdated", rename_all = "camelCase")]
    RecorderInfoUpdated {
        channel_id: String,
        uid: Uid,
        file_path: String,
        duration_ms: u32,
        file_size: u64,
    },
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

impl RtcEvent {
    pub fn join_channel_success(channel: Option<&str>, uid: Uid, elapsed: i32) -> Self {
        Self::JoinChannelSuccess {
            channel: text(channel),
            uid,
            elapsed,
        }
    }

    pub fn rejoin_channel_success(channel: Option<&str>, uid: Uid, elapsed: i32) -> Self {
        Self::RejoinChannelSuccess {
            channel: text(channel),
            uid,
            elapsed,
        }
    }

    /// Missing statistics are reported as all zeros.
    pub fn leave_channel(stats: Option<LeaveChannelStats>) -> Self {
        Self::LeaveChannel(stats.unwrap_or_default())
    }

    pub fn first_remote_video_frame(
        uid: Uid,
        channel_id: Option<&str>,
        width: i32,
        height: i32,
    ) -> Self {
        Self::FirstRemoteVideoFrame {
            uid,
            channel_id: text(channel_id),
            width,
            height,
        }
    }

    pub fn token_privilege_will_expire(token: Option<&str>) -> Self {
        Self::TokenPrivilegeWillExpire { token: text(token) }
    }

    pub fn error(error: i32, message: Option<&str>) -> Self {
        Self::Error {
            error,
            message: text(message),
        }
    }

    pub fn audio_publish_state_changed(
        channel: Option<&str>,
        old_state: i32,
        new_state: i32,
        elapse_since_last_state: i32,
    ) -> Self {
        Self::AudioPublishStateChanged {
            channel: text(channel),
            old_state,
            new_state,
            elapse_since_last_state,
        }
    }

    pub fn user_mute_video(channel_id: Option<&str>, uid: Uid, muted: bool) -> Self {
        Self::UserMuteVideo {
            channel_id: text(channel_id),
            uid,
            muted,
        }
    }

    pub fn snapshot_taken(
        uid: Uid,
        file_path: Option<&str>,
        width: i32,
        height: i32,
        err_code: i32,
    ) -> Self {
        Self::SnapshotTaken {
            connection: Map::new(),
            uid,
            file_path: text(file_path),
            width,
            height,
            err_code,
        }
    }

    pub fn recorder_state_changed(
        channel_id: Option<&str>,
        uid: Uid,
        state: i32,
        reason: i32,
    ) -> Self {
        Self::RecorderStateChanged {
            channel_id: text(channel_id),
            uid,
            state,
            reason,
        }
    }

    pub fn recorder_info_updated(
        channel_id: Option<&str>,
        uid: Uid,
        file_path: Option<&str>,
        duration_ms: u32,
        file_size: u64,
    ) -> Self {
        Self::RecorderInfoUpdated {
            channel_id: text(channel_id),
            uid,
            file_path: text(file_path),
            duration_ms,
            file_size,
        }
    }

    /// The wire name of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::JoinChannelSuccess { .. } => "onJoinChannelSuccess",
            Self::RejoinChannelSuccess { .. } => "onRejoinChannelSuccess",
            Self::LeaveChannel(_) => "onLeaveChannel",
            Self::UserJoined { .. } => "onUserJoined",
            Self::UserOffline { .. } => "onUserOffline",
            Self::FirstRemoteVideoFrame { .. } => "onFirstRemoteVideoFrame",
            Self::ClientRoleChangeFailed { .. } => "onClientRoleChangeFailed",
            Self::ConnectionStateChanged { .. } => "onConnectionStateChanged",
            Self::RequestToken {} => "onRequestToken",
            Self::TokenPrivilegeWillExpire { .. } => "onTokenPrivilegeWillExpire",
            Self::Error { .. } => "onError",
            Self::AudioPublishStateChanged { .. } => "onAudioPublishStateChanged",
            Self::UserMuteVideo { .. } => "onUserMuteVideo",
            Self::SnapshotTaken { .. } => "onSnapshotTaken",
            Self::RecorderStateChanged { .. } => "onRecorderStateChanged",
            Self::RecorderInfoUpdated { .. } => "onRecorderInfoUpdated",
        }
    }

    /// Serializes to the `{type, data}` message handed to the event sink.
    pub fn to_message(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            // Every field is a plain string, number, bool or map.
            serde_json::json!({ "type": self.event_type(), "data": { "error": err.to_string() } })
        })
    }
}
