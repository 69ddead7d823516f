//! Commands sent from the framework to the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::args::Args;
use crate::error::BridgeError;
use crate::types::{
    AudienceLatencyLevel, ChannelMediaOptions, ClientRoleOptions, ContainerFormat, EngineConfig,
    MediaRecorderConfig, RecorderStreamInfo, RecorderStreamType, Uid, DEFAULT_MAX_DURATION_MS,
};

/// Method names understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    CreateEngine,
    DestroyEngine,
    JoinChannel,
    LeaveChannel,
    UpdateChannelMediaOptions,
    SetChannelProfile,
    RenewToken,
    SetClientRole,
    MuteAllRemoteAudioStreams,
    MuteAllRemoteVideoStreams,
    MuteRemoteAudioStream,
    MuteRemoteVideoStream,
    MuteLocalAudioStream,
    MuteLocalVideoStream,
    SetRemoteVideoStreamType,
    EnableVideo,
    EnableLocalVideo,
    StartPreview,
    StopPreview,
    TakeSnapshot,
    StartRecording,
    StopRecording,
}

impl CommandKind {
    /// Every kind, in method table order.
    pub const ALL: [CommandKind; 22] = [
        Self::CreateEngine,
        Self::DestroyEngine,
        Self::JoinChannel,
        Self::LeaveChannel,
        Self::UpdateChannelMediaOptions,
        Self::SetChannelProfile,
        Self::RenewToken,
        Self::SetClientRole,
        Self::MuteAllRemoteAudioStreams,
        Self::MuteAllRemoteVideoStreams,
        Self::MuteRemoteAudioStream,
        Self::MuteRemoteVideoStream,
        Self::MuteLocalAudioStream,
        Self::MuteLocalVideoStream,
        Self::SetRemoteVideoStreamType,
        Self::EnableVideo,
        Self::EnableLocalVideo,
        Self::StartPreview,
        Self::StopPreview,
        Self::TakeSnapshot,
        Self::StartRecording,
        Self::StopRecording,
    ];

    /// Resolves a method name.
    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.method() == method)
    }

    /// The method name used on the wire.
    pub fn method(self) -> &'static str {
        match self {
            Self::CreateEngine => "createEngine",
            Self::DestroyEngine => "destroyEngine",
            Self::JoinChannel => "joinChannel",
            Self::LeaveChannel => "leaveChannel",
            Self::UpdateChannelMediaOptions => "updateChannelMediaOptions",
            Self::SetChannelProfile => "setChannelProfile",
            Self::RenewToken => "renewToken",
            Self::SetClientRole => "setClientRole",
            Self::MuteAllRemoteAudioStreams => "muteAllRemoteAudioStreams",
            Self::MuteAllRemoteVideoStreams => "muteAllRemoteVideoStreams",
            Self::MuteRemoteAudioStream => "muteRemoteAudioStream",
            Self::MuteRemoteVideoStream => "muteRemoteVideoStream",
            Self::MuteLocalAudioStream => "muteLocalAudioStream",
            Self::MuteLocalVideoStream => "muteLocalVideoStream",
            Self::SetRemoteVideoStreamType => "setRemoteVideoStreamType",
            Self::EnableVideo => "enableVideo",
            Self::EnableLocalVideo => "enableLocalVideo",
            Self::StartPreview => "startPreview",
            Self::StopPreview => "stopPreview",
            Self::TakeSnapshot => "takeSnapshot",
            Self::StartRecording => "startRecording",
            Self::StopRecording => "stopRecording",
        }
    }

    /// Whether the command fails with `NO_ENGINE` when no engine is installed.
    pub fn requires_engine(self) -> bool {
        !matches!(self, Self::CreateEngine | Self::DestroyEngine)
    }
}

/// Commands that the framework can send to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeCommand {
    /// Create the engine.
    CreateEngine(EngineConfig),

    /// Destroy the engine; a no-op when none exists.
    DestroyEngine,

    /// Join a channel.
    JoinChannel {
        token: String,
        channel_id: String,
        uid: Uid,
        options: ChannelMediaOptions,
    },

    /// Leave the current channel.
    LeaveChannel,

    /// Update media options of the joined channel.
    UpdateChannelMediaOptions(ChannelMediaOptions),

    /// Set the channel profile.
    SetChannelProfile(i32),

    /// Renew the channel token.
    RenewToken(String),

    /// Change the client role, optionally with audience latency options.
    SetClientRole {
        role: i32,
        options: Option<ClientRoleOptions>,
    },

    /// Mute or unmute all remote audio.
    MuteAllRemoteAudioStreams(bool),

    /// Mute or unmute all remote video.
    MuteAllRemoteVideoStreams(bool),

    /// Mute or unmute one remote audio stream.
    MuteRemoteAudioStream { uid: Uid, muted: bool },

    /// Mute or unmute one remote video stream.
    MuteRemoteVideoStream { uid: Uid, muted: bool },

    /// Mute or unmute the local audio stream.
    MuteLocalAudioStream(bool),

    /// Mute or unmute the local video stream.
    MuteLocalVideoStream(bool),

    /// Select the remote video stream type for `uid`.
    SetRemoteVideoStreamType { uid: Uid, stream_type: i32 },

    /// Enable or disable the video module.
    EnableVideo(bool),

    /// Enable or disable local video capture.
    EnableLocalVideo(bool),

    /// Start the local preview.
    StartPreview,

    /// Stop the local preview.
    StopPreview,

    /// Take a snapshot of `uid`'s video into `file_path`.
    TakeSnapshot { uid: Uid, file_path: String },

    /// Start a recording session.
    StartRecording {
        stream: RecorderStreamInfo,
        config: MediaRecorderConfig,
    },

    /// Stop the recording session.
    StopRecording,
}

impl BridgeCommand {
    /// Decodes the arguments of `kind` into a typed command.
    pub fn decode(kind: CommandKind, value: &Value) -> Result<Self, BridgeError> {
        let args = || Args::new(value);

        let command = match kind {
            CommandKind::CreateEngine => Self::CreateEngine(EngineConfig {
                app_id: args()?.non_blank_str("appId")?.to_string(),
            }),
            CommandKind::DestroyEngine => Self::DestroyEngine,
            CommandKind::JoinChannel => {
                let args = args()?;
                let token = args.opt_str("token")?.unwrap_or_default().to_string();
                let channel_id = args.non_blank_str("channelId")?.to_string();
                let uid = args.opt_uid("uid")?.unwrap_or(0);
                let options = match args.opt_map("options")? {
                    Some(map) => decode_media_options(&map)?,
                    None => ChannelMediaOptions::default(),
                };
                Self::JoinChannel {
                    token,
                    channel_id,
                    uid,
                    options,
                }
            }
            CommandKind::LeaveChannel => Self::LeaveChannel,
            CommandKind::UpdateChannelMediaOptions => {
                Self::UpdateChannelMediaOptions(decode_media_options(&args()?.map("options")?)?)
            }
            CommandKind::SetChannelProfile => Self::SetChannelProfile(args()?.i32("profile")?),
            CommandKind::RenewToken => {
                Self::RenewToken(args()?.non_empty_str("token")?.to_string())
            }
            CommandKind::SetClientRole => {
                let args = args()?;
                Self::SetClientRole {
                    role: args.i32("role")?,
                    options: args.opt_i32("latencyLevel")?.map(|level| ClientRoleOptions {
                        audience_latency_level: AudienceLatencyLevel::from_request(level),
                    }),
                }
            }
            CommandKind::MuteAllRemoteAudioStreams => {
                Self::MuteAllRemoteAudioStreams(args()?.bool("muted")?)
            }
            CommandKind::MuteAllRemoteVideoStreams => {
                Self::MuteAllRemoteVideoStreams(args()?.bool("muted")?)
            }
            CommandKind::MuteRemoteAudioStream => {
                let args = args()?;
                Self::MuteRemoteAudioStream {
                    uid: args.uid("uid")?,
                    muted: args.bool("muted")?,
                }
            }
            CommandKind::MuteRemoteVideoStream => {
                let args = args()?;
                Self::MuteRemoteVideoStream {
                    uid: args.uid("uid")?,
                    muted: args.bool("muted")?,
                }
            }
            CommandKind::MuteLocalAudioStream => {
                Self::MuteLocalAudioStream(args()?.bool("muted")?)
            }
            CommandKind::MuteLocalVideoStream => {
                Self::MuteLocalVideoStream(args()?.bool("muted")?)
            }
            CommandKind::SetRemoteVideoStreamType => {
                let args = args()?;
                Self::SetRemoteVideoStreamType {
                    uid: args.uid("uid")?,
                    stream_type: args.i32("streamType")?,
                }
            }
            CommandKind::EnableVideo => Self::EnableVideo(args()?.bool("enabled")?),
            CommandKind::EnableLocalVideo => Self::EnableLocalVideo(args()?.bool("enabled")?),
            CommandKind::StartPreview => Self::StartPreview,
            CommandKind::StopPreview => Self::StopPreview,
            CommandKind::TakeSnapshot => {
                let args = args()?;
                Self::TakeSnapshot {
                    uid: args.uid("uid")?,
                    file_path: args.non_blank_str("filePath")?.to_string(),
                }
            }
            CommandKind::StartRecording => decode_start_recording(&args()?.map("config")?)?,
            CommandKind::StopRecording => Self::StopRecording,
        };

        Ok(command)
    }

    /// Returns the kind of this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::CreateEngine(_) => CommandKind::CreateEngine,
            Self::DestroyEngine => CommandKind::DestroyEngine,
            Self::JoinChannel { .. } => CommandKind::JoinChannel,
            Self::LeaveChannel => CommandKind::LeaveChannel,
            Self::UpdateChannelMediaOptions(_) => CommandKind::UpdateChannelMediaOptions,
            Self::SetChannelProfile(_) => CommandKind::SetChannelProfile,
            Self::RenewToken(_) => CommandKind::RenewToken,
            Self::SetClientRole { .. } => CommandKind::SetClientRole,
            Self::MuteAllRemoteAudioStreams(_) => CommandKind::MuteAllRemoteAudioStreams,
            Self::MuteAllRemoteVideoStreams(_) => CommandKind::MuteAllRemoteVideoStreams,
            Self::MuteRemoteAudioStream { .. } => CommandKind::MuteRemoteAudioStream,
            Self::MuteRemoteVideoStream { .. } => CommandKind::MuteRemoteVideoStream,
            Self::MuteLocalAudioStream(_) => CommandKind::MuteLocalAudioStream,
            Self::MuteLocalVideoStream(_) => CommandKind::MuteLocalVideoStream,
            Self::SetRemoteVideoStreamType { .. } => CommandKind::SetRemoteVideoStreamType,
            Self::EnableVideo(_) => CommandKind::EnableVideo,
            Self::EnableLocalVideo(_) => CommandKind::EnableLocalVideo,
            Self::StartPreview => CommandKind::StartPreview,
            Self::StopPreview => CommandKind::StopPreview,
            Self::TakeSnapshot { .. } => CommandKind::TakeSnapshot,
            Self::StartRecording { .. } => CommandKind::StartRecording,
            Self::StopRecording => CommandKind::StopRecording,
        }
    }
}

/// Builds channel media options, overriding only the fields present.
pub fn decode_media_options(args: &Args<'_>) -> Result<ChannelMediaOptions, BridgeError> {
    Ok(ChannelMediaOptions {
        publish_camera_track: args.opt_bool("publishCameraTrack")?,
        publish_microphone_track: args.opt_bool("publishMicrophoneTrack")?,
        auto_subscribe_audio: args.opt_bool("autoSubscribeAudio")?,
        auto_subscribe_video: args.opt_bool("autoSubscribeVideo")?,
        audience_latency_level: args.opt_i32("audienceLatencyLevel")?,
        channel_profile: args.opt_i32("channelProfile")?,
        client_role_type: args.opt_i32("clientRoleType")?,
    })
}

fn decode_start_recording(config: &Args<'_>) -> Result<BridgeCommand, BridgeError> {
    let stream = RecorderStreamInfo {
        channel_id: config.opt_str("channelId")?.unwrap_or_default().to_string(),
        uid: config.opt_uid("uid")?.unwrap_or(0),
    };

    let storage_path = config.non_blank_str("storagePath")?.to_string();

    let container_format = match config.opt_i32("containerFormat")? {
        Some(raw) => ContainerFormat::from_raw(raw)
            .ok_or_else(|| BridgeError::invalid(format!("unknown containerFormat {raw}")))?,
        None => ContainerFormat::default(),
    };
    let stream_type = match config.opt_i32("streamType")? {
        Some(raw) => RecorderStreamType::from_raw(raw)
            .ok_or_else(|| BridgeError::invalid(format!("unknown streamType {raw}")))?,
        None => RecorderStreamType::default(),
    };

    Ok(BridgeCommand::StartRecording {
        stream,
        config: MediaRecorderConfig {
            storage_path,
            container_format,
            stream_type,
            max_duration_ms: config
                .opt_u32("maxDurationMs")?
                .unwrap_or(DEFAULT_MAX_DURATION_MS),
            recorder_info_update_interval_ms: config
                .opt_u32("recorderInfoUpdateInterval")?
                .unwrap_or(0),
        },
    })
}
