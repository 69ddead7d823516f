//! Seams to the native RTC SDK and the platform's drawable surfaces.
//!
//! The SDK is an external collaborator: it is invoked through these traits
//! and answers with integer result codes, except for the two constructors
//! (engine and media recorder) which can fail outright.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use rtc_bridge_ipc::{
    ChannelMediaOptions, ClientRoleOptions, EngineConfig, MediaRecorderConfig,
    RecorderStreamInfo, RenderMode, RtcEvent, Uid,
};

/// A failure reported by the SDK when constructing a native object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SdkError {
    pub message: String,
}

impl SdkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receiver for SDK callbacks.
///
/// The SDK calls `handle` from threads of its own choosing.
pub trait RtcEventHandler: Send + Sync {
    fn handle(&self, event: RtcEvent);
}

/// A platform-native drawable the engine renders frames into.
pub trait VideoSurface: Send + Sync + fmt::Debug {
    /// Stable identifier, used for logging.
    fn surface_id(&self) -> u64;

    /// Removes the surface from whatever container currently hosts it.
    fn detach(&self);
}

/// Shared reference to a surface.
pub type SurfaceHandle = Arc<dyn VideoSurface>;

/// Creates platform surfaces on demand.
pub trait SurfaceFactory: Send + Sync {
    fn create_surface(&self) -> SurfaceHandle;
}

/// Associates a surface with a video source inside the engine.
///
/// A canvas without a surface unbinds the source.
#[derive(Debug, Clone)]
pub struct VideoCanvas {
    pub surface: Option<SurfaceHandle>,
    pub render_mode: RenderMode,
    /// `0` for the local camera.
    pub uid: Uid,
}

impl VideoCanvas {
    /// Canvas for the local camera.
    pub fn local(surface: SurfaceHandle) -> Self {
        Self {
            surface: Some(surface),
            render_mode: RenderMode::default(),
            uid: 0,
        }
    }

    /// Canvas binding `uid` to `surface`.
    pub fn remote(uid: Uid, surface: SurfaceHandle) -> Self {
        Self {
            surface: Some(surface),
            render_mode: RenderMode::default(),
            uid,
        }
    }

    /// Canvas that stops frame delivery for `uid`.
    pub fn unbind(uid: Uid) -> Self {
        Self {
            surface: None,
            render_mode: RenderMode::default(),
            uid,
        }
    }
}

/// Entry points of the SDK that exist before any engine does.
pub trait RtcSdk: Send + Sync {
    /// Creates the native engine; `handler` receives every engine callback.
    fn create_engine(
        &self,
        config: &EngineConfig,
        handler: Arc<dyn RtcEventHandler>,
    ) -> Result<EngineHandle, SdkError>;

    /// Destroys the native engine.
    fn destroy_engine(&self, engine: EngineHandle);
}

/// The native engine instance.
pub trait RtcEngine: Send + Sync {
    fn join_channel(
        &self,
        token: &str,
        channel_id: &str,
        uid: Uid,
        options: &ChannelMediaOptions,
    ) -> i32;
    fn leave_channel(&self) -> i32;
    fn update_channel_media_options(&self, options: &ChannelMediaOptions) -> i32;
    fn set_channel_profile(&self, profile: i32) -> i32;
    fn renew_token(&self, token: &str) -> i32;
    fn set_client_role(&self, role: i32, options: Option<&ClientRoleOptions>) -> i32;

    fn mute_all_remote_audio_streams(&self, muted: bool) -> i32;
    fn mute_all_remote_video_streams(&self, muted: bool) -> i32;
    fn mute_remote_audio_stream(&self, uid: Uid, muted: bool) -> i32;
    fn mute_remote_video_stream(&self, uid: Uid, muted: bool) -> i32;
    fn mute_local_audio_stream(&self, muted: bool) -> i32;
    fn mute_local_video_stream(&self, muted: bool) -> i32;
    fn set_remote_video_stream_type(&self, uid: Uid, stream_type: i32) -> i32;

    fn enable_video(&self) -> i32;
    fn disable_video(&self) -> i32;
    fn enable_local_video(&self, enabled: bool) -> i32;
    fn start_preview(&self) -> i32;
    fn stop_preview(&self) -> i32;
    fn take_snapshot(&self, uid: Uid, file_path: &str) -> i32;

    fn setup_local_video(&self, canvas: &VideoCanvas) -> i32;
    fn setup_remote_video(&self, canvas: &VideoCanvas) -> i32;

    fn create_media_recorder(&self, info: &RecorderStreamInfo) -> Result<RecorderHandle, SdkError>;
    fn destroy_media_recorder(&self, recorder: RecorderHandle);
}

/// Shared reference to the native engine.
pub type EngineHandle = Arc<dyn RtcEngine>;

/// A native recorder persisting a channel's streams to storage.
pub trait MediaRecorder: Send + Sync {
    /// Installs or clears the callback observer.
    fn set_observer(&self, observer: Option<Arc<dyn RtcEventHandler>>);
    fn start_recording(&self, config: &MediaRecorderConfig) -> i32;
    fn stop_recording(&self) -> i32;
}

/// Shared reference to a native recorder.
pub type RecorderHandle = Arc<dyn MediaRecorder>;
