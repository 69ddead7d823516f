//! In-memory SDK and surface fakes that record every native call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use rtc_bridge_ipc::{
    ChannelMediaOptions, ClientRoleOptions, EngineConfig, MediaRecorderConfig,
    RecorderStreamInfo, RtcEvent, Uid,
};

use crate::relay::{DeliveryContext, Task};
use crate::sdk::{
    EngineHandle, MediaRecorder, RecorderHandle, RtcEngine, RtcEventHandler, RtcSdk, SdkError,
    SurfaceFactory, SurfaceHandle, VideoCanvas, VideoSurface,
};

/// A native call observed by the fakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkCall {
    CreateEngine {
        app_id: String,
    },
    DestroyEngine,
    JoinChannel {
        token: String,
        channel_id: String,
        uid: Uid,
        options: ChannelMediaOptions,
    },
    LeaveChannel,
    UpdateChannelMediaOptions(ChannelMediaOptions),
    SetChannelProfile(i32),
    RenewToken(String),
    SetClientRole {
        role: i32,
        options: Option<ClientRoleOptions>,
    },
    MuteAllRemoteAudioStreams(bool),
    MuteAllRemoteVideoStreams(bool),
    MuteRemoteAudioStream {
        uid: Uid,
        muted: bool,
    },
    MuteRemoteVideoStream {
        uid: Uid,
        muted: bool,
    },
    MuteLocalAudioStream(bool),
    MuteLocalVideoStream(bool),
    SetRemoteVideoStreamType {
        uid: Uid,
        stream_type: i32,
    },
    EnableVideo,
    DisableVideo,
    EnableLocalVideo(bool),
    StartPreview,
    StopPreview,
    TakeSnapshot {
        uid: Uid,
        file_path: String,
    },
    SetupLocalVideo {
        surface: Option<u64>,
    },
    SetupRemoteVideo {
        uid: Uid,
        surface: Option<u64>,
    },
    CreateMediaRecorder(RecorderStreamInfo),
    DestroyMediaRecorder {
        recorder: u64,
    },
    SetRecorderObserver {
        recorder: u64,
        installed: bool,
    },
    StartRecording {
        recorder: u64,
        config: MediaRecorderConfig,
    },
    StopRecording {
        recorder: u64,
    },
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<SdkCall>>,
    handler: Mutex<Option<Arc<dyn RtcEventHandler>>>,
    engine_error: Mutex<Option<String>>,
    recorder_error: Mutex<Option<String>>,
    start_code: Mutex<i32>,
    stop_code: Mutex<i32>,
    recorders: Mutex<Vec<Arc<FakeRecorder>>>,
    next_recorder: AtomicU64,
}

impl Shared {
    fn record(&self, call: SdkCall) {
        self.calls.lock().push(call);
    }
}

/// Fake SDK entry point. Engines it hands out share its call log.
pub struct FakeSdk {
    shared: Arc<Shared>,
}

impl FakeSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            shared: Arc::new(Shared::default()),
        })
    }

    /// An engine sharing this SDK's log, created without a `CreateEngine`
    /// call.
    pub fn engine(&self) -> EngineHandle {
        Arc::new(FakeEngine {
            shared: Arc::clone(&self.shared),
        })
    }

    pub fn calls(&self) -> Vec<SdkCall> {
        self.shared.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.shared.calls.lock().clear();
    }

    pub fn count(&self, pred: impl Fn(&SdkCall) -> bool) -> usize {
        self.shared.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn fail_engine_creation(&self, message: &str) {
        *self.shared.engine_error.lock() = Some(message.to_string());
    }

    pub fn fail_recorder_creation(&self, message: &str) {
        *self.shared.recorder_error.lock() = Some(message.to_string());
    }

    /// Code returned by every subsequent `start_recording`.
    pub fn set_start_code(&self, code: i32) {
        *self.shared.start_code.lock() = code;
    }

    /// Code returned by every subsequent `stop_recording`.
    pub fn set_stop_code(&self, code: i32) {
        *self.shared.stop_code.lock() = code;
    }

    /// Deliver an engine callback to the handler passed at creation.
    pub fn fire(&self, event: RtcEvent) {
        let handler = self.shared.handler.lock().clone();
        if let Some(handler) = handler {
            handler.handle(event);
        }
    }

    /// The handler passed to the live engine, if any.
    pub fn engine_handler(&self) -> Option<Arc<dyn RtcEventHandler>> {
        self.shared.handler.lock().clone()
    }

    /// Deliver a recorder callback through the newest recorder's observer.
    pub fn fire_recorder(&self, event: RtcEvent) {
        if let Some(observer) = self.current_recorder_observer() {
            observer.handle(event);
        }
    }

    /// Observer installed on the newest recorder.
    pub fn current_recorder_observer(&self) -> Option<Arc<dyn RtcEventHandler>> {
        let recorder = self.shared.recorders.lock().last().cloned()?;
        let observer = recorder.observer.lock().clone();
        observer
    }

    pub fn recorder_observer_installed(&self) -> bool {
        self.current_recorder_observer().is_some()
    }

    /// Number of recorders created so far.
    pub fn recorders_created(&self) -> usize {
        self.shared.recorders.lock().len()
    }
}

impl RtcSdk for FakeSdk {
    fn create_engine(
        &self,
        config: &EngineConfig,
        handler: Arc<dyn RtcEventHandler>,
    ) -> Result<EngineHandle, SdkError> {
        self.shared.record(SdkCall::CreateEngine {
            app_id: config.app_id.clone(),
        });
        if let Some(message) = self.shared.engine_error.lock().clone() {
            return Err(SdkError::new(message));
        }
        *self.shared.handler.lock() = Some(handler);
        Ok(self.engine())
    }

    fn destroy_engine(&self, _engine: EngineHandle) {
        self.shared.record(SdkCall::DestroyEngine);
        *self.shared.handler.lock() = None;
    }
}

struct FakeEngine {
    shared: Arc<Shared>,
}

impl FakeEngine {
    fn record(&self, call: SdkCall) {
        self.shared.record(call);
    }
}

fn surface_id(canvas: &VideoCanvas) -> Option<u64> {
    canvas.surface.as_ref().map(|s| s.surface_id())
}

impl RtcEngine for FakeEngine {
    fn join_channel(
        &self,
        token: &str,
        channel_id: &str,
        uid: Uid,
        options: &ChannelMediaOptions,
    ) -> i32 {
        self.record(SdkCall::JoinChannel {
            token: token.to_string(),
            channel_id: channel_id.to_string(),
            uid,
            options: options.clone(),
        });
        0
    }

    fn leave_channel(&self) -> i32 {
        self.record(SdkCall::LeaveChannel);
        0
    }

    fn update_channel_media_options(&self, options: &ChannelMediaOptions) -> i32 {
        self.record(SdkCall::UpdateChannelMediaOptions(options.clone()));
        0
    }

    fn set_channel_profile(&self, profile: i32) -> i32 {
        self.record(SdkCall::SetChannelProfile(profile));
        0
    }

    fn renew_token(&self, token: &str) -> i32 {
        self.record(SdkCall::RenewToken(token.to_string()));
        0
    }

    fn set_client_role(&self, role: i32, options: Option<&ClientRoleOptions>) -> i32 {
        self.record(SdkCall::SetClientRole {
            role,
            options: options.copied(),
        });
        0
    }

    fn mute_all_remote_audio_streams(&self, muted: bool) -> i32 {
        self.record(SdkCall::MuteAllRemoteAudioStreams(muted));
        0
    }

    fn mute_all_remote_video_streams(&self, muted: bool) -> i32 {
        self.record(SdkCall::MuteAllRemoteVideoStreams(muted));
        0
    }

    fn mute_remote_audio_stream(&self, uid: Uid, muted: bool) -> i32 {
        self.record(SdkCall::MuteRemoteAudioStream { uid, muted });
        0
    }

    fn mute_remote_video_stream(&self, uid: Uid, muted: bool) -> i32 {
        self.record(SdkCall::MuteRemoteVideoStream { uid, muted });
        0
    }

    fn mute_local_audio_stream(&self, muted: bool) -> i32 {
        self.record(SdkCall::MuteLocalAudioStream(muted));
        0
    }

    fn mute_local_video_stream(&self, muted: bool) -> i32 {
        self.record(SdkCall::MuteLocalVideoStream(muted));
        0
    }

    fn set_remote_video_stream_type(&self, uid: Uid, stream_type: i32) -> i32 {
        self.record(SdkCall::SetRemoteVideoStreamType { uid, stream_type });
        0
    }

    fn enable_video(&self) -> i32 {
        self.record(SdkCall::EnableVideo);
        0
    }

    fn disable_video(&self) -> i32 {
        self.record(SdkCall::DisableVideo);
        0
    }

    fn enable_local_video(&self, enabled: bool) -> i32 {
        self.record(SdkCall::EnableLocalVideo(enabled));
        0
    }

    fn start_preview(&self) -> i32 {
        self.record(SdkCall::StartPreview);
        0
    }

    fn stop_preview(&self) -> i32 {
        self.record(SdkCall::StopPreview);
        0
    }

    fn take_snapshot(&self, uid: Uid, file_path: &str) -> i32 {
        self.record(SdkCall::TakeSnapshot {
            uid,
            file_path: file_path.to_string(),
        });
        0
    }

    fn setup_local_video(&self, canvas: &VideoCanvas) -> i32 {
        self.record(SdkCall::SetupLocalVideo {
            surface: surface_id(canvas),
        });
        0
    }

    fn setup_remote_video(&self, canvas: &VideoCanvas) -> i32 {
        self.record(SdkCall::SetupRemoteVideo {
            uid: canvas.uid,
            surface: surface_id(canvas),
        });
        0
    }

    fn create_media_recorder(&self, info: &RecorderStreamInfo) -> Result<RecorderHandle, SdkError> {
        self.record(SdkCall::CreateMediaRecorder(info.clone()));
        if let Some(message) = self.shared.recorder_error.lock().clone() {
            return Err(SdkError::new(message));
        }

        let recorder = Arc::new(FakeRecorder {
            id: self.shared.next_recorder.fetch_add(1, Ordering::Relaxed),
            shared: Arc::clone(&self.shared),
            observer: Mutex::new(None),
        });
        self.shared.recorders.lock().push(Arc::clone(&recorder));
        Ok(recorder)
    }

    fn destroy_media_recorder(&self, recorder: RecorderHandle) {
        // The handle is opaque here; identify it among the recorders we made.
        let id = self
            .shared
            .recorders
            .lock()
            .iter()
            .find(|r| std::ptr::addr_eq(Arc::as_ptr(r), Arc::as_ptr(&recorder)))
            .map(|r| r.id)
            .unwrap_or(u64::MAX);
        self.record(SdkCall::DestroyMediaRecorder { recorder: id });
    }
}

struct FakeRecorder {
    id: u64,
    shared: Arc<Shared>,
    observer: Mutex<Option<Arc<dyn RtcEventHandler>>>,
}

impl FakeRecorder {
    fn record(&self, call: SdkCall) {
        self.shared.record(call);
    }
}

impl MediaRecorder for FakeRecorder {
    fn set_observer(&self, observer: Option<Arc<dyn RtcEventHandler>>) {
        self.record(SdkCall::SetRecorderObserver {
            recorder: self.id,
            installed: observer.is_some(),
        });
        *self.observer.lock() = observer;
    }

    fn start_recording(&self, config: &MediaRecorderConfig) -> i32 {
        self.record(SdkCall::StartRecording {
            recorder: self.id,
            config: config.clone(),
        });
        *self.shared.start_code.lock()
    }

    fn stop_recording(&self) -> i32 {
        self.record(SdkCall::StopRecording { recorder: self.id });
        *self.shared.stop_code.lock()
    }
}

/// Surface that counts how often it was detached from its container.
#[derive(Debug)]
pub struct FakeSurface {
    id: u64,
    detaches: Arc<Mutex<HashMap<u64, usize>>>,
}

impl VideoSurface for FakeSurface {
    fn surface_id(&self) -> u64 {
        self.id
    }

    fn detach(&self) {
        *self.detaches.lock().entry(self.id).or_default() += 1;
    }
}

/// Factory handing out [`FakeSurface`]s with increasing ids.
#[derive(Default)]
pub struct FakeSurfaceFactory {
    next_id: AtomicU64,
    detaches: Arc<Mutex<HashMap<u64, usize>>>,
}

impl FakeSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of surfaces created.
    pub fn created(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }

    pub fn detach_count(&self, surface_id: u64) -> usize {
        self.detaches.lock().get(&surface_id).copied().unwrap_or(0)
    }
}

impl SurfaceFactory for FakeSurfaceFactory {
    fn create_surface(&self) -> SurfaceHandle {
        Arc::new(FakeSurface {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            detaches: Arc::clone(&self.detaches),
        })
    }
}

/// Handler that drops every event.
pub struct NullHandler;

impl RtcEventHandler for NullHandler {
    fn handle(&self, _event: RtcEvent) {}
}

/// Runs each task on the posting thread.
pub struct InlineContext;

impl DeliveryContext for InlineContext {
    fn post(&self, task: Task) {
        task();
    }
}
