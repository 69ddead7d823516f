//! Command dispatch over the engine registry, surfaces, recorder and relay.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use rtc_bridge_ipc::{
    BridgeCommand, BridgeError, CommandKind, CommandResult, EngineConfig, ViewKind,
};

use crate::recorder::RecorderController;
use crate::registry::EngineRegistry;
use crate::relay::{DeliveryContext, EventRelay, EventSink};
use crate::sdk::{EngineHandle, RtcSdk, SurfaceFactory, SurfaceHandle};
use crate::surfaces::SurfaceBinder;

/// The bridge between the framework's method calls and the native SDK.
///
/// One instance exists per plugin attachment. Commands run one at a time
/// on the caller's context; SDK callbacks reach the subscribed sink through
/// the event relay.
pub struct Bridge {
    registry: EngineRegistry,
    surfaces: SurfaceBinder,
    recorder: RecorderController,
    relay: Arc<EventRelay>,
}

impl Bridge {
    /// Create a detached bridge delivering events on `context`.
    pub fn new(context: Arc<dyn DeliveryContext>) -> Self {
        let relay = Arc::new(EventRelay::new(context));
        Self {
            registry: EngineRegistry::new(),
            surfaces: SurfaceBinder::new(),
            recorder: RecorderController::new(Arc::clone(&relay)),
            relay,
        }
    }

    /// Install the SDK entry point.
    pub fn attach(&mut self, sdk: Arc<dyn RtcSdk>) {
        self.registry.attach(sdk);
        info!("Bridge attached");
    }

    /// Tear everything down: the engine, every surface and the sink.
    #[instrument(name = "bridge_detach", skip(self))]
    pub fn detach(&mut self) {
        self.recorder.reset();
        self.registry.detach();
        self.surfaces.clear();
        self.relay.unsubscribe();
        info!("Bridge detached");
    }

    /// Install the event sink, replacing any previous one.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.relay.subscribe(sink);
    }

    /// Remove the event sink.
    pub fn unsubscribe(&self) {
        self.relay.unsubscribe();
    }

    /// Whether an event sink is installed.
    pub fn has_subscriber(&self) -> bool {
        self.relay.has_subscriber()
    }

    /// Whether an engine is live.
    pub fn has_engine(&self) -> bool {
        self.registry.has_engine()
    }

    pub fn surfaces(&self) -> &SurfaceBinder {
        &self.surfaces
    }

    pub fn recorder(&self) -> &RecorderController {
        &self.recorder
    }

    /// Handle a framework method call.
    ///
    /// Preconditions are checked before the arguments are decoded, so a
    /// command sent without an engine fails with `NO_ENGINE` whatever its
    /// arguments.
    #[instrument(name = "handle_call", skip(self, args))]
    pub fn handle_call(&mut self, method: &str, args: &Value) -> CommandResult {
        let kind = CommandKind::from_method(method).ok_or_else(|| {
            debug!("Unknown method");
            BridgeError::NotImplemented(method.to_string())
        })?;

        self.check_preconditions(kind)?;
        let command = BridgeCommand::decode(kind, args)?;
        self.handle_command(command)
    }

    fn check_preconditions(&self, kind: CommandKind) -> Result<(), BridgeError> {
        if kind == CommandKind::CreateEngine && self.registry.has_engine() {
            return Err(BridgeError::EngineExists);
        }
        if kind.requires_engine() && !self.registry.has_engine() {
            return Err(BridgeError::NoEngine);
        }
        Ok(())
    }

    /// Execute a decoded command.
    pub fn handle_command(&mut self, command: BridgeCommand) -> CommandResult {
        debug!(method = command.kind().method(), "Handling command");

        match command {
            BridgeCommand::CreateEngine(config) => self.create_engine(&config),
            BridgeCommand::DestroyEngine => {
                self.destroy_engine();
                Ok(0)
            }
            BridgeCommand::JoinChannel {
                token,
                channel_id,
                uid,
                options,
            } => self.with_engine(|e| e.join_channel(&token, &channel_id, uid, &options)),
            BridgeCommand::LeaveChannel => self.with_engine(|e| e.leave_channel()),
            BridgeCommand::UpdateChannelMediaOptions(options) => {
                self.with_engine(|e| e.update_channel_media_options(&options))
            }
            BridgeCommand::SetChannelProfile(profile) => {
                self.with_engine(|e| e.set_channel_profile(profile))
            }
            BridgeCommand::RenewToken(token) => self.with_engine(|e| e.renew_token(&token)),
            BridgeCommand::SetClientRole { role, options } => {
                self.with_engine(|e| e.set_client_role(role, options.as_ref()))
            }
            BridgeCommand::MuteAllRemoteAudioStreams(muted) => {
                self.with_engine(|e| e.mute_all_remote_audio_streams(muted))
            }
            BridgeCommand::MuteAllRemoteVideoStreams(muted) => {
                self.with_engine(|e| e.mute_all_remote_video_streams(muted))
            }
            BridgeCommand::MuteRemoteAudioStream { uid, muted } => {
                self.with_engine(|e| e.mute_remote_audio_stream(uid, muted))
            }
            BridgeCommand::MuteRemoteVideoStream { uid, muted } => {
                self.with_engine(|e| e.mute_remote_video_stream(uid, muted))
            }
            BridgeCommand::MuteLocalAudioStream(muted) => {
                self.with_engine(|e| e.mute_local_audio_stream(muted))
            }
            BridgeCommand::MuteLocalVideoStream(muted) => {
                self.with_engine(|e| e.mute_local_video_stream(muted))
            }
            BridgeCommand::SetRemoteVideoStreamType { uid, stream_type } => {
                self.with_engine(|e| e.set_remote_video_stream_type(uid, stream_type))
            }
            BridgeCommand::EnableVideo(enabled) => self.with_engine(|e| {
                if enabled {
                    e.enable_video()
                } else {
                    e.disable_video()
                }
            }),
            BridgeCommand::EnableLocalVideo(enabled) => {
                self.with_engine(|e| e.enable_local_video(enabled))
            }
            BridgeCommand::StartPreview => self.with_engine(|e| e.start_preview()),
            BridgeCommand::StopPreview => self.with_engine(|e| e.stop_preview()),
            BridgeCommand::TakeSnapshot { uid, file_path } => {
                self.with_engine(|e| e.take_snapshot(uid, &file_path))
            }
            BridgeCommand::StartRecording { stream, config } => {
                let engine = self.registry.require()?;
                self.recorder.start(&engine, &stream, &config)
            }
            BridgeCommand::StopRecording => {
                self.registry.require()?;
                self.recorder.stop()
            }
        }
    }

    fn with_engine(&self, call: impl FnOnce(&EngineHandle) -> i32) -> CommandResult {
        let engine = self.registry.require()?;
        let code = call(&engine);
        if code < 0 {
            warn!(code, "Native call returned an error code");
        }
        Ok(code)
    }

    fn create_engine(&mut self, config: &EngineConfig) -> CommandResult {
        let handler = Arc::clone(&self.relay);
        let engine = self.registry.create(config, handler)?;

        self.recorder.reset();
        self.surfaces.rebind_all(&engine);
        Ok(0)
    }

    fn destroy_engine(&mut self) {
        if self.registry.destroy() {
            self.recorder.reset();
        }
        self.surfaces.clear_bindings();
    }

    /// Produce the surface for a platform view, binding it when an engine
    /// is live.
    pub fn acquire_view(&mut self, kind: ViewKind, factory: &dyn SurfaceFactory) -> SurfaceHandle {
        let engine = self.registry.current();
        match kind {
            ViewKind::Local => self.surfaces.acquire_local_surface(engine.as_ref(), factory),
            ViewKind::Remote { uid } => {
                self.surfaces
                    .acquire_remote_surface(engine.as_ref(), uid, factory)
            }
        }
    }

    /// Dispose of a platform view. The local surface outlives its views.
    pub fn release_view(&mut self, kind: ViewKind) {
        match kind {
            ViewKind::Local => debug!("Local view disposed; surface kept"),
            ViewKind::Remote { uid } => {
                let engine = self.registry.current();
                self.surfaces.release_remote_surface(engine.as_ref(), uid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use rtc_bridge_ipc::{
        event_channel, ChannelMediaOptions, MediaRecorderConfig, RecorderState, RecorderStreamType,
        RtcEvent,
    };

    use crate::sdk::RtcEventHandler;

    use crate::testing::{FakeSdk, FakeSurfaceFactory, InlineContext, SdkCall};

    fn attached() -> (Arc<FakeSdk>, Bridge) {
        let sdk = FakeSdk::new();
        let mut bridge = Bridge::new(Arc::new(InlineContext));
        bridge.attach(sdk.clone());
        (sdk, bridge)
    }

    fn created() -> (Arc<FakeSdk>, Bridge) {
        let (sdk, mut bridge) = attached();
        bridge
            .handle_call("createEngine", &json!({"appId": "app"}))
            .unwrap();
        sdk.clear_calls();
        (sdk, bridge)
    }

    #[test]
    fn test_engine_commands_require_engine() {
        let (sdk, mut bridge) = attached();

        for kind in CommandKind::ALL {
            if !kind.requires_engine() {
                continue;
            }
            // Bogus arguments must not matter: the precondition comes first.
            let result = bridge.handle_call(kind.method(), &json!({"uid": "x"}));
            assert_eq!(result, Err(BridgeError::NoEngine), "{}", kind.method());
        }

        assert!(sdk.calls().is_empty());
        assert!(!bridge.has_engine());
        assert_eq!(bridge.recorder().state(), RecorderState::Absent);
    }

    #[test]
    fn test_create_twice_is_engine_exists() {
        let (sdk, mut bridge) = created();

        let result = bridge.handle_call("createEngine", &json!({"appId": "other"}));

        assert_eq!(result, Err(BridgeError::EngineExists));
        assert!(bridge.has_engine());
        assert!(sdk.calls().is_empty());
    }

    #[test]
    fn test_create_engine_exists_before_args() {
        let (_sdk, mut bridge) = created();
        let result = bridge.handle_call("createEngine", &json!({}));
        assert_eq!(result, Err(BridgeError::EngineExists));
    }

    #[test]
    fn test_create_checks_args_before_context() {
        let mut bridge = Bridge::new(Arc::new(InlineContext));

        let blank = bridge.handle_call("createEngine", &json!({"appId": "  "}));
        assert!(matches!(blank, Err(BridgeError::InvalidArgs(_))));

        let detached = bridge.handle_call("createEngine", &json!({"appId": "app"}));
        assert_eq!(detached, Err(BridgeError::NoContext));
    }

    #[test]
    fn test_unknown_method_not_implemented() {
        let (_sdk, mut bridge) = created();
        let result = bridge.handle_call("setBeautyEffect", &Value::Null);
        assert_eq!(
            result,
            Err(BridgeError::NotImplemented("setBeautyEffect".to_string()))
        );
    }

    #[test]
    fn test_local_surface_bound_once_per_create() {
        let (sdk, mut bridge) = attached();
        let factory = FakeSurfaceFactory::new();
        let surface = bridge.acquire_view(ViewKind::Local, &factory);
        assert!(!bridge.surfaces().is_local_bound());

        bridge
            .handle_call("createEngine", &json!({"appId": "app"}))
            .unwrap();

        let bind = SdkCall::SetupLocalVideo {
            surface: Some(surface.surface_id()),
        };
        assert_eq!(sdk.count(|c| *c == bind), 1);
        assert!(bridge.surfaces().is_local_bound());
    }

    #[test]
    fn test_destroy_then_create_rebinds_local_surface() {
        let (sdk, mut bridge) = created();
        let factory = FakeSurfaceFactory::new();
        bridge.acquire_view(ViewKind::Local, &factory);
        bridge.acquire_view(ViewKind::Remote { uid: 9 }, &factory);

        assert_eq!(bridge.handle_call("destroyEngine", &Value::Null), Ok(0));
        assert!(!bridge.surfaces().is_local_bound());
        assert!(bridge.surfaces().remote_uids().is_empty());

        sdk.clear_calls();
        bridge
            .handle_call("createEngine", &json!({"appId": "app"}))
            .unwrap();

        assert!(bridge.surfaces().is_local_bound());
        assert_eq!(sdk.count(|c| matches!(c, SdkCall::SetupLocalVideo { .. })), 1);
        assert_eq!(sdk.count(|c| matches!(c, SdkCall::SetupRemoteVideo { .. })), 0);
    }

    #[test]
    fn test_destroy_without_engine_is_noop() {
        let (sdk, mut bridge) = attached();
        assert_eq!(bridge.handle_call("destroyEngine", &Value::Null), Ok(0));
        assert!(sdk.calls().is_empty());
    }

    #[test]
    fn test_release_remote_view_unbinds_once() {
        let (sdk, mut bridge) = created();
        let factory = FakeSurfaceFactory::new();
        bridge.acquire_view(ViewKind::Remote { uid: 7 }, &factory);
        sdk.clear_calls();

        bridge.release_view(ViewKind::Remote { uid: 7 });
        bridge.release_view(ViewKind::Remote { uid: 7 });
        bridge.release_view(ViewKind::Remote { uid: 8 });

        assert_eq!(
            sdk.calls(),
            vec![SdkCall::SetupRemoteVideo {
                uid: 7,
                surface: None
            }]
        );
    }

    #[test]
    fn test_join_channel_with_partial_options() {
        let (sdk, mut bridge) = created();

        let result = bridge.handle_call(
            "joinChannel",
            &json!({
                "token": "t",
                "channelId": "room",
                "uid": 42,
                "options": {"publishCameraTrack": true}
            }),
        );

        assert_eq!(result, Ok(0));
        assert_eq!(
            sdk.calls(),
            vec![SdkCall::JoinChannel {
                token: "t".to_string(),
                channel_id: "room".to_string(),
                uid: 42,
                options: ChannelMediaOptions {
                    publish_camera_track: Some(true),
                    ..Default::default()
                },
            }]
        );
    }

    #[test]
    fn test_enable_video_false_disables() {
        let (sdk, mut bridge) = created();
        bridge
            .handle_call("enableVideo", &json!({"enabled": false}))
            .unwrap();
        assert_eq!(sdk.calls(), vec![SdkCall::DisableVideo]);
    }

    #[test]
    fn test_set_client_role_without_latency() {
        let (sdk, mut bridge) = created();
        bridge
            .handle_call("setClientRole", &json!({"role": 1}))
            .unwrap();
        assert_eq!(
            sdk.calls(),
            vec![SdkCall::SetClientRole {
                role: 1,
                options: None
            }]
        );
    }

    #[test]
    fn test_start_recording_without_path_creates_nothing() {
        let (sdk, mut bridge) = created();

        let result = bridge.handle_call(
            "startRecording",
            &json!({"config": {"channelId": "room", "uid": 1}}),
        );

        assert!(matches!(result, Err(BridgeError::InvalidArgs(_))));
        assert_eq!(sdk.recorders_created(), 0);
        assert!(sdk.calls().is_empty());
    }

    #[test]
    fn test_stop_recording_without_recorder_is_trivial() {
        let (sdk, mut bridge) = created();
        assert_eq!(bridge.handle_call("stopRecording", &Value::Null), Ok(-1));
        assert!(sdk.calls().is_empty());
    }

    #[test]
    fn test_recording_round_trip() {
        let (sdk, mut bridge) = created();
        let start = json!({"config": {"storagePath": "/data/rec.mp4", "channelId": "room"}});

        assert_eq!(bridge.handle_call("startRecording", &start), Ok(0));
        assert_eq!(bridge.handle_call("stopRecording", &Value::Null), Ok(0));
        sdk.fire_recorder(RtcEvent::recorder_state_changed(Some("room"), 0, 3, 0));

        assert_eq!(bridge.recorder().state(), RecorderState::Absent);
        assert_eq!(sdk.count(|c| matches!(c, SdkCall::DestroyMediaRecorder { .. })), 1);
    }

    #[test]
    fn test_start_recording_passes_config_to_recorder() {
        let (sdk, mut bridge) = created();
        let start = json!({
            "config": {
                "storagePath": "/data/rec.mp4",
                "streamType": 2,
                "maxDurationMs": 60000,
                "recorderInfoUpdateInterval": 1000
            }
        });

        bridge.handle_call("startRecording", &start).unwrap();

        let expected = MediaRecorderConfig {
            stream_type: RecorderStreamType::Video,
            max_duration_ms: 60000,
            recorder_info_update_interval_ms: 1000,
            ..MediaRecorderConfig::new("/data/rec.mp4")
        };
        let started = sdk.count(|c| {
            matches!(c, SdkCall::StartRecording { config, .. } if *config == expected)
        });
        assert_eq!(started, 1);
    }

    #[test]
    fn test_destroy_forgets_recorder() {
        let (_sdk, mut bridge) = created();
        bridge
            .handle_call("startRecording", &json!({"config": {"storagePath": "/a.mp4"}}))
            .unwrap();

        bridge.handle_call("destroyEngine", &Value::Null).unwrap();

        assert!(!bridge.recorder().has_recorder());
    }

    #[test]
    fn test_engine_events_reach_sink() {
        let (sdk, bridge) = created();
        let (tx, rx) = event_channel();
        bridge.subscribe(Arc::new(tx));

        sdk.fire(RtcEvent::UserJoined { uid: 5, elapsed: 10 });

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            RtcEvent::UserJoined { uid: 5, elapsed: 10 }
        );
    }

    #[test]
    fn test_detach_destroys_engine_and_clears_sink() {
        let (sdk, mut bridge) = created();
        let factory = FakeSurfaceFactory::new();
        bridge.acquire_view(ViewKind::Local, &factory);
        let (tx, rx) = event_channel();
        bridge.subscribe(Arc::new(tx));
        let handler = sdk.engine_handler().unwrap();

        bridge.detach();
        handler.handle(RtcEvent::RequestToken {});

        assert!(!bridge.has_subscriber());
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(!bridge.has_engine());
        assert!(!bridge.surfaces().has_local());
        assert_eq!(sdk.count(|c| matches!(c, SdkCall::DestroyEngine)), 1);
        assert_eq!(
            bridge.handle_call("createEngine", &json!({"appId": "app"})),
            Err(BridgeError::NoContext)
        );
    }
}
