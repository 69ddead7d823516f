//! Host-facing surface of the RTC bridge.
//!
//! The host framework loads this library, attaches the native SDK and a
//! surface factory, then forwards method calls on [`rtc_bridge_ipc::METHOD_CHANNEL`],
//! view requests and event stream subscriptions on
//! [`rtc_bridge_ipc::EVENT_CHANNEL`].

mod commands;
mod views;

pub use views::PlatformView;

use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rtc_bridge_engine::{create_bridge, Bridge, EventSink, RtcSdk, SurfaceFactory};
use rtc_bridge_ipc::{event_channel, RtcEvent, EVENT_CHANNEL, METHOD_CHANNEL};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "rtc_bridge=debug,rtc_bridge_engine=debug";

/// Initialize logging. Later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Plugin state shared with the host's channel handlers.
pub struct RtcBridgePlugin {
    bridge: Mutex<Bridge>,
    surface_factory: Mutex<Option<Arc<dyn SurfaceFactory>>>,
}

impl RtcBridgePlugin {
    /// Create the plugin and its event delivery thread.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self::with_bridge(create_bridge()?))
    }

    /// Create the plugin around an existing bridge.
    pub fn with_bridge(bridge: Bridge) -> Self {
        Self {
            bridge: Mutex::new(bridge),
            surface_factory: Mutex::new(None),
        }
    }

    /// Called when the host attaches the plugin to an application context.
    pub fn on_attached(&self, sdk: Arc<dyn RtcSdk>, surface_factory: Arc<dyn SurfaceFactory>) {
        init_logging();
        self.bridge.lock().attach(sdk);
        *self.surface_factory.lock() = Some(surface_factory);
        info!(methods = METHOD_CHANNEL, events = EVENT_CHANNEL, "Plugin attached");
    }

    /// Called when the host detaches the plugin. Destroys any live engine.
    pub fn on_detached(&self) {
        self.bridge.lock().detach();
        *self.surface_factory.lock() = None;
        info!("Plugin detached");
    }

    /// A listener subscribed to the event channel; events flow into `sink`.
    pub fn on_listen(&self, sink: Arc<dyn EventSink>) {
        self.bridge.lock().subscribe(sink);
    }

    /// Subscribe a bounded channel and return its receiving end.
    pub fn listen(&self) -> Receiver<RtcEvent> {
        let (event_tx, event_rx) = event_channel();
        self.on_listen(Arc::new(event_tx));
        event_rx
    }

    /// The event channel listener went away.
    pub fn on_cancel(&self) {
        self.bridge.lock().unsubscribe();
    }
}

/// Drain pending events as framework messages (non-blocking).
pub fn poll_events(event_rx: &Receiver<RtcEvent>) -> Vec<Value> {
    let events: Vec<Value> = event_rx.try_iter().map(|event| event.to_message()).collect();
    if !events.is_empty() {
        debug!(count = events.len(), "Events drained");
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use serde_json::json;

    use rtc_bridge_engine::testing::{FakeSdk, FakeSurfaceFactory};
    use rtc_bridge_engine::RtcEventHandler;

    pub(crate) fn attached_plugin() -> (Arc<FakeSdk>, RtcBridgePlugin) {
        let sdk = FakeSdk::new();
        let plugin = RtcBridgePlugin::new().unwrap();
        plugin.on_attached(sdk.clone(), Arc::new(FakeSurfaceFactory::new()));
        (sdk, plugin)
    }

    fn poll_until(event_rx: &Receiver<RtcEvent>, count: usize) -> Vec<Value> {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut events = Vec::new();
        while events.len() < count && Instant::now() < deadline {
            events.extend(poll_events(event_rx));
            std::thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }

    #[test]
    fn test_events_arrive_as_messages() {
        let (sdk, plugin) = attached_plugin();
        plugin
            .handle_method_call("createEngine", &json!({"appId": "app"}))
            .unwrap();
        let event_rx = plugin.listen();

        sdk.fire(RtcEvent::join_channel_success(Some("room"), 3, 40));
        sdk.fire(RtcEvent::UserOffline { uid: 4, reason: 1 });

        let events = poll_until(&event_rx, 2);
        assert_eq!(
            events,
            vec![
                json!({
                    "type": "onJoinChannelSuccess",
                    "data": {"channel": "room", "uid": 3, "elapsed": 40}
                }),
                json!({"type": "onUserOffline", "data": {"uid": 4, "reason": 1}}),
            ]
        );
    }

    #[test]
    fn test_cancel_stops_events() {
        let (sdk, plugin) = attached_plugin();
        plugin
            .handle_method_call("createEngine", &json!({"appId": "app"}))
            .unwrap();
        let event_rx = plugin.listen();
        plugin.on_cancel();

        sdk.fire(RtcEvent::RequestToken {});

        assert!(event_rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_detach_destroys_engine_and_silences_events() {
        let (sdk, plugin) = attached_plugin();
        plugin
            .handle_method_call("createEngine", &json!({"appId": "app"}))
            .unwrap();
        let event_rx = plugin.listen();
        let handler = sdk.engine_handler().unwrap();

        plugin.on_detached();
        handler.handle(RtcEvent::RequestToken {});

        assert!(event_rx.recv_timeout(Duration::from_millis(100)).is_err());

        let reply = plugin
            .handle_method_call("leaveChannel", &Value::Null)
            .unwrap_err();
        assert_eq!(reply.code, "NO_ENGINE");
    }
}
