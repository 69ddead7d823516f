//! Platform view factory.

use serde_json::Value;
use tracing::{debug, instrument};

use rtc_bridge_engine::SurfaceHandle;
use rtc_bridge_ipc::{BridgeError, ErrorReply, ViewKind};

use crate::RtcBridgePlugin;

/// A view handed to the host. Dispose it through
/// [`RtcBridgePlugin::dispose_view`].
#[derive(Debug, Clone)]
pub struct PlatformView {
    pub kind: ViewKind,
    pub surface: SurfaceHandle,
}

impl PlatformView {
    /// The view type id the host registered this view under.
    pub fn view_type(&self) -> &'static str {
        self.kind.view_type()
    }
}

impl RtcBridgePlugin {
    /// Create the view registered under `view_type`.
    #[instrument(skip(self, args))]
    pub fn create_view(&self, view_type: &str, args: &Value) -> Result<PlatformView, ErrorReply> {
        let kind = ViewKind::decode(view_type, args)?;
        let factory = self
            .surface_factory
            .lock()
            .clone()
            .ok_or(BridgeError::NoContext)?;

        let surface = self.bridge.lock().acquire_view(kind, factory.as_ref());
        debug!(surface = surface.surface_id(), "View created");
        Ok(PlatformView { kind, surface })
    }

    /// The host disposed of `view`.
    pub fn dispose_view(&self, view: &PlatformView) {
        self.bridge.lock().release_view(view.kind);
    }
}
