//! Core of the RTC bridge.
//!
//! This crate owns the native engine handle, binds platform video surfaces
//! to it, runs the media recorder lifecycle and relays SDK callbacks to the
//! framework in order.

mod orchestrator;
mod recorder;
mod registry;
mod relay;
mod sdk;
mod surfaces;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use orchestrator::Bridge;
pub use recorder::{RecorderController, NO_RECORDER_CODE};
pub use registry::EngineRegistry;
pub use relay::{DeliveryContext, DeliveryThread, EventRelay, EventSink, Task};
pub use sdk::{
    EngineHandle, MediaRecorder, RecorderHandle, RtcEngine, RtcEventHandler, RtcSdk, SdkError,
    SurfaceFactory, SurfaceHandle, VideoCanvas, VideoSurface,
};
pub use surfaces::SurfaceBinder;

use std::sync::Arc;

/// Create a bridge with its own event delivery thread.
pub fn create_bridge() -> std::io::Result<Bridge> {
    let context = DeliveryThread::spawn()?;
    Ok(Bridge::new(Arc::new(context)))
}
