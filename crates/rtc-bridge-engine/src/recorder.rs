//! Media recorder lifecycle.
//!
//! Stopping is reconciled in one of two ways. A negative stop code means no
//! confirmation will follow, so the recorder is torn down at once. Otherwise
//! teardown waits for the next `onRecorderStateChanged` from that recorder.
//! Every recorder gets a fresh generation number; an observer only acts on
//! the slot while its generation is current, so a late callback from a
//! destroyed recorder cannot tear down its successor.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use rtc_bridge_ipc::{
    BridgeError, CommandResult, MediaRecorderConfig, RecorderState, RecorderStreamInfo, RtcEvent,
};

use crate::relay::EventRelay;
use crate::sdk::{EngineHandle, RecorderHandle, RtcEventHandler};

/// Returned by `stop` when there is nothing to stop.
pub const NO_RECORDER_CODE: i32 = -1;

#[derive(Default)]
struct RecorderSlot {
    state: RecorderState,
    recorder: Option<RecorderHandle>,
    /// Engine that created `recorder`; needed to destroy it.
    owner: Option<EngineHandle>,
    generation: u64,
}

/// Owns at most one native recorder per engine lifetime.
pub struct RecorderController {
    slot: Arc<Mutex<RecorderSlot>>,
    relay: Arc<EventRelay>,
}

impl RecorderController {
    /// Create a controller whose recorder callbacks go to `relay`.
    pub fn new(relay: Arc<EventRelay>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(RecorderSlot::default())),
            relay,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecorderState {
        self.slot.lock().state
    }

    /// Whether a native recorder exists.
    pub fn has_recorder(&self) -> bool {
        self.slot.lock().recorder.is_some()
    }

    /// Start recording, creating the recorder on first use.
    #[instrument(name = "start_recording", skip_all)]
    pub fn start(
        &self,
        engine: &EngineHandle,
        stream: &RecorderStreamInfo,
        config: &MediaRecorderConfig,
    ) -> CommandResult {
        let existing = {
            let mut slot = self.slot.lock();
            match slot.recorder.clone() {
                Some(recorder) => {
                    if slot.state.is_stop_requested() {
                        debug!("Start cancels pending recorder teardown");
                    }
                    slot.state = RecorderState::Recording;
                    Some(recorder)
                }
                None => {
                    slot.state = RecorderState::Creating;
                    None
                }
            }
        };

        let recorder = match existing {
            Some(recorder) => recorder,
            None => self.create(engine, stream)?,
        };

        let code = recorder.start_recording(config);
        if code < 0 {
            warn!(code, path = %config.storage_path, "Recorder refused to start");
        } else {
            info!(code, path = %config.storage_path, "Recording started");
        }
        Ok(code)
    }

    fn create(
        &self,
        engine: &EngineHandle,
        stream: &RecorderStreamInfo,
    ) -> Result<RecorderHandle, BridgeError> {
        let recorder = engine.create_media_recorder(stream).map_err(|e| {
            warn!("Recorder creation failed: {}", e);
            self.slot.lock().state = RecorderState::Absent;
            BridgeError::RecorderUnsupported(e.message)
        })?;

        let generation = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.recorder = Some(Arc::clone(&recorder));
            slot.owner = Some(Arc::clone(engine));
            slot.state = RecorderState::Recording;
            slot.generation
        };

        recorder.set_observer(Some(Arc::new(RecorderObserver {
            generation,
            slot: Arc::clone(&self.slot),
            relay: Arc::clone(&self.relay),
        })));

        debug!(generation, "Recorder created");
        Ok(recorder)
    }

    /// Stop recording. Without a recorder this is a no-op returning
    /// [`NO_RECORDER_CODE`].
    #[instrument(name = "stop_recording", skip_all)]
    pub fn stop(&self) -> CommandResult {
        let (recorder, generation) = {
            let mut slot = self.slot.lock();
            let Some(recorder) = slot.recorder.clone() else {
                debug!("No recorder to stop");
                return Ok(NO_RECORDER_CODE);
            };
            slot.state = RecorderState::StopRequested;
            (recorder, slot.generation)
        };

        let code = recorder.stop_recording();
        if code < 0 {
            debug!(code, "Stop failed, tearing down recorder now");
            teardown(&self.slot, generation, false);
        }

        info!(code, "Recording stop requested");
        Ok(code)
    }

    /// Forget the recorder without native calls. Used when the engine that
    /// owned it is created or destroyed.
    pub fn reset(&self) {
        let mut slot = self.slot.lock();
        slot.recorder = None;
        slot.owner = None;
        slot.state = RecorderState::Absent;
        slot.generation += 1;
    }
}

struct RecorderObserver {
    generation: u64,
    slot: Arc<Mutex<RecorderSlot>>,
    relay: Arc<EventRelay>,
}

impl RtcEventHandler for RecorderObserver {
    fn handle(&self, event: RtcEvent) {
        let state_changed = matches!(event, RtcEvent::RecorderStateChanged { .. });
        self.relay.emit(event);
        if state_changed {
            teardown(&self.slot, self.generation, true);
        }
    }
}

/// Destroy the recorder of `generation`. With `confirmed_only`, only a
/// recorder whose stop is pending is torn down.
fn teardown(slot: &Mutex<RecorderSlot>, generation: u64, confirmed_only: bool) {
    let (recorder, owner) = {
        let mut slot = slot.lock();
        if slot.generation != generation {
            return;
        }
        if confirmed_only && !slot.state.is_stop_requested() {
            return;
        }
        let (Some(recorder), owner) = (slot.recorder.take(), slot.owner.take()) else {
            return;
        };
        slot.state = RecorderState::Destroying;
        (recorder, owner)
    };

    // No lock is held while calling into the SDK.
    recorder.set_observer(None);
    match owner {
        Some(engine) => engine.destroy_media_recorder(recorder),
        None => warn!("Recorder has no owning engine; dropping handle"),
    }

    let mut slot = slot.lock();
    if slot.generation == generation {
        slot.state = RecorderState::Absent;
    }
    debug!(generation, "Recorder destroyed");
}
