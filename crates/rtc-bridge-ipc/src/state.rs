//! Recorder lifecycle state machine types.

use serde::{Deserialize, Serialize};

/// Lifecycle of the native media recorder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecorderState {
    /// No recorder exists.
    #[default]
    Absent,

    /// The native recorder is being created.
    Creating,

    /// A recording was started on the recorder.
    Recording,

    /// Stop was issued; teardown waits for the next state-change callback.
    StopRequested,

    /// The recorder is being torn down.
    Destroying,
}

impl RecorderState {
    /// Returns true if no recorder exists.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns true if a recording is running.
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// Returns true if teardown is pending on a callback.
    pub fn is_stop_requested(&self) -> bool {
        matches!(self, Self::StopRequested)
    }

    /// Returns a simple string representation of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Absent => "Absent",
            Self::Creating => "Creating",
            Self::Recording => "Recording",
            Self::StopRequested => "StopRequested",
            Self::Destroying => "Destroying",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_absent() {
        let state = RecorderState::default();
        assert!(state.is_absent());
        assert!(!state.is_recording());
        assert_eq!(state.name(), "Absent");
    }

    #[test]
    fn test_stop_requested_predicate() {
        assert!(RecorderState::StopRequested.is_stop_requested());
        assert!(!RecorderState::Destroying.is_stop_requested());
    }
}
