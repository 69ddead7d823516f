//! Typed framework<->engine messages for the RTC bridge.
//!
//! This crate defines the method names, typed commands, events, errors and
//! shared value types exchanged between the application framework and the
//! engine core.

mod args;
mod commands;
mod error;
mod events;
mod state;
mod types;
mod views;

pub use args::Args;
pub use commands::{decode_media_options, BridgeCommand, CommandKind};
pub use error::{BridgeError, ErrorKind, ErrorReply};
pub use events::RtcEvent;
pub use state::RecorderState;
pub use types::{
    AudienceLatencyLevel, ChannelMediaOptions, ClientRoleOptions, ContainerFormat, EngineConfig,
    LeaveChannelStats, MediaRecorderConfig, RecorderStreamInfo, RecorderStreamType, RenderMode,
    Uid, DEFAULT_MAX_DURATION_MS,
};
pub use views::ViewKind;

use crossbeam_channel::{Receiver, Sender};

/// Name of the method channel.
pub const METHOD_CHANNEL: &str = "rtc_bridge";

/// Name of the event channel.
pub const EVENT_CHANNEL: &str = "rtc_bridge/events";

/// View type id of the local video view.
pub const LOCAL_VIEW_TYPE: &str = "rtc_bridge/local_view";

/// View type id of a remote video view.
pub const REMOTE_VIEW_TYPE: &str = "rtc_bridge/remote_view";

/// Channel capacity for events (Engine → framework).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of a bridge command: the SDK's integer result code.
pub type CommandResult = Result<i32, BridgeError>;

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<RtcEvent>, Receiver<RtcEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}
