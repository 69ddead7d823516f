//! Error taxonomy for bridge commands.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned to the framework side for a method call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// A request field is missing or malformed.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// The command needs an engine but none is installed.
    #[error("RTC engine is not initialized")]
    NoEngine,

    /// An engine is already installed.
    #[error("RTC engine is already initialized")]
    EngineExists,

    /// The plugin is not attached to a host, so no SDK entry point exists.
    #[error("plugin is not attached to a host context")]
    NoContext,

    /// The SDK failed to create an engine.
    #[error("engine creation failed: {0}")]
    EngineCreateFailed(String),

    /// The SDK build or platform cannot create a media recorder.
    #[error("media recorder unsupported: {0}")]
    RecorderUnsupported(String),

    /// The method name is not part of the bridge surface.
    #[error("method not implemented: {0}")]
    NotImplemented(String),
}

/// Broad classes of [`BridgeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad request data, recovered locally.
    InvalidArgument,

    /// Engine lifecycle misuse by the caller.
    PreconditionViolation,

    /// The native SDK reported a failure.
    NativeFailure,

    /// Capability absent on this build or platform.
    Unsupported,
}

impl BridgeError {
    /// Stable error code sent across the bridge.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgs(_) => "INVALID_ARGS",
            Self::NoEngine => "NO_ENGINE",
            Self::EngineExists => "ENGINE_EXISTS",
            Self::NoContext => "NO_CONTEXT",
            Self::EngineCreateFailed(_) => "ENGINE_CREATE_FAILED",
            Self::RecorderUnsupported(_) => "RECORDER_UNSUPPORTED",
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
        }
    }

    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgs(_) => ErrorKind::InvalidArgument,
            Self::NoEngine | Self::EngineExists | Self::NoContext => {
                ErrorKind::PreconditionViolation
            }
            Self::EngineCreateFailed(_) => ErrorKind::NativeFailure,
            Self::RecorderUnsupported(_) | Self::NotImplemented(_) => ErrorKind::Unsupported,
        }
    }

    /// Shorthand for an [`BridgeError::InvalidArgs`] error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }
}

/// Serialized form of an error, as delivered to the framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    /// Stable error code (e.g. `NO_ENGINE`).
    pub code: String,

    /// Human readable message.
    pub message: String,
}

impl From<&BridgeError> for ErrorReply {
    fn from(err: &BridgeError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<BridgeError> for ErrorReply {
    fn from(err: BridgeError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(BridgeError::NoEngine.code(), "NO_ENGINE");
        assert_eq!(BridgeError::EngineExists.code(), "ENGINE_EXISTS");
        assert_eq!(BridgeError::invalid("x").code(), "INVALID_ARGS");
        assert_eq!(
            BridgeError::RecorderUnsupported("no".into()).code(),
            "RECORDER_UNSUPPORTED"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(BridgeError::NoEngine.kind(), ErrorKind::PreconditionViolation);
        assert_eq!(
            BridgeError::EngineCreateFailed("boom".into()).kind(),
            ErrorKind::NativeFailure
        );
        assert_eq!(BridgeError::invalid("x").kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_reply_carries_code_and_message() {
        let reply = ErrorReply::from(BridgeError::invalid("channelId is empty"));
        assert_eq!(reply.code, "INVALID_ARGS");
        assert_eq!(reply.message, "invalid arguments: channelId is empty");
    }
}
