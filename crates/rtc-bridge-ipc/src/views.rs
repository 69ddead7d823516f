//! Platform view requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::args::Args;
use crate::error::BridgeError;
use crate::types::Uid;
use crate::{LOCAL_VIEW_TYPE, REMOTE_VIEW_TYPE};

/// Which video view the framework asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    /// The local camera view.
    Local,

    /// The view of one remote participant.
    Remote { uid: Uid },
}

impl ViewKind {
    /// Decodes a view type id and its creation arguments.
    pub fn decode(view_type: &str, args: &Value) -> Result<Self, BridgeError> {
        match view_type {
            LOCAL_VIEW_TYPE => Ok(Self::Local),
            REMOTE_VIEW_TYPE => Ok(Self::Remote {
                uid: Args::new(args)?.uid("uid")?,
            }),
            other => Err(BridgeError::NotImplemented(other.to_string())),
        }
    }

    /// The view type id this kind is registered under.
    pub fn view_type(self) -> &'static str {
        match self {
            Self::Local => LOCAL_VIEW_TYPE,
            Self::Remote { .. } => REMOTE_VIEW_TYPE,
        }
    }
}
