//! Method channel handler.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use rtc_bridge_ipc::ErrorReply;

use crate::RtcBridgePlugin;

impl RtcBridgePlugin {
    /// Handle one call on the method channel.
    ///
    /// Success carries the SDK's integer result code; failures carry a
    /// stable error code and a message.
    #[instrument(skip(self, args))]
    pub fn handle_method_call(&self, method: &str, args: &Value) -> Result<Value, ErrorReply> {
        debug!("method call");
        match self.bridge.lock().handle_call(method, args) {
            Ok(code) => Ok(Value::from(code)),
            Err(err) => {
                warn!(code = err.code(), "Method call failed: {}", err);
                Err(ErrorReply::from(err))
            }
        }
    }
}
