//! Ownership of the single native engine handle.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use rtc_bridge_ipc::{BridgeError, EngineConfig};

use crate::sdk::{EngineHandle, RtcEventHandler, RtcSdk};

/// Holds the attached SDK entry point and at most one live engine.
#[derive(Default)]
pub struct EngineRegistry {
    sdk: Option<Arc<dyn RtcSdk>>,
    engine: Option<EngineHandle>,
}

impl EngineRegistry {
    /// Create an empty, detached registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the SDK entry point.
    pub fn attach(&mut self, sdk: Arc<dyn RtcSdk>) {
        debug!("SDK attached");
        self.sdk = Some(sdk);
    }

    /// Destroy any live engine and drop the SDK entry point.
    pub fn detach(&mut self) {
        self.destroy();
        self.sdk = None;
        debug!("SDK detached");
    }

    /// Whether an SDK entry point is attached.
    pub fn is_attached(&self) -> bool {
        self.sdk.is_some()
    }

    /// Create and install the engine.
    #[instrument(name = "create_engine", skip(self, config, handler))]
    pub fn create(
        &mut self,
        config: &EngineConfig,
        handler: Arc<dyn RtcEventHandler>,
    ) -> Result<EngineHandle, BridgeError> {
        if self.engine.is_some() {
            return Err(BridgeError::EngineExists);
        }
        let sdk = self.sdk.as_ref().ok_or(BridgeError::NoContext)?;

        let engine = sdk.create_engine(config, handler).map_err(|e| {
            warn!("Engine creation failed: {}", e);
            BridgeError::EngineCreateFailed(e.message)
        })?;

        self.engine = Some(Arc::clone(&engine));
        info!("Engine created");
        Ok(engine)
    }

    /// Destroy the engine. Returns false if none was installed.
    #[instrument(name = "destroy_engine", skip(self))]
    pub fn destroy(&mut self) -> bool {
        let Some(engine) = self.engine.take() else {
            debug!("No engine to destroy");
            return false;
        };

        match self.sdk.as_ref() {
            Some(sdk) => sdk.destroy_engine(engine),
            None => warn!("Engine outlived its SDK; dropping handle"),
        }

        info!("Engine destroyed");
        true
    }

    /// The live engine, if any.
    pub fn current(&self) -> Option<EngineHandle> {
        self.engine.clone()
    }

    /// The live engine, or `NO_ENGINE`.
    pub fn require(&self) -> Result<EngineHandle, BridgeError> {
        self.current().ok_or(BridgeError::NoEngine)
    }

    /// Whether an engine is installed.
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSdk, NullHandler, SdkCall};

    fn config() -> EngineConfig {
        EngineConfig {
            app_id: "app".to_string(),
        }
    }

    #[test]
    fn test_create_requires_context() {
        let mut registry = EngineRegistry::new();
        let err = registry.create(&config(), Arc::new(NullHandler)).err();
        assert_eq!(err, Some(BridgeError::NoContext));
        assert!(!registry.has_engine());
    }

    #[test]
    fn test_second_create_keeps_first_engine() {
        let sdk = FakeSdk::new();
        let mut registry = EngineRegistry::new();
        registry.attach(sdk.clone());

        let first = registry.create(&config(), Arc::new(NullHandler)).unwrap();
        let err = registry.create(&config(), Arc::new(NullHandler)).err();

        assert_eq!(err, Some(BridgeError::EngineExists));
        let current = registry.current().unwrap();
        assert!(Arc::ptr_eq(&first, &current));
        assert_eq!(sdk.count(|c| matches!(c, SdkCall::CreateEngine { .. })), 1);
    }

    #[test]
    fn test_create_failure_is_wrapped() {
        let sdk = FakeSdk::new();
        sdk.fail_engine_creation("license expired");
        let mut registry = EngineRegistry::new();
        registry.attach(sdk);

        let err = registry.create(&config(), Arc::new(NullHandler)).err();
        assert_eq!(
            err,
            Some(BridgeError::EngineCreateFailed("license expired".to_string()))
        );
        assert!(!registry.has_engine());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let sdk = FakeSdk::new();
        let mut registry = EngineRegistry::new();
        registry.attach(sdk.clone());
        registry.create(&config(), Arc::new(NullHandler)).unwrap();

        assert!(registry.destroy());
        assert!(!registry.destroy());
        assert_eq!(sdk.count(|c| matches!(c, SdkCall::DestroyEngine)), 1);
        assert_eq!(registry.require().err(), Some(BridgeError::NoEngine));
    }

    #[test]
    fn test_detach_destroys_engine() {
        let sdk = FakeSdk::new();
        let mut registry = EngineRegistry::new();
        registry.attach(sdk.clone());
        registry.create(&config(), Arc::new(NullHandler)).unwrap();

        registry.detach();

        assert!(!registry.is_attached());
        assert!(!registry.has_engine());
        assert_eq!(sdk.count(|c| matches!(c, SdkCall::DestroyEngine)), 1);
    }
}
