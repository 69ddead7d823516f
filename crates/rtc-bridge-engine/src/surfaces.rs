//! Local and remote video surfaces and their binding to the engine.
//!
//! Surfaces may be requested before any engine exists. They are kept and
//! bound later by [`SurfaceBinder::rebind_all`], which runs exactly once per
//! successful engine creation.

use std::collections::HashMap;

use tracing::{debug, trace};

use rtc_bridge_ipc::Uid;

use crate::sdk::{EngineHandle, SurfaceFactory, SurfaceHandle, VideoCanvas};

#[derive(Debug)]
struct BoundSurface {
    surface: SurfaceHandle,
    bound: bool,
}

impl BoundSurface {
    fn new(surface: SurfaceHandle) -> Self {
        Self {
            surface,
            bound: false,
        }
    }
}

/// Owns the local surface and the remote surfaces keyed by uid.
#[derive(Debug, Default)]
pub struct SurfaceBinder {
    local: Option<BoundSurface>,
    remote: HashMap<Uid, BoundSurface>,
}

impl SurfaceBinder {
    /// Create an empty binder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the local surface, creating it on first use, then bind it if
    /// an engine is present.
    pub fn acquire_local_surface(
        &mut self,
        engine: Option<&EngineHandle>,
        factory: &dyn SurfaceFactory,
    ) -> SurfaceHandle {
        let surface = match self.local.as_ref() {
            Some(existing) => {
                // Re-hosting: the framework attaches it to a new container.
                existing.surface.detach();
                existing.surface.clone()
            }
            None => {
                let surface = factory.create_surface();
                debug!(surface = surface.surface_id(), "Local surface created");
                self.local = Some(BoundSurface::new(surface.clone()));
                surface
            }
        };

        self.bind_local(engine);
        surface
    }

    /// Return the surface for `uid`, creating it on first use, then bind it
    /// if an engine is present.
    pub fn acquire_remote_surface(
        &mut self,
        engine: Option<&EngineHandle>,
        uid: Uid,
        factory: &dyn SurfaceFactory,
    ) -> SurfaceHandle {
        let surface = match self.remote.get(&uid) {
            Some(existing) => {
                existing.surface.detach();
                existing.surface.clone()
            }
            None => {
                let surface = factory.create_surface();
                debug!(uid, surface = surface.surface_id(), "Remote surface created");
                self.remote.insert(uid, BoundSurface::new(surface.clone()));
                surface
            }
        };

        self.bind_remote(engine, uid);
        surface
    }

    /// Forget the surface for `uid` and stop native frame delivery for it.
    ///
    /// Unknown uids are ignored.
    pub fn release_remote_surface(&mut self, engine: Option<&EngineHandle>, uid: Uid) {
        let Some(entry) = self.remote.remove(&uid) else {
            trace!(uid, "Release of unknown remote surface ignored");
            return;
        };

        entry.surface.detach();
        if let Some(engine) = engine {
            engine.setup_remote_video(&VideoCanvas::unbind(uid));
        }
        debug!(uid, "Remote surface released");
    }

    /// Bind every known surface. Called when an engine appears.
    pub fn rebind_all(&mut self, engine: &EngineHandle) {
        self.bind_local(Some(engine));
        let uids: Vec<Uid> = self.remote.keys().copied().collect();
        for uid in uids {
            self.bind_remote(Some(engine), uid);
        }
    }

    /// Reset binding state after the engine is destroyed: the local surface
    /// is kept but unbound, remote surfaces are dropped.
    pub fn clear_bindings(&mut self) {
        if let Some(local) = self.local.as_mut() {
            local.bound = false;
        }
        self.remote.clear();
    }

    /// Drop every surface.
    pub fn clear(&mut self) {
        self.local = None;
        self.remote.clear();
    }

    /// Whether a local surface exists.
    pub fn has_local(&self) -> bool {
        self.local.is_some()
    }

    /// Whether the local surface is bound to an engine.
    pub fn is_local_bound(&self) -> bool {
        self.local.as_ref().is_some_and(|local| local.bound)
    }

    /// Whether the surface for `uid` is bound to an engine.
    pub fn is_remote_bound(&self, uid: Uid) -> bool {
        self.remote.get(&uid).is_some_and(|remote| remote.bound)
    }

    /// Uids with a remote surface, in ascending order.
    pub fn remote_uids(&self) -> Vec<Uid> {
        let mut uids: Vec<Uid> = self.remote.keys().copied().collect();
        uids.sort_unstable();
        uids
    }

    fn bind_local(&mut self, engine: Option<&EngineHandle>) {
        let (Some(engine), Some(local)) = (engine, self.local.as_mut()) else {
            return;
        };
        engine.setup_local_video(&VideoCanvas::local(local.surface.clone()));
        engine.start_preview();
        local.bound = true;
        trace!(surface = local.surface.surface_id(), "Local surface bound");
    }

    fn bind_remote(&mut self, engine: Option<&EngineHandle>, uid: Uid) {
        let (Some(engine), Some(remote)) = (engine, self.remote.get_mut(&uid)) else {
            return;
        };
        engine.setup_remote_video(&VideoCanvas::remote(uid, remote.surface.clone()));
        remote.bound = true;
        trace!(uid, "Remote surface bound");
    }
}
