use bevy::log::{info, warn};
use bevy::prelude::Resource;
use nebula_core::{ControlField, ParticleControls, Rect, WindowRecord};
use nebula_sync::{
    BroadcastBridge, BroadcastChannel, RegistryEvent, RemoteSignal, SharedConfigStore, SyncError,
    WindowRegistry,
};

use crate::director::SimulationDirector;

/// Everything needed to join a session, held until the window knows where
/// it is on screen.
#[derive(Resource)]
pub struct PendingSurface {
    registry: Box<dyn WindowRegistry>,
    channel: Box<dyn BroadcastChannel>,
    metadata: String,
    seed: Option<u64>,
}

impl PendingSurface {
    pub fn new(
        registry: Box<dyn WindowRegistry>,
        channel: Box<dyn BroadcastChannel>,
        metadata: impl Into<String>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            registry,
            channel,
            metadata: metadata.into(),
            seed,
        }
    }

    /// Register at `rect` and start. Peers never see a placeholder shape.
    pub fn start(mut self, rect: Rect) -> Result<Surface, SyncError> {
        self.registry.set_shape(rect);
        Surface::start(self.registry, self.channel, &self.metadata, self.seed)
    }
}

/// One window's view of the shared particle field.
///
/// Owns the registry membership, the broadcast bridge, the local copy of the
/// controls and the director. Everything is driven from `update`, once per
/// frame, on the thread that owns the resource.
#[derive(Resource)]
pub struct Surface {
    registry: Box<dyn WindowRegistry>,
    bridge: BroadcastBridge,
    store: SharedConfigStore,
    director: SimulationDirector,
    panel_collapsed: bool,
    /// Whether this window has reported a real (non-empty) rectangle yet
    placed: bool,
}

impl Surface {
    /// Join the session: register this window, restore whatever controls an
    /// earlier window left behind and build the first set of systems.
    pub fn start(
        mut registry: Box<dyn WindowRegistry>,
        channel: Box<dyn BroadcastChannel>,
        metadata: &str,
        seed: Option<u64>,
    ) -> Result<Self, SyncError> {
        let me = registry.init(metadata)?;
        let bridge = BroadcastBridge::new(channel);

        let controls = match bridge.saved_config() {
            Some(saved) => {
                info!("Restored saved particle controls");
                saved
            }
            None => ParticleControls::default(),
        };
        let panel_collapsed = bridge.saved_panel_collapsed().unwrap_or(false);

        let mut director = SimulationDirector::new(seed);
        director.set_offset_target(me.rect, false);

        let mut surface = Self {
            registry,
            bridge,
            store: SharedConfigStore::new(controls),
            director,
            panel_collapsed,
            placed: has_area(&me.rect),
        };
        surface.rebuild();

        info!(
            "Surface {} joined as #{} of {}",
            me.id,
            me.index,
            surface.registry.windows().len()
        );
        Ok(surface)
    }

    /// Per-frame driver: registry events, then peer broadcasts, then the
    /// simulation step at session time `time`.
    pub fn update(&mut self, time: f64) {
        let mut topology_changed = false;
        for event in self.registry.update() {
            match event {
                RegistryEvent::ShapeChanged => {
                    if let Some(me) = self.registry.this_window() {
                        self.on_shape_changed(&me);
                    }
                }
                RegistryEvent::TopologyChanged => topology_changed = true,
            }
        }
        if topology_changed {
            self.rebuild();
        }

        for signal in self.bridge.poll() {
            self.apply_signal(signal);
        }

        let windows = self.registry.windows();
        let me = self.registry.this_window();
        let controls = self.store.get();
        self.director
            .frame_tick(time, me.as_ref(), &windows, &controls);
    }

    /// The first real placement snaps; later moves ease
    fn on_shape_changed(&mut self, me: &WindowRecord) {
        if self.placed {
            self.director.set_offset_target(me.rect, true);
            return;
        }
        self.director.set_offset_target(me.rect, false);
        self.director.snap_anchor(me.id, me.rect);
        self.placed = has_area(&me.rect);
    }

    /// Feed one raw channel change through the bridge, as if it had been
    /// polled. Malformed payloads are dropped.
    pub fn handle_remote(&mut self, key: &str, raw: Option<&str>) {
        if let Some(signal) = self.bridge.on_remote_change(key, raw) {
            self.apply_signal(signal);
        }
    }

    fn apply_signal(&mut self, signal: RemoteSignal) {
        match signal {
            RemoteSignal::Config(snapshot) => {
                let update = self.store.merge_remote(snapshot);
                if update.hints_changed {
                    self.director.refresh_render_hints(&self.store.get());
                }
            }
            RemoteSignal::Rebuild(_) => self.rebuild(),
            RemoteSignal::PanelCollapsed(collapsed) => self.panel_collapsed = collapsed,
        }
    }

    /// Edit one control locally and publish the new snapshot to peers
    pub fn edit(&mut self, field: ControlField, value: f64) -> Result<(), SyncError> {
        let outcome = self
            .store
            .apply_local_edit(field, value, &mut self.bridge);
        // A failed publish still leaves the edit applied locally
        let refresh = match &outcome {
            Ok(update) => update.hints_changed,
            Err(SyncError::Control(_)) => false,
            Err(_) => field.is_render_hint(),
        };
        if refresh {
            self.director.refresh_render_hints(&self.store.get());
        }
        outcome.map(|_| ())
    }

    /// Move a control by whole slider steps
    pub fn nudge(&mut self, field: ControlField, steps: i32) -> Result<(), SyncError> {
        let current = self.store.get().get(field);
        let next = field.nudge(current, steps);
        if next == current {
            return Ok(());
        }
        self.edit(field, next)
    }

    /// Regenerate every system here and ask every peer to do the same
    pub fn request_rebuild(&mut self) -> Result<(), SyncError> {
        self.rebuild();
        self.bridge.publish_rebuild()?;
        Ok(())
    }

    pub fn set_panel_collapsed(&mut self, collapsed: bool) -> Result<(), SyncError> {
        self.panel_collapsed = collapsed;
        self.bridge.publish_panel_collapsed(collapsed)
    }

    pub fn toggle_panel(&mut self) -> Result<(), SyncError> {
        self.set_panel_collapsed(!self.panel_collapsed)
    }

    /// Report this window's screen rectangle
    pub fn set_shape(&mut self, rect: Rect) {
        self.registry.set_shape(rect);
    }

    /// Leave the session
    pub fn close(&mut self) {
        self.registry.close();
        info!("Surface left the session");
    }

    fn rebuild(&mut self) {
        let windows = self.registry.windows();
        if windows.is_empty() {
            warn!("Rebuild with no registered windows");
        }
        self.director
            .on_topology_changed(&windows, &self.store.get());
    }

    pub fn controls(&self) -> ParticleControls {
        self.store.get()
    }

    pub fn director(&self) -> &SimulationDirector {
        &self.director
    }

    pub fn windows(&self) -> Vec<WindowRecord> {
        self.registry.windows()
    }

    pub fn this_window(&self) -> Option<WindowRecord> {
        self.registry.this_window()
    }

    pub fn panel_collapsed(&self) -> bool {
        self.panel_collapsed
    }

    /// The leftmost window hosts the control panel
    pub fn is_control_host(&self) -> bool {
        let Some(me) = self.registry.this_window() else {
            return false;
        };
        is_leftmost(&me, &self.registry.windows())
    }
}

fn has_area(rect: &Rect) -> bool {
    rect.w > 0.0 && rect.h > 0.0
}

/// Whether `me` has the smallest x of all `windows`. Ties go to registry order.
pub fn is_leftmost(me: &WindowRecord, windows: &[WindowRecord]) -> bool {
    windows
        .iter()
        .min_by(|a, b| a.rect.x.total_cmp(&b.rect.x).then(a.index.cmp(&b.index)))
        .is_none_or(|first| first.id == me.id)
}
