use nebula_core::{ControlField, ParticleControls};

use crate::bridge::BroadcastBridge;
use crate::error::Result;

/// What a store write touched, so the caller knows what to refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreUpdate {
    /// Size/opacity may have changed: refresh render hints on live systems
    pub hints_changed: bool,
}

/// The surface's copy of the shared parameters.
///
/// Mutated only from the surface's own thread, by local edits or by merging
/// a peer's snapshot. Merges replace the whole snapshot (last write wins).
#[derive(Debug, Clone, Default)]
pub struct SharedConfigStore {
    controls: ParticleControls,
}

impl SharedConfigStore {
    pub fn new(controls: ParticleControls) -> Self {
        Self { controls }
    }

    pub fn get(&self) -> ParticleControls {
        self.controls
    }

    /// Validate and apply one field edit, then publish the full snapshot.
    ///
    /// Out-of-range values are rejected and leave the store unchanged. If
    /// publishing fails the edit still stands locally and the error is
    /// returned.
    pub fn apply_local_edit(
        &mut self,
        field: ControlField,
        value: f64,
        bridge: &mut BroadcastBridge,
    ) -> Result<StoreUpdate> {
        let mut next = self.controls;
        next.set(field, value)?;
        self.controls = next;
        bridge.publish_config(&self.controls)?;
        Ok(StoreUpdate {
            hints_changed: field.is_render_hint(),
        })
    }

    /// Replace every field with a peer's snapshot. Ranges are not checked:
    /// the peer validated on write.
    pub fn merge_remote(&mut self, snapshot: ParticleControls) -> StoreUpdate {
        let hints_changed = self.controls.hints_differ(&snapshot);
        self.controls = snapshot;
        StoreUpdate { hints_changed }
    }
}
