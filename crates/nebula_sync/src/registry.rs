use nebula_core::{Rect, WindowRecord};
use uuid::Uuid;

use crate::error::Result;

/// Notifications drained from [`WindowRegistry::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// This surface moved or was resized
    ShapeChanged,
    /// Surfaces were added, removed or reordered
    TopologyChanged,
}

/// Tracks which surfaces exist in the session and where they are.
pub trait WindowRegistry: Send + Sync {
    /// Register this surface with free-form metadata
    fn init(&mut self, metadata: &str) -> Result<WindowRecord>;
    /// Every live surface, in registry order
    fn windows(&self) -> Vec<WindowRecord>;
    /// This surface, once initialised
    fn this_window(&self) -> Option<WindowRecord>;
    /// Report this surface's current screen rectangle
    fn set_shape(&mut self, rect: Rect);
    /// Refresh from the backing store and drain pending events
    fn update(&mut self) -> Vec<RegistryEvent>;
    /// Leave the session
    fn close(&mut self);
}

/// Registry whose topology is driven by explicit calls. Used by tests and by
/// simulations that host several surfaces in one process.
pub struct StaticRegistry {
    this_id: Option<Uuid>,
    initial_rect: Rect,
    windows: Vec<WindowRecord>,
    pending: Vec<RegistryEvent>,
}

impl StaticRegistry {
    pub fn new(rect: Rect) -> Self {
        Self {
            this_id: None,
            initial_rect: rect,
            windows: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Add a peer surface at the end of the registry order
    pub fn add_peer(&mut self, rect: Rect) -> Uuid {
        let id = Uuid::new_v4();
        self.windows.push(WindowRecord {
            id,
            rect,
            index: self.windows.len(),
        });
        self.pending.push(RegistryEvent::TopologyChanged);
        id
    }

    /// Remove a peer surface. This surface itself can only leave via `close`.
    pub fn remove_peer(&mut self, id: Uuid) {
        if Some(id) == self.this_id {
            return;
        }
        let before = self.windows.len();
        self.windows.retain(|w| w.id != id);
        if self.windows.len() != before {
            self.reindex();
            self.pending.push(RegistryEvent::TopologyChanged);
        }
    }

    /// Move a peer. Rect changes alone are not a topology change.
    pub fn move_peer(&mut self, id: Uuid, rect: Rect) {
        if let Some(w) = self.windows.iter_mut().find(|w| w.id == id) {
            w.rect = rect;
        }
    }

    fn reindex(&mut self) {
        for (i, w) in self.windows.iter_mut().enumerate() {
            w.index = i;
        }
    }
}

impl WindowRegistry for StaticRegistry {
    fn init(&mut self, _metadata: &str) -> Result<WindowRecord> {
        if let Some(me) = self.this_window() {
            return Ok(me);
        }
        let record = WindowRecord {
            id: Uuid::new_v4(),
            rect: self.initial_rect,
            index: self.windows.len(),
        };
        self.this_id = Some(record.id);
        self.windows.push(record.clone());
        Ok(record)
    }

    fn windows(&self) -> Vec<WindowRecord> {
        self.windows.clone()
    }

    fn this_window(&self) -> Option<WindowRecord> {
        let id = self.this_id?;
        self.windows.iter().find(|w| w.id == id).cloned()
    }

    fn set_shape(&mut self, rect: Rect) {
        let Some(id) = self.this_id else {
            self.initial_rect = rect;
            return;
        };
        if let Some(w) = self.windows.iter_mut().find(|w| w.id == id) {
            if w.rect != rect {
                w.rect = rect;
                self.pending.push(RegistryEvent::ShapeChanged);
            }
        }
    }

    fn update(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.pending)
    }

    fn close(&mut self) {
        if let Some(id) = self.this_id.take() {
            self.windows.retain(|w| w.id != id);
            self.reindex();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_init_registers_self() {
        let mut registry = StaticRegistry::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let me = registry.init("{}").unwrap();
        assert_eq!(registry.windows(), vec![me.clone()]);
        assert_eq!(registry.this_window(), Some(me.clone()));
        // Idempotent
        assert_eq!(registry.init("{}").unwrap().id, me.id);
    }

    #[test]
    fn test_peer_changes_emit_topology_events() {
        let mut registry = StaticRegistry::new(Rect::default());
        registry.init("").unwrap();
        let peer = registry.add_peer(Rect::new(900.0, 0.0, 400.0, 400.0));
        assert_eq!(registry.update(), vec![RegistryEvent::TopologyChanged]);

        registry.move_peer(peer, Rect::new(950.0, 0.0, 400.0, 400.0));
        assert!(registry.update().is_empty());
        assert_eq!(registry.windows()[1].rect.x, 950.0);

        registry.remove_peer(peer);
        assert_eq!(registry.update(), vec![RegistryEvent::TopologyChanged]);
        assert_eq!(registry.windows().len(), 1);
    }

    #[test]
    fn test_own_shape_change() {
        let mut registry = StaticRegistry::new(Rect::default());
        registry.init("").unwrap();
        registry.set_shape(Rect::new(10.0, 20.0, 300.0, 200.0));
        registry.set_shape(Rect::new(10.0, 20.0, 300.0, 200.0));
        assert_eq!(registry.update(), vec![RegistryEvent::ShapeChanged]);
        assert_eq!(registry.this_window().unwrap().rect.y, 20.0);
    }

    #[test]
    fn test_indices_follow_order() {
        let mut registry = StaticRegistry::new(Rect::default());
        registry.init("").unwrap();
        let a = registry.add_peer(Rect::default());
        registry.add_peer(Rect::default());
        registry.remove_peer(a);
        let indices: Vec<usize> = registry.windows().iter().map(|w| w.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
