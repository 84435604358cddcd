use nebula_core::{Rect, WindowRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::{Result, SyncError};
use crate::registry::{RegistryEvent, WindowRegistry};

/// A record is considered dead once its heartbeat is this old
pub const STALE_AFTER_MS: u64 = 3_000;

/// Minimum time between heartbeat writes
const HEARTBEAT_INTERVAL_MS: u64 = 250;

/// One surface as persisted in the session directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWindow {
    pub id: Uuid,
    pub rect: Rect,
    pub created_ms: u64,
    pub heartbeat_ms: u64,
    pub metadata: String,
}

/// Save a window record to disk as bincode
pub fn save_record(record: &StoredWindow, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = bincode::serialize(record)?;
    // Write-then-rename so readers never see a torn record
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a window record from disk
pub fn load_record(path: &Path) -> Result<StoredWindow> {
    let data = fs::read(path)?;
    Ok(bincode::deserialize(&data)?)
}

/// Window registry shared between processes through a session directory.
///
/// Every surface keeps `<dir>/<uuid>.bin` fresh with a heartbeat; the
/// registry order is creation time, then id.
pub struct SessionRegistry {
    dir: PathBuf,
    me: Option<StoredWindow>,
    /// Shape reported before `init`
    initial_rect: Rect,
    windows: Vec<WindowRecord>,
    last_heartbeat_ms: u64,
    pending: Vec<RegistryEvent>,
}

impl SessionRegistry {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            me: None,
            initial_rect: Rect::default(),
            windows: Vec::new(),
            last_heartbeat_ms: 0,
            pending: Vec::new(),
        })
    }

    /// Forget every window of the session in `dir`. Running surfaces
    /// re-register on their next heartbeat.
    pub fn clear_all(dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "bin") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.bin"))
    }

    fn write_self(&mut self, now_ms: u64) -> Result<()> {
        let Some(me) = self.me.as_mut() else {
            return Err(SyncError::NotInitialised);
        };
        me.heartbeat_ms = now_ms;
        let record = me.clone();
        save_record(&record, &self.record_path(record.id))?;
        self.last_heartbeat_ms = now_ms;
        Ok(())
    }

    /// Read every live record, deleting stale ones
    fn scan(&self, now_ms: u64) -> Result<Vec<StoredWindow>> {
        let my_id = self.me.as_ref().map(|m| m.id);
        let mut live = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "bin") {
                continue;
            }
            let record = match load_record(&path) {
                Ok(record) => record,
                Err(SyncError::Io(e)) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    log::warn!("Skipping unreadable window record {}: {e}", path.display());
                    continue;
                }
            };

            let age = now_ms.saturating_sub(record.heartbeat_ms);
            if Some(record.id) != my_id && age > STALE_AFTER_MS {
                log::debug!("Pruning stale window {} ({age} ms old)", record.id);
                if let Err(e) = fs::remove_file(&path) {
                    log::debug!("Could not remove {}: {e}", path.display());
                }
                continue;
            }
            live.push(record);
        }

        live.sort_by(|a, b| a.created_ms.cmp(&b.created_ms).then(a.id.cmp(&b.id)));
        Ok(live)
    }

    /// [`WindowRegistry::update`] against an explicit clock
    pub fn update_at(&mut self, now_ms: u64) -> Vec<RegistryEvent> {
        if self.me.is_some() && now_ms.saturating_sub(self.last_heartbeat_ms) >= HEARTBEAT_INTERVAL_MS
        {
            if let Err(e) = self.write_self(now_ms) {
                log::warn!("Window heartbeat failed: {e}");
            }
        }

        match self.scan(now_ms) {
            Ok(live) => {
                let windows: Vec<WindowRecord> = live
                    .into_iter()
                    .enumerate()
                    .map(|(index, w)| WindowRecord {
                        id: w.id,
                        rect: w.rect,
                        index,
                    })
                    .collect();
                let before: Vec<Uuid> = self.windows.iter().map(|w| w.id).collect();
                let after: Vec<Uuid> = windows.iter().map(|w| w.id).collect();
                if before != after {
                    self.pending.push(RegistryEvent::TopologyChanged);
                }
                self.windows = windows;
            }
            Err(e) => log::warn!("Window registry scan failed: {e}"),
        }

        std::mem::take(&mut self.pending)
    }

    /// [`WindowRegistry::init`] against an explicit clock
    pub fn init_at(&mut self, metadata: &str, rect: Rect, now_ms: u64) -> Result<WindowRecord> {
        if self.me.is_none() {
            self.me = Some(StoredWindow {
                id: Uuid::new_v4(),
                rect,
                created_ms: now_ms,
                heartbeat_ms: now_ms,
                metadata: metadata.to_string(),
            });
        }
        self.write_self(now_ms)?;
        self.update_at(now_ms);
        // Our own arrival is not news to us
        self.pending.clear();
        self.this_window().ok_or(SyncError::NotInitialised)
    }
}

impl WindowRegistry for SessionRegistry {
    fn init(&mut self, metadata: &str) -> Result<WindowRecord> {
        let rect = self.me.as_ref().map_or(self.initial_rect, |m| m.rect);
        self.init_at(metadata, rect, now_millis())
    }

    fn windows(&self) -> Vec<WindowRecord> {
        self.windows.clone()
    }

    fn this_window(&self) -> Option<WindowRecord> {
        let id = self.me.as_ref()?.id;
        self.windows.iter().find(|w| w.id == id).cloned()
    }

    fn set_shape(&mut self, rect: Rect) {
        let Some(me) = self.me.as_mut() else {
            self.initial_rect = rect;
            return;
        };
        if me.rect == rect {
            return;
        }
        me.rect = rect;
        let id = me.id;
        if let Some(w) = self.windows.iter_mut().find(|w| w.id == id) {
            w.rect = rect;
        }
        // Force the next update to publish the new shape
        self.last_heartbeat_ms = 0;
        self.pending.push(RegistryEvent::ShapeChanged);
    }

    fn update(&mut self) -> Vec<RegistryEvent> {
        self.update_at(now_millis())
    }

    fn close(&mut self) {
        if let Some(me) = self.me.take() {
            let path = self.record_path(me.id);
            if let Err(e) = fs::remove_file(&path) {
                log::debug!("Could not remove {}: {e}", path.display());
            }
            self.windows.retain(|w| w.id != me.id);
        }
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.close();
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect(x: f32) -> Rect {
        Rect::new(x, 0.0, 400.0, 300.0)
    }

    #[test]
    fn test_record_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let record = StoredWindow {
            id: Uuid::new_v4(),
            rect: rect(12.0),
            created_ms: 5,
            heartbeat_ms: 9,
            metadata: "{\"foo\":\"bar\"}".into(),
        };
        let path = dir.path().join("w.bin");
        save_record(&record, &path).unwrap();
        assert_eq!(load_record(&path).unwrap(), record);
    }

    #[test]
    fn test_two_surfaces_see_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = SessionRegistry::open(dir.path()).unwrap();
        let mut b = SessionRegistry::open(dir.path()).unwrap();

        let me_a = a.init_at("a", rect(0.0), 1_000).unwrap();
        assert_eq!(me_a.index, 0);
        let me_b = b.init_at("b", rect(500.0), 1_100).unwrap();
        assert_eq!(me_b.index, 1);
        assert_eq!(b.windows().len(), 2);

        assert_eq!(a.update_at(1_200), vec![RegistryEvent::TopologyChanged]);
        let ids: Vec<Uuid> = a.windows().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![me_a.id, me_b.id]);
        assert!(a.update_at(1_300).is_empty());
    }

    #[test]
    fn test_stale_and_closed_windows_leave() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = SessionRegistry::open(dir.path()).unwrap();
        let mut b = SessionRegistry::open(dir.path()).unwrap();
        a.init_at("a", rect(0.0), 1_000).unwrap();
        b.init_at("b", rect(500.0), 1_000).unwrap();
        a.update_at(1_000);
        assert_eq!(a.windows().len(), 2);

        // b stops heart-beating
        a.update_at(1_000 + STALE_AFTER_MS / 2);
        assert_eq!(a.windows().len(), 2);
        let events = a.update_at(1_000 + STALE_AFTER_MS * 2);
        assert_eq!(events, vec![RegistryEvent::TopologyChanged]);
        assert_eq!(a.windows().len(), 1);

        let mut c = SessionRegistry::open(dir.path()).unwrap();
        c.init_at("c", rect(900.0), 10_000).unwrap();
        a.update_at(10_000);
        assert_eq!(a.windows().len(), 2);
        c.close();
        assert_eq!(a.update_at(10_100), vec![RegistryEvent::TopologyChanged]);
        assert_eq!(a.windows().len(), 1);
    }

    #[test]
    fn test_shape_change_is_local_event() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = SessionRegistry::open(dir.path()).unwrap();
        let mut b = SessionRegistry::open(dir.path()).unwrap();
        let me_a = a.init_at("a", rect(0.0), 1_000).unwrap();
        b.init_at("b", rect(500.0), 1_000).unwrap();
        a.update_at(1_000);

        a.set_shape(rect(40.0));
        assert_eq!(a.update_at(1_050), vec![RegistryEvent::ShapeChanged]);
        assert_eq!(a.this_window().unwrap().rect.x, 40.0);

        // Peers see the new rect without a topology change
        assert!(b.update_at(1_060).is_empty());
        let seen = b.windows().into_iter().find(|w| w.id == me_a.id).unwrap();
        assert_eq!(seen.rect.x, 40.0);
    }

    #[test]
    fn test_clear_all_removes_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = SessionRegistry::open(dir.path()).unwrap();
        a.init_at("a", rect(0.0), 1_000).unwrap();
        assert_eq!(SessionRegistry::clear_all(dir.path()).unwrap(), 1);
        assert_eq!(SessionRegistry::clear_all(dir.path().join("missing")).unwrap(), 0);
    }

    #[test]
    fn test_corrupt_record_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("junk.bin"), b"\x01\x02").unwrap();
        let mut a = SessionRegistry::open(dir.path()).unwrap();
        a.init_at("a", rect(0.0), 1_000).unwrap();
        assert_eq!(a.windows().len(), 1);
    }
}
