use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;

/// A change to one key, as seen by a surface that did not make it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub key: String,
    /// `None` when the key was removed
    pub new_value: Option<String>,
}

/// Session-wide key/value store with change notification.
///
/// Writes are never echoed back to the endpoint that made them; every other
/// endpoint sees them on its next [`poll`](BroadcastChannel::poll), in the
/// order the backend observed them.
pub trait BroadcastChannel: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Drain the changes made by other endpoints since the last poll
    fn poll(&mut self) -> Result<Vec<ChannelEvent>>;
    /// Remove every key
    fn clear(&mut self) -> Result<()>;
}

// --- In-process bus ---

#[derive(Default)]
struct BusState {
    values: HashMap<String, String>,
    queues: HashMap<u64, VecDeque<ChannelEvent>>,
    next_endpoint: u64,
}

impl BusState {
    fn broadcast(&mut self, from: u64, event: ChannelEvent) {
        for (id, queue) in self.queues.iter_mut() {
            if *id != from {
                queue.push_back(event.clone());
            }
        }
    }
}

/// In-process broadcast hub. Each [`MemoryEndpoint`] plays one surface.
#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<BusState>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(&self) -> MemoryEndpoint {
        let mut state = lock(&self.state);
        let id = state.next_endpoint;
        state.next_endpoint += 1;
        state.queues.insert(id, VecDeque::new());
        MemoryEndpoint {
            id,
            state: Arc::clone(&self.state),
        }
    }
}

pub struct MemoryEndpoint {
    id: u64,
    state: Arc<Mutex<BusState>>,
}

impl BroadcastChannel for MemoryEndpoint {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.state).values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut state = lock(&self.state);
        // Storage semantics: rewriting the same value is not a change
        if state.values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        state.values.insert(key.to_string(), value.to_string());
        state.broadcast(
            self.id,
            ChannelEvent {
                key: key.to_string(),
                new_value: Some(value.to_string()),
            },
        );
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<ChannelEvent>> {
        let mut state = lock(&self.state);
        Ok(state
            .queues
            .get_mut(&self.id)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default())
    }

    fn clear(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        let keys: Vec<String> = state.values.drain().map(|(k, _)| k).collect();
        for key in keys {
            state.broadcast(self.id, ChannelEvent { key, new_value: None });
        }
        Ok(())
    }
}

impl Drop for MemoryEndpoint {
    fn drop(&mut self) {
        lock(&self.state).queues.remove(&self.id);
    }
}

fn lock(state: &Mutex<BusState>) -> MutexGuard<'_, BusState> {
    // A panicking peer must not take the bus down with it
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// --- Directory-backed channel ---

/// Channel shared between processes through a directory: one file per key.
///
/// Change detection compares file contents with the last value this endpoint
/// saw or wrote, so a surface never reports its own writes.
pub struct DirChannel {
    root: PathBuf,
    seen: HashMap<String, String>,
}

impl DirChannel {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let mut channel = Self {
            root,
            seen: HashMap::new(),
        };
        // Values already present are state, not changes
        channel.seen = channel.read_all()?;
        Ok(channel)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        let mut values = HashMap::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            // Temp files from in-flight writes
            if name.starts_with('.') {
                continue;
            }
            match fs::read_to_string(entry.path()) {
                Ok(value) => {
                    values.insert(name, value);
                }
                // Removed between read_dir and read
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(values)
    }
}

impl BroadcastChannel for DirChannel {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let tmp = self
            .root
            .join(format!(".{key}.{}.tmp", std::process::id()));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.key_path(key))?;
        self.seen.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<ChannelEvent>> {
        let current = self.read_all()?;
        let mut events = Vec::new();

        let mut keys: Vec<&String> = current.keys().collect();
        keys.sort();
        for key in keys {
            let value = &current[key];
            if self.seen.get(key) != Some(value) {
                events.push(ChannelEvent {
                    key: key.clone(),
                    new_value: Some(value.clone()),
                });
            }
        }

        let mut removed: Vec<&String> = self
            .seen
            .keys()
            .filter(|k| !current.contains_key(*k))
            .collect();
        removed.sort();
        for key in removed {
            events.push(ChannelEvent {
                key: key.clone(),
                new_value: None,
            });
        }

        self.seen = current;
        Ok(events)
    }

    fn clear(&mut self) -> Result<()> {
        for key in self.read_all()?.into_keys() {
            match fs::remove_file(self.key_path(&key)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.seen.clear();
        Ok(())
    }
}
