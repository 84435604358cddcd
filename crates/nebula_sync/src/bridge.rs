use nebula_core::{ParticleControls, CONTROLS_KEY, PANEL_COLLAPSED_KEY, REBUILD_KEY};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::channel::{BroadcastChannel, ChannelEvent};
use crate::error::Result;

/// A decoded message from a peer surface
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteSignal {
    /// Full parameter snapshot, replaces the local one
    Config(ParticleControls),
    /// Discard and regenerate every particle system
    Rebuild(u64),
    /// Control panel collapse state
    PanelCollapsed(bool),
}

/// Maps the store and director onto the broadcast channel keys.
pub struct BroadcastBridge {
    channel: Box<dyn BroadcastChannel>,
    last_rebuild_token: u64,
}

impl BroadcastBridge {
    pub fn new(channel: Box<dyn BroadcastChannel>) -> Self {
        Self {
            channel,
            last_rebuild_token: 0,
        }
    }

    /// Publish the whole snapshot under the controls key
    pub fn publish_config(&mut self, controls: &ParticleControls) -> Result<()> {
        let json = serde_json::to_string(controls)?;
        self.channel.set(CONTROLS_KEY, &json)
    }

    /// Publish a fresh rebuild token. Tokens strictly increase even when the
    /// clock does not.
    pub fn publish_rebuild(&mut self) -> Result<u64> {
        let token = now_millis().max(self.last_rebuild_token + 1);
        self.channel.set(REBUILD_KEY, &token.to_string())?;
        self.last_rebuild_token = token;
        Ok(token)
    }

    pub fn publish_panel_collapsed(&mut self, collapsed: bool) -> Result<()> {
        self.channel
            .set(PANEL_COLLAPSED_KEY, if collapsed { "true" } else { "false" })
    }

    /// Snapshot left in the channel by an earlier surface, if it parses
    pub fn saved_config(&self) -> Option<ParticleControls> {
        let raw = self.read(CONTROLS_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(controls) => Some(controls),
            Err(e) => {
                log::warn!("Ignoring saved {CONTROLS_KEY}: {e}");
                None
            }
        }
    }

    pub fn saved_panel_collapsed(&self) -> Option<bool> {
        let raw = self.read(PANEL_COLLAPSED_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    /// Decode one raw channel change. Unknown keys, removals and payloads that
    /// fail to parse yield `None`; a corrupt broadcast is dropped, never raised.
    pub fn on_remote_change(&mut self, key: &str, raw: Option<&str>) -> Option<RemoteSignal> {
        let raw = raw?;
        match key {
            CONTROLS_KEY => match serde_json::from_str::<ParticleControls>(raw) {
                Ok(controls) => Some(RemoteSignal::Config(controls)),
                Err(e) => {
                    log::warn!("Dropping malformed {key} broadcast: {e}");
                    None
                }
            },
            REBUILD_KEY => match raw.trim().parse::<u64>() {
                Ok(token) => {
                    self.last_rebuild_token = self.last_rebuild_token.max(token);
                    Some(RemoteSignal::Rebuild(token))
                }
                Err(e) => {
                    log::warn!("Dropping malformed {key} broadcast: {e}");
                    None
                }
            },
            PANEL_COLLAPSED_KEY => match serde_json::from_str::<bool>(raw) {
                Ok(collapsed) => Some(RemoteSignal::PanelCollapsed(collapsed)),
                Err(e) => {
                    log::warn!("Dropping malformed {key} broadcast: {e}");
                    None
                }
            },
            _ => None,
        }
    }

    /// Drain and decode everything peers published since the last poll.
    /// Channel failures are logged and yield no signals.
    pub fn poll(&mut self) -> Vec<RemoteSignal> {
        let events = match self.channel.poll() {
            Ok(events) => events,
            Err(e) => {
                log::warn!("Broadcast channel poll failed: {e}");
                return Vec::new();
            }
        };
        events
            .into_iter()
            .filter_map(|ChannelEvent { key, new_value }| {
                self.on_remote_change(&key, new_value.as_deref())
            })
            .collect()
    }

    /// Wipe every key of the session
    pub fn clear(&mut self) -> Result<()> {
        self.channel.clear()
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.channel.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read {key} from broadcast channel: {e}");
                None
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
