//! Ephemeral host presence, keyed by (game code, connection id). Used only to
//! detect host disconnect: when the last key for a code disappears, an event
//! is emitted for the cleanup watcher.

use crate::types::GameCode;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

#[derive(Debug, Clone)]
pub enum PresenceEvent {
    /// No live host connection remains for this game.
    HostGone { code: GameCode },
}

#[derive(Clone)]
pub struct PresenceStore {
    live: Arc<RwLock<HashMap<GameCode, HashSet<String>>>>,
    events: broadcast::Sender<PresenceEvent>,
}

impl PresenceStore {
    pub fn new() -> Self {
        let (events, _rx) = broadcast::channel(64);
        Self {
            live: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.events.subscribe()
    }

    pub async fn set_presence(&self, code: &str, host_uid: &str) {
        let mut live = self.live.write().await;
        live.entry(code.to_string())
            .or_default()
            .insert(host_uid.to_string());
        tracing::debug!("Host presence set for game {} ({})", code, host_uid);
    }

    /// Drop one presence key. Emits `HostGone` when it was the last one.
    pub async fn remove_presence(&self, code: &str, host_uid: &str) {
        let mut live = self.live.write().await;
        let gone = match live.get_mut(code) {
            Some(uids) => {
                uids.remove(host_uid);
                uids.is_empty()
            }
            None => false,
        };
        if gone {
            live.remove(code);
            tracing::info!("Last host connection for game {} is gone", code);
            // No receivers connected is fine
            let _ = self.events.send(PresenceEvent::HostGone {
                code: code.to_string(),
            });
        }
    }

    pub async fn is_live(&self, code: &str) -> bool {
        self.live
            .read()
            .await
            .get(code)
            .map(|uids| !uids.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PresenceStore {
    fn default() -> Self {
        Self::new()
    }
}
