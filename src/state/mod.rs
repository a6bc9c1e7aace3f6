mod phase;
mod ranking;
mod round;
mod score;
mod session;

pub use phase::{is_valid_status_transition, view_for};
pub use ranking::RankingCapture;
pub use score::{score_round, ModeParams, RoundOutcome};

use crate::presence::PresenceStore;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// A stored session document plus its snapshot fan-out channel. Publishing
/// under the same lock that guards the document gives every subscriber a
/// monotonically non-decreasing sequence of snapshots.
struct SessionSlot {
    doc: GameSession,
    watch: broadcast::Sender<GameSession>,
}

/// Shared application state: the in-process session document store and the
/// host presence store.
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<RwLock<HashMap<GameCode, SessionSlot>>>,
    pub presence: PresenceStore,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            presence: PresenceStore::new(),
        }
    }

    /// Insert a freshly created session document and open its snapshot
    /// channel. Fails if the code is already taken.
    pub(crate) async fn insert_session(&self, doc: GameSession) -> Result<GameSession, String> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&doc.code) {
            return Err(format!("Game code {} is already in use", doc.code));
        }
        let (watch, _rx) = broadcast::channel(64);
        let snapshot = doc.clone();
        sessions.insert(doc.code.clone(), SessionSlot { doc, watch });
        Ok(snapshot)
    }

    pub async fn session_exists(&self, code: &str) -> bool {
        self.sessions.read().await.contains_key(code)
    }

    pub async fn get_session(&self, code: &str) -> Option<GameSession> {
        self.sessions.read().await.get(code).map(|s| s.doc.clone())
    }

    /// Subscribe to full-document snapshots for a session.
    pub async fn subscribe(&self, code: &str) -> Option<broadcast::Receiver<GameSession>> {
        self.sessions
            .read()
            .await
            .get(code)
            .map(|s| s.watch.subscribe())
    }

    /// Apply a mutation to a session document and publish the resulting
    /// snapshot, all under the write lock. The closure runs against a draft
    /// copy: if it fails, nothing is stored or published, so subscribers can
    /// never observe a half-applied transition.
    pub async fn update_session<F>(&self, code: &str, mutate: F) -> Result<GameSession, String>
    where
        F: FnOnce(&mut GameSession) -> Result<(), String>,
    {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(code)
            .ok_or_else(|| format!("Game {} not found", code))?;

        let mut draft = slot.doc.clone();
        mutate(&mut draft)?;
        slot.doc = draft.clone();

        // No receivers connected is fine
        let _ = slot.watch.send(draft.clone());
        Ok(draft)
    }

    /// Delete a session document. Dropping the slot closes its snapshot
    /// channel, which ends subscriber loops.
    pub async fn remove_session(&self, code: &str) -> Result<(), String> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| format!("Game {} not found", code))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
