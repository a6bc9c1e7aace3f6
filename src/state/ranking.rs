//! Ranking capture: the per-connection item -> tier mapping a player builds
//! up before locking in. Partial mappings are fine until lock-in; lock-in
//! reports exactly which items are still missing. Local edits survive
//! unrelated remote snapshots, but a response already on the server wins.

use super::AppState;
use crate::types::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RankingCapture {
    items: Vec<String>,
    placements: HashMap<String, Tier>,
    locked: bool,
}

impl RankingCapture {
    pub fn new(items: &[String]) -> Self {
        Self {
            items: items.to_vec(),
            placements: HashMap::new(),
            locked: false,
        }
    }

    pub fn placements(&self) -> &HashMap<String, Tier> {
        &self.placements
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// True when this capture was built for the given item list.
    pub fn matches_items(&self, items: &[String]) -> bool {
        self.items == items
    }

    pub fn missing_items(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| !self.placements.contains_key(*i))
            .cloned()
            .collect()
    }

    /// Assign (or move) an item to a tier. Rejected after lock-in.
    pub fn place(&mut self, item: &str, tier: Tier) -> Result<(), String> {
        if self.locked {
            return Err("Rankings are already locked in".to_string());
        }
        if !self.items.iter().any(|i| i == item) {
            return Err(format!("\"{}\" is not part of this round", item));
        }
        self.placements.insert(item.to_string(), tier);
        Ok(())
    }

    /// Lock the capture for submission. Fails listing the unranked items if
    /// the mapping is incomplete. Locking an already locked capture is fine.
    pub fn lock_in(&mut self) -> Result<HashMap<String, Tier>, String> {
        let missing = self.missing_items();
        if !missing.is_empty() {
            return Err(format!("Rank all items first. Missing: {}", missing.join(", ")));
        }
        self.locked = true;
        Ok(self.placements.clone())
    }

    /// Roll back a lock whose store write was abandoned, so the player can
    /// edit and retry.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Reconcile against the latest snapshot: if the server already has this
    /// player's response, it overwrites local state and locks the capture.
    pub fn reconcile(&mut self, session: &GameSession, name: &str) {
        if let Some(response) = session.response_for(name) {
            self.placements = response.placements.clone();
            self.locked = true;
        }
    }
}

impl AppState {
    /// Write one complete response into the session document, replacing any
    /// prior response from the same player. Safe to retry.
    pub async fn submit_rankings(
        &self,
        code: &str,
        name: &str,
        placements: HashMap<String, Tier>,
    ) -> Result<GameSession, String> {
        let name = name.to_string();
        self.update_session(code, move |s| {
            if s.status != GameStatus::Active {
                return Err("Rankings can only be submitted during an active round".to_string());
            }
            if s.player(&name).is_none() {
                return Err(format!("{} is not in this game", name));
            }
            let missing: Vec<&String> = s
                .items()
                .iter()
                .filter(|i| !placements.contains_key(*i))
                .collect();
            if !missing.is_empty() {
                return Err(format!(
                    "Rank all items first. Missing: {}",
                    missing
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }

            // Replace, never duplicate
            s.responses.retain(|r| r.name != name);
            s.responses.push(PlayerResponse {
                name: name.clone(),
                placements: placements.clone(),
                submitted_at: chrono::Utc::now().to_rfc3339(),
            });
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<String> {
        vec!["x".to_string(), "y".to_string()]
    }

    #[test]
    fn lock_in_reports_missing_items() {
        let mut capture = RankingCapture::new(&items());
        capture.place("x", Tier::Fuego).unwrap();

        let err = capture.lock_in().unwrap_err();
        assert!(err.contains("y"));
        assert!(!capture.is_locked());

        capture.place("y", Tier::Trash).unwrap();
        let placements = capture.lock_in().unwrap();
        assert!(capture.is_locked());
        assert_eq!(placements.len(), 2);
    }

    #[test]
    fn locked_capture_rejects_mutation() {
        let mut capture = RankingCapture::new(&items());
        capture.place("x", Tier::Fuego).unwrap();
        capture.place("y", Tier::Mid).unwrap();
        capture.lock_in().unwrap();

        assert!(capture.place("x", Tier::Trash).is_err());

        capture.unlock();
        assert!(capture.place("x", Tier::Trash).is_ok());
    }

    #[test]
    fn place_rejects_items_outside_the_round() {
        let mut capture = RankingCapture::new(&items());
        assert!(capture.place("zebra", Tier::Mid).is_err());
    }

    #[test]
    fn reconcile_adopts_the_server_response() {
        let mut session = GameSession::new(
            "ABC123".to_string(),
            Player {
                name: "ana".to_string(),
                is_host: true,
                score: 0,
                joined_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        session.responses.push(PlayerResponse {
            name: "ana".to_string(),
            placements: [("x".to_string(), Tier::Trash)].into_iter().collect(),
            submitted_at: chrono::Utc::now().to_rfc3339(),
        });

        let mut capture = RankingCapture::new(&items());
        capture.place("x", Tier::Fuego).unwrap();
        capture.reconcile(&session, "ana");

        assert!(capture.is_locked());
        assert_eq!(capture.placements()["x"], Tier::Trash);
    }

    #[test]
    fn reconcile_preserves_local_edits_without_a_server_response() {
        let session = GameSession::new(
            "ABC123".to_string(),
            Player {
                name: "ana".to_string(),
                is_host: true,
                score: 0,
                joined_at: chrono::Utc::now().to_rfc3339(),
            },
        );

        let mut capture = RankingCapture::new(&items());
        capture.place("x", Tier::Fuego).unwrap();
        capture.reconcile(&session, "ana");

        assert!(!capture.is_locked());
        assert_eq!(capture.placements()["x"], Tier::Fuego);
    }

    #[tokio::test]
    async fn resubmission_replaces_the_previous_response() {
        let state = AppState::new();
        let session = state.create_session("ana").await.unwrap();
        let code = session.code.clone();
        state
            .set_custom_category(&code, "ana", "Test", vec!["x".into()])
            .await
            .unwrap();
        state.start_round(&code, "ana").await.unwrap();

        let first: HashMap<String, Tier> = [("x".to_string(), Tier::Fuego)].into_iter().collect();
        state.submit_rankings(&code, "ana", first).await.unwrap();

        let second: HashMap<String, Tier> = [("x".to_string(), Tier::Trash)].into_iter().collect();
        let session = state.submit_rankings(&code, "ana", second).await.unwrap();

        assert_eq!(session.responses.len(), 1);
        assert_eq!(session.responses[0].placements["x"], Tier::Trash);
    }

    #[tokio::test]
    async fn incomplete_submission_is_rejected_with_missing_items() {
        let state = AppState::new();
        let session = state.create_session("ana").await.unwrap();
        let code = session.code.clone();
        state
            .set_custom_category(&code, "ana", "Test", vec!["x".into(), "y".into()])
            .await
            .unwrap();
        state.start_round(&code, "ana").await.unwrap();

        let partial: HashMap<String, Tier> = [("x".to_string(), Tier::Fuego)].into_iter().collect();
        let err = state
            .submit_rankings(&code, "ana", partial)
            .await
            .unwrap_err();
        assert!(err.contains("y"));

        let session = state.get_session(&code).await.unwrap();
        assert!(session.responses.is_empty());
    }

    #[tokio::test]
    async fn submission_outside_active_round_is_rejected() {
        let state = AppState::new();
        let session = state.create_session("ana").await.unwrap();
        let placements: HashMap<String, Tier> = HashMap::new();
        let result = state.submit_rankings(&session.code, "ana", placements).await;
        assert!(result.unwrap_err().contains("active round"));
    }
}
