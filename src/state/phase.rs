//! Game phase state machine. The cycle is
//! waiting -> (active | kingChoosingPoison) -> active -> reveal -> scoreboard
//! -> waiting, repeating until the session document is deleted externally.

use super::session::ensure_host;
use super::AppState;
use crate::protocol::ParticipantView;
use crate::types::*;

/// Allowed status transitions. Everything else is rejected before any write.
pub fn is_valid_status_transition(from: GameStatus, to: GameStatus) -> bool {
    use GameStatus::*;

    matches!(
        (from, to),
        (Waiting, Active)
            | (Waiting, KingChoosingPoison)
            | (KingChoosingPoison, Active)
            | (Active, Reveal)
            | (Reveal, Scoreboard)
            | (Scoreboard, Waiting)
    )
}

pub(super) fn ensure_transition(s: &GameSession, to: GameStatus) -> Result<(), String> {
    if is_valid_status_transition(s.status, to) {
        Ok(())
    } else {
        Err(format!(
            "Invalid status transition from {:?} to {:?}",
            s.status, to
        ))
    }
}

/// Which screen a participant should render for the current snapshot.
/// Derived on every snapshot, never stored.
pub fn view_for(session: &GameSession, name: &str) -> ParticipantView {
    let is_host = session.is_host(name);
    match session.status {
        GameStatus::Waiting if is_host => ParticipantView::Lobby,
        GameStatus::Waiting => ParticipantView::LobbyWait,
        GameStatus::Active => ParticipantView::Ranking,
        GameStatus::KingChoosingPoison if session.is_king(name) => ParticipantView::PoisonPick,
        GameStatus::KingChoosingPoison => ParticipantView::PoisonWait,
        GameStatus::Reveal => ParticipantView::Reveal {
            can_advance: is_host,
        },
        GameStatus::Scoreboard => ParticipantView::Scoreboard {
            can_continue: is_host,
        },
        GameStatus::Unknown => ParticipantView::Unknown,
    }
}

impl AppState {
    /// Host starts a round. Requires a selected category; Do You Know Me
    /// additionally requires a target, and Poison Round defers activation to
    /// the king's poison pick.
    pub async fn start_round(&self, code: &str, actor: &str) -> Result<GameSession, String> {
        let actor = actor.to_string();
        self.update_session(code, move |s| {
            ensure_host(s, &actor)?;
            if s.selected_category.is_none() {
                return Err("Please select a category first".to_string());
            }

            let next = match s.game_mode {
                GameMode::DoYouKnowMe => {
                    match &s.target_player {
                        Some(target) if s.player(target).is_some() => {}
                        _ => {
                            return Err(
                                "Pick a target player for Do You Know Me first".to_string()
                            )
                        }
                    }
                    GameStatus::Active
                }
                GameMode::PoisonRound => {
                    match &s.king_player_name {
                        Some(king) if s.player(king).is_some() => {}
                        _ => return Err("Pick a king for the Poison Round first".to_string()),
                    }
                    GameStatus::KingChoosingPoison
                }
                GameMode::Basic | GameMode::HotTake => GameStatus::Active,
            };
            ensure_transition(s, next)?;

            s.responses.clear();
            s.reveal_index = 0;
            s.poison_item = None;
            s.status = next;
            Ok(())
        })
        .await
    }

    /// The king commits their secret poison pick, which activates the round.
    /// Everyone else is read-only while the session is in kingChoosingPoison.
    pub async fn set_poison_item(
        &self,
        code: &str,
        actor: &str,
        item: &str,
    ) -> Result<GameSession, String> {
        let actor = actor.to_string();
        let item = item.to_string();
        self.update_session(code, move |s| {
            if s.status != GameStatus::KingChoosingPoison {
                return Err("The poison item can only be chosen before the round".to_string());
            }
            if !s.is_king(&actor) {
                return Err("Only the king picks the poison item".to_string());
            }
            if !s.items().iter().any(|i| i == &item) {
                return Err(format!("\"{}\" is not in this round's category", item));
            }
            ensure_transition(s, GameStatus::Active)?;
            s.poison_item = Some(item.clone());
            s.status = GameStatus::Active;
            Ok(())
        })
        .await
    }

    /// Host moves the game to the reveal screen once every player has a
    /// locked-in response.
    pub async fn begin_reveal(&self, code: &str, actor: &str) -> Result<GameSession, String> {
        let actor = actor.to_string();
        self.update_session(code, move |s| {
            ensure_host(s, &actor)?;
            ensure_transition(s, GameStatus::Reveal)?;
            if !s.all_submitted() {
                return Err(format!(
                    "Waiting on rankings: {} of {} submitted",
                    s.responses.len(),
                    s.players.len()
                ));
            }
            s.reveal_index = 0;
            s.status = GameStatus::Reveal;
            Ok(())
        })
        .await
    }

    /// Host closes the scoreboard and returns to the lobby for the next
    /// round. Players (with their updated scores) and history are kept.
    pub async fn next_round(&self, code: &str, actor: &str) -> Result<GameSession, String> {
        let actor = actor.to_string();
        self.update_session(code, move |s| {
            ensure_host(s, &actor)?;
            ensure_transition(s, GameStatus::Waiting)?;
            s.selected_category = None;
            s.game_mode = GameMode::Basic;
            s.target_player = None;
            s.king_player_name = None;
            s.poison_item = None;
            s.responses.clear();
            s.reveal_index = 0;
            s.status = GameStatus::Waiting;
            Ok(())
        })
        .await
    }
}
