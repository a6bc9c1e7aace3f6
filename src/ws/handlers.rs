//! Message dispatch. Every state-changing action is authorized here, before
//! any store write: host-only messages check the connection's host flag, the
//! poison pick is validated against the king inside the guarded update.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, RankingCapture};
use crate::types::{GameCode, GameSession, GameStatus, PlayerName};
use std::sync::Arc;

/// Per-connection context: which session and player this socket speaks for,
/// plus the in-progress ranking capture.
#[derive(Debug, Default)]
pub struct Conn {
    pub code: Option<GameCode>,
    pub name: Option<PlayerName>,
    pub is_host: bool,
    /// Presence key registered for host connections.
    pub host_uid: Option<String>,
    pub capture: Option<RankingCapture>,
}

impl Conn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<(&str, &str)> {
        match (&self.code, &self.name) {
            (Some(code), Some(name)) => Some((code.as_str(), name.as_str())),
            _ => None,
        }
    }

    /// Apply a received snapshot to this connection's local state: build the
    /// capture when a round goes active, reconcile it against the server's
    /// responses, and drop it once the round is over.
    pub fn observe_snapshot(&mut self, session: &GameSession) {
        match session.status {
            GameStatus::Active => {
                let items = session.items();
                let stale = self
                    .capture
                    .as_ref()
                    .map(|c| !c.matches_items(items))
                    .unwrap_or(true);
                if stale {
                    self.capture = Some(RankingCapture::new(items));
                }
                if let (Some(name), Some(capture)) = (&self.name, &mut self.capture) {
                    capture.reconcile(session, name);
                }
            }
            GameStatus::Waiting | GameStatus::Scoreboard => self.capture = None,
            _ => {}
        }
    }
}

pub(crate) fn error(code: &str, msg: String) -> Option<ServerMessage> {
    Some(ServerMessage::Error {
        code: code.to_string(),
        msg,
    })
}

/// Handle a single client message. `None` means there is no direct reply;
/// mutations reach every participant through the snapshot subscription.
pub async fn handle_message(
    msg: ClientMessage,
    conn: &mut Conn,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    use ClientMessage::*;

    match msg {
        CreateGame { host_name } => super::host::handle_create_game(state, conn, host_name).await,
        JoinGame { code, name } => super::player::handle_join(state, conn, code, name).await,
        ListCategories => Some(ServerMessage::Categories {
            list: crate::categories::catalog().to_vec(),
        }),
        SelectCategory { title } => {
            super::host::handle_select_category(state, conn, title).await
        }
        RandomCategory => super::host::handle_random_category(state, conn).await,
        SetCustomCategory { title, items } => {
            super::host::handle_set_custom_category(state, conn, title, items).await
        }
        SetGameMode { mode } => super::host::handle_set_game_mode(state, conn, mode).await,
        SetTargetPlayer { name } => super::host::handle_set_target(state, conn, name).await,
        SetKingPlayer { name } => super::host::handle_set_king(state, conn, name).await,
        HostStartRound => super::host::handle_start_round(state, conn).await,
        SetPoisonItem { item } => super::player::handle_set_poison(state, conn, item).await,
        PlaceItem { item, tier } => super::player::handle_place_item(conn, item, tier),
        LockInRankings => super::player::handle_lock_in(state, conn).await,
        HostBeginReveal => super::host::handle_begin_reveal(state, conn).await,
        HostAdvanceReveal => super::host::handle_advance_reveal(state, conn).await,
        HostNextRound => super::host::handle_next_round(state, conn).await,
    }
}
