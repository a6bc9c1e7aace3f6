//! Player message handlers: joining, the ranking capture events, lock-in,
//! and the king's poison pick.

use super::handlers::{error, Conn};
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::Tier;
use std::sync::Arc;

pub async fn handle_join(
    state: &Arc<AppState>,
    conn: &mut Conn,
    code: String,
    name: String,
) -> Option<ServerMessage> {
    if conn.code.is_some() {
        return error("ALREADY_IN_GAME", "Leave the current game first".to_string());
    }

    match state.join_session(&code, &name).await {
        Ok((session, you)) => {
            conn.code = Some(session.code.clone());
            conn.name = Some(you.name.clone());
            conn.is_host = you.is_host;
            conn.observe_snapshot(&session);

            Some(ServerMessage::Welcome {
                code: session.code.clone(),
                you,
                session,
            })
        }
        Err(e) => error("GAME_NOT_FOUND", e),
    }
}

/// Tier assignment event against the local capture. No store write; the
/// response only reaches the document at lock-in.
pub fn handle_place_item(conn: &mut Conn, item: String, tier: Tier) -> Option<ServerMessage> {
    if conn.identity().is_none() {
        return error("NOT_IN_GAME", "Join a game first".to_string());
    }
    let Some(capture) = conn.capture.as_mut() else {
        return error("NO_ACTIVE_ROUND", "No round is being ranked right now".to_string());
    };

    match capture.place(&item, tier) {
        Ok(()) => Some(ServerMessage::RankingState {
            placements: capture.placements().clone(),
            locked: capture.is_locked(),
            missing: capture.missing_items(),
        }),
        Err(e) => error("PLACEMENT_REJECTED", e),
    }
}

/// Lock the capture and write the response into the session document. A
/// failed store write rolls the lock back so the player can retry.
pub async fn handle_lock_in(state: &Arc<AppState>, conn: &mut Conn) -> Option<ServerMessage> {
    let (code, name) = match conn.identity() {
        Some((code, name)) => (code.to_string(), name.to_string()),
        None => return error("NOT_IN_GAME", "Join a game first".to_string()),
    };
    let Some(capture) = conn.capture.as_mut() else {
        return error("NO_ACTIVE_ROUND", "No round is being ranked right now".to_string());
    };

    let placements = match capture.lock_in() {
        Ok(placements) => placements,
        Err(e) => return error("INCOMPLETE_RANKING", e),
    };

    match state.submit_rankings(&code, &name, placements).await {
        Ok(_) => Some(ServerMessage::SubmissionConfirmed),
        Err(e) => {
            capture.unlock();
            error("SUBMIT_FAILED", e)
        }
    }
}

pub async fn handle_set_poison(
    state: &Arc<AppState>,
    conn: &mut Conn,
    item: String,
) -> Option<ServerMessage> {
    let (code, name) = match conn.identity() {
        Some((code, name)) => (code.to_string(), name.to_string()),
        None => return error("NOT_IN_GAME", "Join a game first".to_string()),
    };

    match state.set_poison_item(&code, &name, &item).await {
        Ok(_) => None,
        Err(e) => error("POISON_REJECTED", e),
    }
}
