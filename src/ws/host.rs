//! Host-only message handlers: session creation, lobby configuration, and
//! round flow control.

use super::handlers::{error, Conn};
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::GameMode;
use std::sync::Arc;

/// Identity plus host-flag check, rejected before any store write.
fn host_identity<'a>(conn: &'a Conn) -> Result<(&'a str, &'a str), Option<ServerMessage>> {
    let Some((code, name)) = conn.identity() else {
        return Err(error("NOT_IN_GAME", "Join a game first".to_string()));
    };
    if !conn.is_host {
        return Err(error("NOT_HOST", "Only the host can do that".to_string()));
    }
    Ok((code, name))
}

pub async fn handle_create_game(
    state: &Arc<AppState>,
    conn: &mut Conn,
    host_name: String,
) -> Option<ServerMessage> {
    if conn.code.is_some() {
        return error("ALREADY_IN_GAME", "Leave the current game first".to_string());
    }

    match state.create_session(&host_name).await {
        Ok(session) => {
            let you = session.players[0].clone();
            let host_uid = ulid::Ulid::new().to_string();
            state.presence.set_presence(&session.code, &host_uid).await;

            conn.code = Some(session.code.clone());
            conn.name = Some(you.name.clone());
            conn.is_host = true;
            conn.host_uid = Some(host_uid);

            Some(ServerMessage::Welcome {
                code: session.code.clone(),
                you,
                session,
            })
        }
        Err(e) => error("CREATE_FAILED", e),
    }
}

pub async fn handle_select_category(
    state: &Arc<AppState>,
    conn: &mut Conn,
    title: String,
) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.select_category(code, name, &title).await {
        Ok(_) => None,
        Err(e) => error("CATEGORY_REJECTED", e),
    }
}

pub async fn handle_random_category(
    state: &Arc<AppState>,
    conn: &mut Conn,
) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.random_category(code, name).await {
        Ok(_) => None,
        Err(e) => error("CATEGORY_REJECTED", e),
    }
}

pub async fn handle_set_custom_category(
    state: &Arc<AppState>,
    conn: &mut Conn,
    title: String,
    items: Vec<String>,
) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.set_custom_category(code, name, &title, items).await {
        Ok(_) => None,
        Err(e) => error("CATEGORY_REJECTED", e),
    }
}

pub async fn handle_set_game_mode(
    state: &Arc<AppState>,
    conn: &mut Conn,
    mode: GameMode,
) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.set_game_mode(code, name, mode).await {
        Ok(_) => None,
        Err(e) => error("MODE_REJECTED", e),
    }
}

pub async fn handle_set_target(
    state: &Arc<AppState>,
    conn: &mut Conn,
    target: String,
) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.set_target_player(code, name, &target).await {
        Ok(_) => None,
        Err(e) => error("TARGET_REJECTED", e),
    }
}

pub async fn handle_set_king(
    state: &Arc<AppState>,
    conn: &mut Conn,
    king: String,
) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.set_king_player(code, name, &king).await {
        Ok(_) => None,
        Err(e) => error("KING_REJECTED", e),
    }
}

pub async fn handle_start_round(state: &Arc<AppState>, conn: &mut Conn) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.start_round(code, name).await {
        Ok(session) => {
            tracing::info!("Round started in game {} ({:?})", code, session.game_mode);
            None
        }
        Err(e) => error("START_REJECTED", e),
    }
}

pub async fn handle_begin_reveal(state: &Arc<AppState>, conn: &mut Conn) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.begin_reveal(code, name).await {
        Ok(_) => None,
        Err(e) => error("REVEAL_REJECTED", e),
    }
}

pub async fn handle_advance_reveal(
    state: &Arc<AppState>,
    conn: &mut Conn,
) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.advance_reveal(code, name).await {
        Ok(_) => None,
        Err(e) => error("ADVANCE_REJECTED", e),
    }
}

pub async fn handle_next_round(state: &Arc<AppState>, conn: &mut Conn) -> Option<ServerMessage> {
    let (code, name) = match host_identity(conn) {
        Ok(id) => id,
        Err(e) => return e,
    };
    match state.next_round(code, name).await {
        Ok(_) => None,
        Err(e) => error("NEXT_ROUND_REJECTED", e),
    }
}
