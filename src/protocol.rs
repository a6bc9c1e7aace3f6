use crate::categories::Category;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateGame {
        host_name: String,
    },
    JoinGame {
        code: String,
        name: String,
    },
    ListCategories,
    // Host-only lobby configuration
    SelectCategory {
        title: String,
    },
    RandomCategory,
    SetCustomCategory {
        title: String,
        items: Vec<String>,
    },
    SetGameMode {
        mode: GameMode,
    },
    SetTargetPlayer {
        name: String,
    },
    SetKingPlayer {
        name: String,
    },
    HostStartRound,
    // King-only during kingChoosingPoison
    SetPoisonItem {
        item: String,
    },
    // Ranking capture events
    PlaceItem {
        item: String,
        tier: Tier,
    },
    LockInRankings,
    // Host-only round flow
    HostBeginReveal,
    HostAdvanceReveal,
    HostNextRound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after a successful create or join.
    Welcome {
        code: GameCode,
        you: Player,
        session: GameSession,
    },
    /// Full document snapshot, pushed on every remote change. `view` is the
    /// derived routing decision for this participant.
    Session {
        session: GameSession,
        view: ParticipantView,
    },
    Categories {
        list: Vec<Category>,
    },
    /// Echo of this connection's in-progress ranking capture.
    RankingState {
        placements: HashMap<String, Tier>,
        locked: bool,
        missing: Vec<String>,
    },
    /// The player's response is in the session document.
    SubmissionConfirmed,
    Error {
        code: String,
        msg: String,
    },
}

/// Which screen a participant should render, derived from the session
/// snapshot and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ParticipantView {
    /// Host in the waiting phase: category / mode setup controls.
    Lobby,
    /// Everyone else in the waiting phase.
    LobbyWait,
    Ranking,
    Reveal { can_advance: bool },
    Scoreboard { can_continue: bool },
    /// The king picks the poison item.
    PoisonPick,
    /// Everyone else while the king is choosing.
    PoisonWait,
    /// Display-only fallback for an unrecognized status.
    Unknown,
}
