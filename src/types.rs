use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type GameCode = String;
pub type PlayerName = String;

/// The three ranking buckets. The derived ordering (Fuego < Mid < Trash) is
/// the documented tie-break for the Basic-mode majority computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Fuego,
    Mid,
    Trash,
}

impl Tier {
    /// Fixed iteration order for per-item tallies.
    pub const ALL: [Tier; 3] = [Tier::Fuego, Tier::Mid, Tier::Trash];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Fuego => "FUEGO",
            Tier::Mid => "MID",
            Tier::Trash => "TRASH",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GameMode {
    #[default]
    Basic,
    DoYouKnowMe,
    PoisonRound,
    HotTake,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    #[default]
    Waiting,
    Active,
    KingChoosingPoison,
    Reveal,
    Scoreboard,
    /// Forward-compat fallback: an unrecognized status routes to a
    /// display-only screen, never an error.
    #[serde(other)]
    Unknown,
}

/// The category chosen for the current round, after the one-time shuffle and
/// truncation to at most five items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCategory {
    pub title: String,
    pub items: Vec<String>,
    pub is_custom: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Unique key within a session (stored lowercased).
    pub name: PlayerName,
    pub is_host: bool,
    pub score: i64,
    pub joined_at: String,
}

/// One player's locked-in placements for the current round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub name: PlayerName,
    pub placements: HashMap<String, Tier>,
    pub submitted_at: String,
}

/// Immutable historical record of a finished round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub category_title: String,
    /// Points gained (or lost) this round, responders only.
    pub scores_this_round: HashMap<PlayerName, i64>,
    pub breakdown: Vec<String>,
    pub responses: Vec<PlayerResponse>,
}

/// The shared session document. One per game code; every participant holds a
/// live subscription and re-renders from each full snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub code: GameCode,
    pub created_at: String,
    pub status: GameStatus,
    /// Insertion order is join order; first entry is the original host by
    /// convention, `is_host` is the authoritative flag.
    pub players: Vec<Player>,
    pub game_mode: GameMode,
    pub selected_category: Option<SelectedCategory>,
    pub target_player: Option<PlayerName>,
    pub king_player_name: Option<PlayerName>,
    pub poison_item: Option<String>,
    pub responses: Vec<PlayerResponse>,
    pub reveal_index: usize,
    pub rounds: Vec<RoundSummary>,
}

impl GameSession {
    pub fn new(code: GameCode, host: Player) -> Self {
        Self {
            code,
            created_at: chrono::Utc::now().to_rfc3339(),
            status: GameStatus::Waiting,
            players: vec![host],
            game_mode: GameMode::Basic,
            selected_category: None,
            target_player: None,
            king_player_name: None,
            poison_item: None,
            responses: Vec::new(),
            reveal_index: 0,
            rounds: Vec::new(),
        }
    }

    /// Items of the active category (empty before one is selected).
    pub fn items(&self) -> &[String] {
        self.selected_category
            .as_ref()
            .map(|c| c.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn is_host(&self, name: &str) -> bool {
        self.player(name).map(|p| p.is_host).unwrap_or(false)
    }

    pub fn is_king(&self, name: &str) -> bool {
        self.king_player_name.as_deref() == Some(name)
    }

    pub fn response_for(&self, name: &str) -> Option<&PlayerResponse> {
        self.responses.iter().find(|r| r.name == name)
    }

    /// Reveal gate: every joined player has a locked-in response.
    pub fn all_submitted(&self) -> bool {
        !self.players.is_empty() && self.responses.len() == self.players.len()
    }
}
