use super::AppState;
use crate::categories;
use crate::types::*;
use rand::Rng;

/// Game codes are short, human-shareable, and uppercase.
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 6;

fn generate_game_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Names are trimmed and lowercased; uniqueness is case-insensitive.
fn normalize_name(name: &str) -> Result<PlayerName, String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err("Please enter a name".to_string());
    }
    Ok(name)
}

fn new_player(name: PlayerName, is_host: bool) -> Player {
    Player {
        name,
        is_host,
        score: 0,
        joined_at: chrono::Utc::now().to_rfc3339(),
    }
}

impl AppState {
    /// Create a new session with the caller as host.
    pub async fn create_session(&self, host_name: &str) -> Result<GameSession, String> {
        let host_name = normalize_name(host_name)?;

        // Retry on code collision (rare with 36^6 combinations)
        loop {
            let code = generate_game_code();
            if self.session_exists(&code).await {
                continue;
            }
            let doc = GameSession::new(code, new_player(host_name.clone(), true));
            match self.insert_session(doc).await {
                Ok(session) => {
                    tracing::info!("Created game {} hosted by {}", session.code, host_name);
                    return Ok(session);
                }
                // Lost a create race for this code, roll a new one
                Err(_) => continue,
            }
        }
    }

    /// Join a session by code. Re-joining with a name that is already in the
    /// game is an idempotent no-op returning the existing player.
    pub async fn join_session(
        &self,
        code: &str,
        name: &str,
    ) -> Result<(GameSession, Player), String> {
        let code = code.trim().to_uppercase();
        let name = normalize_name(name)?;

        if let Some(session) = self.get_session(&code).await {
            if let Some(existing) = session.player(&name) {
                return Ok((session.clone(), existing.clone()));
            }
        } else {
            return Err("Game not found. Please check the code.".to_string());
        }

        let session = self
            .update_session(&code, |s| {
                if s.player(&name).is_some() {
                    // Raced with another join under the same name
                    return Ok(());
                }
                s.players.push(new_player(name.clone(), false));
                Ok(())
            })
            .await?;

        let player = session
            .player(&name)
            .cloned()
            .ok_or_else(|| "Failed to join game. Please try again.".to_string())?;
        tracing::info!("{} joined game {}", name, code);
        Ok((session, player))
    }

    /// Host picks a catalog category; the shuffled five-item selection is
    /// written to the document.
    pub async fn select_category(
        &self,
        code: &str,
        actor: &str,
        title: &str,
    ) -> Result<GameSession, String> {
        let category = categories::find(title)
            .ok_or_else(|| format!("Unknown category: {}", title))?;
        let selected = category.randomized();
        self.set_selected_category(code, actor, selected).await
    }

    /// Host rolls a random catalog category.
    pub async fn random_category(&self, code: &str, actor: &str) -> Result<GameSession, String> {
        let selected = categories::random().randomized();
        self.set_selected_category(code, actor, selected).await
    }

    /// Host provides their own category.
    pub async fn set_custom_category(
        &self,
        code: &str,
        actor: &str,
        title: &str,
        items: Vec<String>,
    ) -> Result<GameSession, String> {
        let selected = categories::custom(title, items)?;
        self.set_selected_category(code, actor, selected).await
    }

    async fn set_selected_category(
        &self,
        code: &str,
        actor: &str,
        selected: SelectedCategory,
    ) -> Result<GameSession, String> {
        let actor = actor.to_string();
        self.update_session(code, move |s| {
            ensure_host(s, &actor)?;
            ensure_waiting(s, "change the category")?;
            s.selected_category = Some(selected);
            Ok(())
        })
        .await
    }

    pub async fn set_game_mode(
        &self,
        code: &str,
        actor: &str,
        mode: GameMode,
    ) -> Result<GameSession, String> {
        let actor = actor.to_string();
        self.update_session(code, move |s| {
            ensure_host(s, &actor)?;
            ensure_waiting(s, "change the game mode")?;
            if s.game_mode != mode {
                // Mode parameters do not carry over between modes
                s.target_player = None;
                s.king_player_name = None;
            }
            s.game_mode = mode;
            Ok(())
        })
        .await
    }

    pub async fn set_target_player(
        &self,
        code: &str,
        actor: &str,
        name: &str,
    ) -> Result<GameSession, String> {
        let actor = actor.to_string();
        let name = name.to_lowercase();
        self.update_session(code, move |s| {
            ensure_host(s, &actor)?;
            ensure_waiting(s, "pick the target player")?;
            if s.player(&name).is_none() {
                return Err(format!("{} is not in this game", name));
            }
            s.target_player = Some(name.clone());
            Ok(())
        })
        .await
    }

    pub async fn set_king_player(
        &self,
        code: &str,
        actor: &str,
        name: &str,
    ) -> Result<GameSession, String> {
        let actor = actor.to_string();
        let name = name.to_lowercase();
        self.update_session(code, move |s| {
            ensure_host(s, &actor)?;
            ensure_waiting(s, "pick the king")?;
            if s.player(&name).is_none() {
                return Err(format!("{} is not in this game", name));
            }
            s.king_player_name = Some(name.clone());
            Ok(())
        })
        .await
    }
}

pub(super) fn ensure_host(s: &GameSession, actor: &str) -> Result<(), String> {
    if s.is_host(actor) {
        Ok(())
    } else {
        Err("Only the host can do that".to_string())
    }
}

fn ensure_waiting(s: &GameSession, what: &str) -> Result<(), String> {
    if s.status == GameStatus::Waiting {
        Ok(())
    } else {
        Err(format!("Can only {} while waiting for a round", what))
    }
}
