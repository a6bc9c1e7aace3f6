//! Round lifecycle: reveal cursor control and finalization. Finalization is
//! one guarded document update, so concurrent hosts cannot double-score and
//! subscribers never see scores updated without responses cleared.

use super::phase::ensure_transition;
use super::score::{score_round, ModeParams};
use super::session::ensure_host;
use super::AppState;
use crate::types::*;
use std::collections::HashMap;

impl AppState {
    /// Host advances the reveal cursor. On the last item this finalizes the
    /// round instead: scores are computed, the summary is appended, and all
    /// round-scoped fields reset, atomically.
    pub async fn advance_reveal(&self, code: &str, actor: &str) -> Result<GameSession, String> {
        let actor = actor.to_string();
        self.update_session(code, move |s| {
            ensure_host(s, &actor)?;
            if s.status != GameStatus::Reveal {
                return Err("Not currently revealing".to_string());
            }
            let item_count = s.items().len();
            if item_count == 0 {
                return Err("No category items to reveal".to_string());
            }
            if s.reveal_index < item_count - 1 {
                s.reveal_index += 1;
                Ok(())
            } else {
                finalize_round(s)
            }
        })
        .await
    }
}

/// Score the round and flip the document to the scoreboard. Runs inside the
/// guarded update closure; `ensure_transition` rejects a second finalization
/// because the status has already left `Reveal`.
fn finalize_round(s: &mut GameSession) -> Result<(), String> {
    ensure_transition(s, GameStatus::Scoreboard)?;
    let category = s
        .selected_category
        .as_ref()
        .ok_or_else(|| "No category selected for this round".to_string())?;

    let baseline: HashMap<PlayerName, i64> =
        s.players.iter().map(|p| (p.name.clone(), p.score)).collect();

    let outcome = score_round(
        &category.items,
        &s.responses,
        &s.players,
        s.game_mode,
        ModeParams {
            target_player: s.target_player.as_deref(),
            king_player_name: s.king_player_name.as_deref(),
            poison_item: s.poison_item.as_deref(),
        },
    );

    let scores_this_round: HashMap<PlayerName, i64> = s
        .responses
        .iter()
        .map(|r| {
            let total = outcome.totals.get(&r.name).copied().unwrap_or(0);
            let before = baseline.get(&r.name).copied().unwrap_or(0);
            (r.name.clone(), total - before)
        })
        .collect();

    for player in &mut s.players {
        if let Some(total) = outcome.totals.get(&player.name) {
            player.score = *total;
        }
    }

    s.rounds.push(RoundSummary {
        category_title: category.title.clone(),
        scores_this_round,
        breakdown: outcome.breakdown,
        responses: std::mem::take(&mut s.responses),
    });
    s.reveal_index = 0;
    s.game_mode = GameMode::Basic;
    s.target_player = None;
    s.king_player_name = None;
    s.poison_item = None;
    s.status = GameStatus::Scoreboard;

    tracing::info!(
        "Finalized round {} of game {} ({})",
        s.rounds.len(),
        s.code,
        s.rounds.last().map(|r| r.category_title.as_str()).unwrap_or("")
    );
    Ok(())
}
