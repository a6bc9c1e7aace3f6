//! Round scoring. Pure and deterministic: given the same items, responses,
//! players, and mode parameters, the output is always identical. The only
//! randomness in the game (category shuffle) happens at selection time,
//! never here.

use crate::types::*;
use std::collections::HashMap;

/// Mode parameters captured from the session document at finalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeParams<'a> {
    pub target_player: Option<&'a str>,
    pub king_player_name: Option<&'a str>,
    pub poison_item: Option<&'a str>,
}

/// Result of scoring one round.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    /// Absolute new score per player (baseline plus this round's delta).
    pub totals: HashMap<PlayerName, i64>,
    /// Display-only event strings, in a deterministic order.
    pub breakdown: Vec<String>,
}

/// Single scoring entry point, dispatched on the game mode. `totals` starts
/// from each player's pre-round score; players absent from `responses`
/// receive no delta.
pub fn score_round(
    items: &[String],
    responses: &[PlayerResponse],
    players: &[Player],
    mode: GameMode,
    params: ModeParams<'_>,
) -> RoundOutcome {
    let mut outcome = RoundOutcome {
        totals: players.iter().map(|p| (p.name.clone(), p.score)).collect(),
        breakdown: Vec::new(),
    };

    match mode {
        GameMode::Basic => score_basic(items, responses, &mut outcome),
        GameMode::DoYouKnowMe => {
            score_do_you_know_me(items, responses, params.target_player, &mut outcome)
        }
        GameMode::PoisonRound => score_poison(items, responses, params.poison_item, &mut outcome),
        GameMode::HotTake => score_hot_take(items, responses, &mut outcome),
    }

    outcome
}

/// How many responses placed `item` in each tier.
fn tally(responses: &[PlayerResponse], item: &str) -> HashMap<Tier, usize> {
    let mut counts = HashMap::new();
    for resp in responses {
        if let Some(tier) = resp.placements.get(item) {
            *counts.entry(*tier).or_insert(0) += 1;
        }
    }
    counts
}

/// Most-chosen tier for an item. Ties break in Tier::ALL order
/// (FUEGO < MID < TRASH), so the result is deterministic.
fn majority_tier(counts: &HashMap<Tier, usize>) -> Option<Tier> {
    let mut best: Option<(Tier, usize)> = None;
    for tier in Tier::ALL {
        let count = counts.get(&tier).copied().unwrap_or(0);
        if count == 0 {
            continue;
        }
        match best {
            Some((_, n)) if n >= count => {}
            _ => best = Some((tier, count)),
        }
    }
    best.map(|(tier, _)| tier)
}

fn add(outcome: &mut RoundOutcome, name: &str, delta: i64) {
    *outcome.totals.entry(name.to_string()).or_insert(0) += delta;
}

/// Basic: 1 point per other player sharing your tier on an item, +2 when you
/// also sit in the item's majority tier (and matched at least one player).
fn score_basic(items: &[String], responses: &[PlayerResponse], outcome: &mut RoundOutcome) {
    for item in items {
        let counts = tally(responses, item);
        let majority = majority_tier(&counts);

        for resp in responses {
            let Some(tier) = resp.placements.get(item) else {
                continue;
            };
            let matches = counts.get(tier).copied().unwrap_or(0).saturating_sub(1);
            add(outcome, &resp.name, matches as i64);
            if Some(*tier) == majority && matches > 0 {
                add(outcome, &resp.name, 2);
            }
        }
    }
}

/// Do You Know Me: guessers earn 1 per item matching the target's pick and a
/// +2 bonus for matching every item. The target earns 1 per item where at
/// least one guesser matched, capped per item regardless of matcher count.
fn score_do_you_know_me(
    items: &[String],
    responses: &[PlayerResponse],
    target_player: Option<&str>,
    outcome: &mut RoundOutcome,
) {
    let Some(target_name) = target_player else {
        tracing::warn!("Do You Know Me round finalized without a target player");
        return;
    };
    let Some(target) = responses.iter().find(|r| r.name == target_name) else {
        // Gated transitions should make this impossible; score nothing.
        tracing::warn!("Target player {} has no response", target_name);
        return;
    };

    for resp in responses {
        if resp.name == target_name {
            continue;
        }
        let matches = items
            .iter()
            .filter(|item| {
                let picked = target.placements.get(*item);
                picked.is_some() && resp.placements.get(*item) == picked
            })
            .count();
        add(outcome, &resp.name, matches as i64);
        if !items.is_empty() && matches == items.len() {
            add(outcome, &resp.name, 2);
            outcome.breakdown.push(format!(
                "{} read {} like a book: full match! +2",
                resp.name, target_name
            ));
        }
    }

    let mut target_points = 0;
    for item in items {
        let Some(picked) = target.placements.get(item) else {
            continue;
        };
        let matched = responses
            .iter()
            .any(|r| r.name != target_name && r.placements.get(item) == Some(picked));
        if matched {
            target_points += 1;
        }
    }
    add(outcome, target_name, target_points);
}

/// Poison Round: FUEGO on the poison item costs 15 points and forfeits that
/// player's matching bonus for that item only. Everything else scores 1 per
/// matching player, and other players' bonuses are never suppressed.
fn score_poison(
    items: &[String],
    responses: &[PlayerResponse],
    poison_item: Option<&str>,
    outcome: &mut RoundOutcome,
) {
    for item in items {
        let counts = tally(responses, item);
        let is_poison = poison_item == Some(item.as_str());

        for resp in responses {
            let Some(tier) = resp.placements.get(item) else {
                continue;
            };
            if is_poison && *tier == Tier::Fuego {
                add(outcome, &resp.name, -15);
                outcome.breakdown.push(format!(
                    "{} put \"{}\" in FUEGO and drank the poison! -15",
                    resp.name, item
                ));
                continue;
            }
            let matches = counts.get(tier).copied().unwrap_or(0).saturating_sub(1);
            if matches > 0 {
                add(outcome, &resp.name, matches as i64);
            }
        }
    }
}

/// Hot Take: a tier chosen by exactly one player on an item is worth +10 to
/// that player. Tiers with zero or multiple players award nothing.
fn score_hot_take(items: &[String], responses: &[PlayerResponse], outcome: &mut RoundOutcome) {
    for item in items {
        let mut names_by_tier: HashMap<Tier, Vec<&str>> = HashMap::new();
        for resp in responses {
            if let Some(tier) = resp.placements.get(item) {
                names_by_tier.entry(*tier).or_default().push(&resp.name);
            }
        }

        for tier in Tier::ALL {
            let Some(names) = names_by_tier.get(&tier) else {
                continue;
            };
            if let [only] = names.as_slice() {
                add(outcome, only, 10);
                outcome.breakdown.push(format!(
                    "{} had the only {} take on \"{}\"! +10",
                    only,
                    tier.label(),
                    item
                ));
            }
        }
    }
}
