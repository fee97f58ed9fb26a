//! Standings and statistics derived from the registry and the match log.
//!
//! Everything here is a pure function of current state. Nothing is cached:
//! a tournament holds tens to hundreds of records, so full recomputation on
//! every read is cheap. Percentages use [`Decimal`] -- no floating point.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use tourney_types::{Match, Participant, ParticipantId};

use crate::ledger::MatchLog;
use crate::registry::Registry;

/// Number of participants shown on the podium.
pub const PODIUM_SIZE: usize = 3;

/// How often one game type was played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStat {
    /// Game type name as recorded.
    pub game_type: String,
    /// Category recorded with the first match of this game type.
    pub category: String,
    /// Number of matches played.
    pub count: u32,
    /// Share of all matches, in percent.
    pub percentage: Decimal,
}

/// Win/loss record of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStat {
    /// Participant id.
    pub id: ParticipantId,
    /// Current display name.
    pub name: String,
    /// Current star balance.
    pub stars: i64,
    /// Matches won.
    pub wins: u32,
    /// Matches lost.
    pub losses: u32,
    /// `wins / (wins + losses)` in percent, zero without matches.
    pub win_rate: Decimal,
    /// Wins per game type name.
    pub wins_by_game: BTreeMap<String, u32>,
}

/// Competing participants ranked by stars, bank excluded.
pub fn standings(registry: &Registry) -> Vec<&Participant> {
    registry.rank().into_iter().filter(|p| !p.is_bank()).collect()
}

/// The first `size` standings.
pub fn podium(registry: &Registry, size: usize) -> Vec<&Participant> {
    standings(registry).into_iter().take(size).collect()
}

/// The most recently recorded match.
pub fn latest_match(log: &MatchLog) -> Option<&Match> {
    log.latest()
}

/// `part * 100 / whole`, zero when `whole` is zero.
fn percent(part: u32, whole: u32) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(Decimal::from(whole)))
        .unwrap_or(Decimal::ZERO)
}

/// Match counts per game type, most played first.
///
/// Game types with equal counts appear in name order.
pub fn game_statistics(log: &MatchLog) -> Vec<GameStat> {
    let mut groups: BTreeMap<&str, (&str, u32)> = BTreeMap::new();
    for entry in log.matches() {
        let group = groups
            .entry(entry.game_type.as_str())
            .or_insert((entry.game_category.as_str(), 0));
        group.1 = group.1.saturating_add(1);
    }

    let total = u32::try_from(log.len()).unwrap_or(u32::MAX);
    let mut stats: Vec<GameStat> = groups
        .into_iter()
        .map(|(game_type, (category, count))| GameStat {
            game_type: game_type.to_owned(),
            category: category.to_owned(),
            count,
            percentage: percent(count, total),
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Win/loss records of every competing participant, most wins first.
///
/// Matches are attributed by recorded display name, ignoring case.
/// Participants with equal wins keep registry order.
pub fn player_statistics(registry: &Registry, log: &MatchLog) -> Vec<PlayerStat> {
    let mut stats: Vec<PlayerStat> = registry
        .participants()
        .iter()
        .filter(|p| !p.is_bank())
        .map(|p| player_record(p, log.matches()))
        .collect();
    stats.sort_by(|a, b| b.wins.cmp(&a.wins));
    stats
}

fn player_record(participant: &Participant, matches: &[Match]) -> PlayerStat {
    let mut wins: u32 = 0;
    let mut losses: u32 = 0;
    let mut wins_by_game: BTreeMap<String, u32> = BTreeMap::new();

    for entry in matches {
        if participant.name_matches(&entry.winner) {
            wins = wins.saturating_add(1);
            let n = wins_by_game.entry(entry.game_type.clone()).or_insert(0);
            *n = n.saturating_add(1);
        } else if participant.name_matches(&entry.loser) {
            losses = losses.saturating_add(1);
        }
    }

    PlayerStat {
        id: participant.id.clone(),
        name: participant.name.clone(),
        stars: participant.stars,
        wins,
        losses,
        win_rate: percent(wins, wins.saturating_add(losses)),
        wins_by_game,
    }
}
