//! Cross-group seeding of elimination brackets.

use super::models::{BracketPairing, BracketPlan, BracketSlot, GroupStandings};
use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::{Category, EliminationPhase, NewMatch, TournamentId},
};
use chrono::{DateTime, Duration, Utc};

/// Pick advancing teams position by position across groups
///
/// Every group winner comes before any runner-up, runners-up before third
/// places, and so on; within one position groups keep declaration order.
pub fn select_advancing(groups: &[GroupStandings]) -> Vec<BracketSlot> {
    let deepest = groups.iter().map(|g| g.rows.len()).max().unwrap_or(0);
    let mut seeds = Vec::with_capacity(groups.iter().map(|g| g.rows.len()).sum());

    for position in 0..deepest {
        for group in groups {
            if let Some(row) = group.rows.get(position) {
                seeds.push(BracketSlot {
                    team_id: row.team_id,
                    group_id: group.group_id,
                    position,
                });
            }
        }
    }

    seeds
}

/// Seed an elimination phase from group standings
///
/// # Arguments
///
/// * `groups` - Ranked tables in group declaration order
/// * `phase` - Explicit phase; inferred from the ranked team count when `None`
///
/// # Returns
///
/// * `TournamentResult<BracketPlan>` - Seeds and sequential pairings (1v2, 3v4, ...)
///
/// # Errors
///
/// * `TournamentError::InsufficientTeams` - Fewer than 2 teams advance
pub fn seed_bracket(
    groups: &[GroupStandings],
    phase: Option<EliminationPhase>,
) -> TournamentResult<BracketPlan> {
    let mut seeds = select_advancing(groups);
    let phase = phase.unwrap_or_else(|| EliminationPhase::for_team_count(seeds.len()));

    seeds.truncate(phase.size());
    if seeds.len() < 2 {
        return Err(TournamentError::InsufficientTeams {
            needed: 2,
            actual: seeds.len(),
        });
    }

    let pairs = seeds.chunks_exact(2);
    let unpaired = pairs.remainder().first().copied();
    let pairings = pairs
        .map(|pair| BracketPairing {
            home: pair[0],
            away: pair[1],
        })
        .collect();

    if let Some(slot) = unpaired {
        log::warn!(
            "{} has an odd number of seeds; team {} is left without an opponent",
            phase.label(),
            slot.team_id
        );
    }

    Ok(BracketPlan {
        phase,
        seeds,
        pairings,
        unpaired,
    })
}

impl BracketPlan {
    /// Turn the pairings into matches spaced `slot_interval` apart from `starts_at`
    pub fn to_new_matches(
        &self,
        tournament_id: TournamentId,
        category: Category,
        starts_at: DateTime<Utc>,
        slot_interval: Duration,
    ) -> Vec<NewMatch> {
        self.pairings
            .iter()
            .enumerate()
            .map(|(i, pairing)| NewMatch {
                tournament_id,
                category,
                group_id: None,
                phase: Some(self.phase),
                home_team: pairing.home.team_id,
                away_team: pairing.away.team_id,
                order: i as u32 + 1,
                scheduled_at: Some(starts_at + slot_interval * i as i32),
            })
            .collect()
    }
}
