//! Linear play ordering that keeps teams rested between appearances.

use crate::tournament::models::{Fixture, ScheduledFixture, TeamId};
use std::collections::HashMap;

/// Order fixtures so every team rests as long as possible between matches
///
/// Greedy: at each slot the remaining fixture whose more-tired team has
/// rested longest is placed next. Ties go to the fixture listed first, so the
/// output is fully determined by the input order. Runs in O(F²).
///
/// # Arguments
///
/// * `fixtures` - Fixtures to play, possibly from several groups
///
/// # Returns
///
/// * `Vec<ScheduledFixture>` - The same fixtures with a 1-based play order
pub fn schedule_matches(fixtures: &[Fixture]) -> Vec<ScheduledFixture> {
    let mut remaining: Vec<Fixture> = fixtures.to_vec();
    let mut last_slot: HashMap<TeamId, i64> = HashMap::new();
    let mut scheduled = Vec::with_capacity(fixtures.len());

    let mut slot: i64 = 0;
    while !remaining.is_empty() {
        let rest_of = |team: TeamId| slot - last_slot.get(&team).copied().unwrap_or(-1);

        let mut best_idx = 0;
        let mut best_rest = i64::MIN;
        for (idx, fixture) in remaining.iter().enumerate() {
            let rest = rest_of(fixture.home).min(rest_of(fixture.away));
            if rest > best_rest {
                best_rest = rest;
                best_idx = idx;
            }
        }

        let fixture = remaining.remove(best_idx);
        last_slot.insert(fixture.home, slot);
        last_slot.insert(fixture.away, slot);
        slot += 1;

        scheduled.push(ScheduledFixture {
            fixture,
            order: slot as u32,
        });
    }

    scheduled
}

/// Smallest number of other matches between two appearances of any team
///
/// Entries are measured by play order, whatever order they are passed in.
/// Returns `None` when no team appears more than once.
pub fn min_rest(scheduled: &[ScheduledFixture]) -> Option<u32> {
    let mut by_order: Vec<&ScheduledFixture> = scheduled.iter().collect();
    by_order.sort_by_key(|entry| entry.order);

    let mut last_order: HashMap<TeamId, u32> = HashMap::new();
    let mut min: Option<u32> = None;

    for entry in by_order {
        for team in [entry.fixture.home, entry.fixture.away] {
            if let Some(prev) = last_order.insert(team, entry.order) {
                let rest = entry.order.saturating_sub(prev).saturating_sub(1);
                min = Some(min.map_or(rest, |m| m.min(rest)));
            }
        }
    }

    min
}
