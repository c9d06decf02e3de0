//! Round-robin fixture generation using the circle method.

use crate::tournament::models::{Fixture, GroupId, TeamId};

/// Generate the full round-robin schedule for one group
///
/// Odd team counts are padded with a bye, so every round has one team
/// resting and no fixture is emitted for the bye pairing. The first team
/// stays fixed while the rest rotate one place per round.
///
/// # Arguments
///
/// * `group_id` - Group stamped onto every fixture
/// * `teams` - Teams in declaration order
///
/// # Returns
///
/// * `Vec<Fixture>` - N·(N−1)/2 fixtures, or none when fewer than 2 teams
pub fn generate_fixtures(group_id: GroupId, teams: &[TeamId]) -> Vec<Fixture> {
    if teams.len() < 2 {
        return Vec::new();
    }

    // `None` is the bye
    let mut slots: Vec<Option<TeamId>> = teams.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }

    let n = slots.len();
    let mut fixtures = Vec::with_capacity(teams.len() * (teams.len() - 1) / 2);

    for round in 1..n as u32 {
        for i in 0..n / 2 {
            if let (Some(home), Some(away)) = (slots[i], slots[n - 1 - i]) {
                fixtures.push(Fixture {
                    group_id,
                    home,
                    away,
                    round,
                });
            }
        }
        slots[1..].rotate_right(1);
    }

    fixtures
}
