//! Standings aggregation and ranking.

use super::models::StandingRow;
use crate::tournament::models::{Finish, Match, MatchId, MatchResult, MatchStatus, TeamId};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Ranking order for standing rows
///
/// Forfeiting teams always sort after teams that never forfeited. Within
/// each block: points, then goal difference, then goals scored, all
/// descending. There is no fourth key; callers rely on a stable sort so
/// rows that tie on every key keep their listing order.
pub fn compare_rows(a: &StandingRow, b: &StandingRow) -> Ordering {
    a.forfeited
        .cmp(&b.forfeited)
        .then_with(|| b.points.cmp(&a.points))
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
}

/// Build the ranked table for the given teams
///
/// # Arguments
///
/// * `team_ids` - Teams in scope, in store listing order; each gets a row
/// * `matches` - Matches in scope; only finalized ones count
/// * `results` - Per-team results of those matches
///
/// # Returns
///
/// * `Vec<StandingRow>` - One row per team, sorted by [`compare_rows`]
pub fn compute_standings(
    team_ids: &[TeamId],
    matches: &[Match],
    results: &[MatchResult],
) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = Vec::with_capacity(team_ids.len());
    let mut index: HashMap<TeamId, usize> = HashMap::with_capacity(team_ids.len());
    for &team_id in team_ids {
        if !index.contains_key(&team_id) {
            index.insert(team_id, rows.len());
            rows.push(StandingRow::new(team_id));
        }
    }

    let finalized: HashMap<MatchId, &Match> = matches
        .iter()
        .filter(|m| m.status == MatchStatus::Finalized)
        .map(|m| (m.id, m))
        .collect();

    for result in results {
        let (Some(m), Some(&row_idx)) = (finalized.get(&result.match_id), index.get(&result.team_id))
        else {
            continue;
        };
        apply_result(&mut rows[row_idx], m, result);
    }

    rows.sort_by(compare_rows);
    rows
}

fn apply_result(row: &mut StandingRow, m: &Match, result: &MatchResult) {
    match result.finish {
        Finish::Winner => row.wins += 1,
        Finish::Draw => row.draws += 1,
        Finish::Loser => row.losses += 1,
        Finish::Forfeit => {
            row.losses += 1;
            row.forfeited = true;
        }
        Finish::Pending => return,
    }

    row.played += 1;
    row.points += result.points;

    let (scored, conceded) = m.goals_for(result.team_id);
    row.goals_for += scored;
    row.goals_against += conceded;
    row.goal_difference = row.goals_for as i64 - row.goals_against as i64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{Category, Gender, PointsTable, Score};

    const A: TeamId = 1;
    const B: TeamId = 2;
    const C: TeamId = 3;

    fn finalized(id: MatchId, home: TeamId, away: TeamId, score: Score) -> Match {
        Match {
            id,
            tournament_id: 1,
            category: Category::new(1, Gender::Mixed),
            group_id: Some(1),
            phase: None,
            home_team: home,
            away_team: away,
            status: MatchStatus::Finalized,
            order: id as u32,
            scheduled_at: None,
            score: Some(score),
            penalties: None,
        }
    }

    fn results_for(m: &Match) -> [MatchResult; 2] {
        let points = PointsTable::default();
        let (home, away) = crate::standings::decide(m.score.unwrap_or_default(), m.penalties);
        [
            MatchResult {
                match_id: m.id,
                team_id: m.home_team,
                finish: home,
                points: points.points_for(home),
            },
            MatchResult {
                match_id: m.id,
                team_id: m.away_team,
                finish: away,
                points: points.points_for(away),
            },
        ]
    }

    fn row(rows: &[StandingRow], team_id: TeamId) -> &StandingRow {
        rows.iter().find(|r| r.team_id == team_id).unwrap()
    }

    #[test]
    fn test_three_team_group() {
        let matches = vec![
            finalized(1, A, B, Score::new(2, 0)),
            finalized(2, B, C, Score::new(1, 0)),
            finalized(3, A, C, Score::new(1, 1)),
        ];
        let results: Vec<MatchResult> = matches.iter().flat_map(results_for).collect();

        let rows = compute_standings(&[A, B, C], &matches, &results);
        let order: Vec<TeamId> = rows.iter().map(|r| r.team_id).collect();
        assert_eq!(order, vec![A, B, C]);

        let a = row(&rows, A);
        assert_eq!((a.points, a.wins, a.draws, a.losses), (4, 1, 1, 0));
        assert_eq!(a.goal_difference, 2);

        let b = row(&rows, B);
        assert_eq!((b.points, b.wins, b.losses), (3, 1, 1));
        assert_eq!(b.goal_difference, -1);

        let c = row(&rows, C);
        assert_eq!((c.points, c.draws, c.losses), (1, 1, 1));
        assert_eq!(c.goal_difference, -1);
        assert_eq!((c.goals_for, c.goals_against), (1, 2));
    }

    #[test]
    fn test_no_finalized_matches_gives_zero_rows() {
        let mut pending = finalized(1, A, B, Score::new(3, 0));
        pending.status = MatchStatus::InProgress;
        let results = results_for(&pending);

        let rows = compute_standings(&[A, B, C], &[pending], &results);
        assert_eq!(rows.len(), 3);
        for r in &rows {
            assert_eq!(*r, StandingRow::new(r.team_id));
        }
    }

    #[test]
    fn test_forfeiting_team_sorts_last_regardless_of_points() {
        let matches = vec![
            finalized(1, A, B, Score::new(5, 0)),
            finalized(2, A, C, Score::walkover()),
        ];
        let mut results: Vec<MatchResult> = results_for(&matches[0]).to_vec();
        results.push(MatchResult {
            match_id: 2,
            team_id: A,
            finish: Finish::Forfeit,
            points: 0,
        });
        results.push(MatchResult {
            match_id: 2,
            team_id: C,
            finish: Finish::Winner,
            points: 3,
        });

        let rows = compute_standings(&[A, B, C], &matches, &results);
        let order: Vec<TeamId> = rows.iter().map(|r| r.team_id).collect();
        assert_eq!(order, vec![C, B, A]);

        let a = row(&rows, A);
        assert!(a.forfeited);
        assert_eq!((a.points, a.wins, a.losses, a.played), (3, 1, 1, 2));
    }

    #[test]
    fn test_goal_difference_then_goals_for() {
        let matches = vec![
            finalized(1, A, C, Score::new(3, 1)),
            finalized(2, B, C, Score::new(2, 0)),
            finalized(3, A, B, Score::new(0, 0)),
        ];
        let results: Vec<MatchResult> = matches.iter().flat_map(results_for).collect();

        // A and B: 4 points, GD +2 each; A has more goals scored
        let rows = compute_standings(&[B, A, C], &matches, &results);
        let order: Vec<TeamId> = rows.iter().map(|r| r.team_id).collect();
        assert_eq!(order, vec![A, B, C]);
    }

    #[test]
    fn test_full_tie_keeps_listing_order() {
        // No fourth tie-break exists: identical records keep the order the
        // teams were listed in.
        let matches = vec![finalized(1, A, B, Score::new(1, 1))];
        let results: Vec<MatchResult> = matches.iter().flat_map(results_for).collect();

        let rows = compute_standings(&[B, A], &matches, &results);
        assert_eq!(rows[0].team_id, B);
        assert_eq!(rows[1].team_id, A);

        let rows = compute_standings(&[A, B], &matches, &results);
        assert_eq!(rows[0].team_id, A);
        assert_eq!(rows[1].team_id, B);
    }

    #[test]
    fn test_results_for_unlisted_teams_are_ignored() {
        let matches = vec![finalized(1, A, B, Score::new(1, 0))];
        let results: Vec<MatchResult> = matches.iter().flat_map(results_for).collect();

        let rows = compute_standings(&[B], &matches, &results);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].losses, 1);
        assert_eq!(rows[0].goal_difference, -1);
    }
}
