//! Deciding per-team finishes from a final score.

use crate::tournament::models::{Finish, Score};
use std::cmp::Ordering;

/// Decide (home, away) finishes from the regular score and an optional shootout
///
/// A level score with a shootout that has a winner is decided by the
/// shootout; a level score without one, or with a level shootout, is a draw.
pub fn decide(score: Score, penalties: Option<Score>) -> (Finish, Finish) {
    match score.home.cmp(&score.away) {
        Ordering::Greater => (Finish::Winner, Finish::Loser),
        Ordering::Less => (Finish::Loser, Finish::Winner),
        Ordering::Equal => match penalties.map(|p| p.home.cmp(&p.away)) {
            Some(Ordering::Greater) => (Finish::Winner, Finish::Loser),
            Some(Ordering::Less) => (Finish::Loser, Finish::Winner),
            Some(Ordering::Equal) | None => (Finish::Draw, Finish::Draw),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_score_decides() {
        assert_eq!(decide(Score::new(2, 0), None), (Finish::Winner, Finish::Loser));
        assert_eq!(decide(Score::new(0, 1), None), (Finish::Loser, Finish::Winner));
    }

    #[test]
    fn test_level_score_is_a_draw() {
        assert_eq!(decide(Score::new(1, 1), None), (Finish::Draw, Finish::Draw));
        assert_eq!(
            decide(Score::new(1, 1), Some(Score::new(3, 3))),
            (Finish::Draw, Finish::Draw)
        );
    }

    #[test]
    fn test_shootout_breaks_level_score() {
        assert_eq!(
            decide(Score::new(2, 2), Some(Score::new(4, 3))),
            (Finish::Winner, Finish::Loser)
        );
        assert_eq!(
            decide(Score::new(0, 0), Some(Score::new(2, 5))),
            (Finish::Loser, Finish::Winner)
        );
    }

    #[test]
    fn test_shootout_ignored_when_regular_score_differs() {
        assert_eq!(
            decide(Score::new(1, 0), Some(Score::new(0, 5))),
            (Finish::Winner, Finish::Loser)
        );
    }
}
