//! Standings: per-team records, ranking and result determination.
//!
//! Tables are always rebuilt from finalized matches. Forfeiting teams are
//! pushed below every team that never forfeited, then rows are ranked by
//! points, goal difference and goals scored.

pub mod calculator;
pub mod models;
pub mod outcome;

pub use calculator::{compare_rows, compute_standings};
pub use models::{ScopeFilter, StandingRow};
pub use outcome::decide;
