//! # Cup Engine
//!
//! Scheduling and standings engine for multi-sport school tournaments.
//!
//! Teams of one modality and gender (a *category*) are split into groups.
//! Each group plays a round-robin, the fixtures of all groups are ordered so
//! teams rest between appearances, standings are rebuilt from finalized
//! results, and the best-placed teams of every group are seeded into an
//! elimination bracket.
//!
//! ## Core Modules
//!
//! - [`fixtures`]: round-robin generation and rest-maximizing play order
//! - [`standings`]: result determination, aggregation and ranking
//! - [`bracket`]: cross-group seeding of elimination phases
//! - [`tournament`]: domain models, errors, configuration and [`TournamentManager`]
//! - [`db`]: repository traits, PostgreSQL and in-memory stores, retries
//!
//! ## Example
//!
//! ```
//! use cup_engine::{generate_fixtures, min_rest, schedule_matches};
//!
//! let fixtures = generate_fixtures(1, &[10, 11, 12, 13]);
//! assert_eq!(fixtures.len(), 6);
//!
//! let ordered = schedule_matches(&fixtures);
//! assert_eq!(ordered.len(), 6);
//! assert!(min_rest(&ordered).is_some());
//! ```

/// Elimination bracket seeding.
pub mod bracket;
/// Storage traits and adapters.
pub mod db;
/// Fixture generation and scheduling.
pub mod fixtures;
/// Standings computation.
pub mod standings;
/// Tournament domain and orchestration.
pub mod tournament;

pub use bracket::{BracketPlan, seed_bracket};
pub use fixtures::{generate_fixtures, min_rest, schedule_matches};
pub use standings::{ScopeFilter, StandingRow, compute_standings, decide};
pub use tournament::{
    EngineConfig, ErrorKind, TournamentError, TournamentManager, TournamentResult,
};
