//! Tournament domain: models, errors, configuration and the manager.
//!
//! [`TournamentManager`] is the entry point for every operation that reads or
//! writes the store. Writes to one (tournament, modality, gender) category are
//! serialized and run in a retried unit of work.
//!
//! ## Example
//!
//! ```no_run
//! use cup_engine::db::{Database, DatabaseConfig};
//! use cup_engine::standings::ScopeFilter;
//! use cup_engine::tournament::{EngineConfig, TournamentManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()?).await?;
//!     let manager = TournamentManager::new(Arc::new(db.repository()), EngineConfig::from_env()?);
//!
//!     let matches = manager.generate_group_schedule(1).await?;
//!     println!("Scheduled {} matches", matches.len());
//!
//!     let table = manager.compute_standings(&ScopeFilter::group(1, 1)).await?;
//!     println!("Leader: {:?}", table.first());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod locks;
pub mod manager;
pub mod models;

pub use config::{ConfigError, EngineConfig};
pub use errors::{ErrorKind, TournamentError, TournamentResult};
pub use locks::ScopeLocks;
pub use manager::TournamentManager;
pub use models::{
    Category, EliminationPhase, Finish, Fixture, Gender, Group, GroupId, Match, MatchId,
    MatchResult, MatchStatus, ModalityId, NewMatch, PointsTable, RecordedResult, Score,
    ScheduledFixture, Team, TeamId, Tournament, TournamentId,
};
