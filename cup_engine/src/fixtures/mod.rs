//! Fixture generation and play ordering.
//!
//! - [`generate_fixtures`] builds a group's round-robin with the circle method
//! - [`schedule_matches`] orders fixtures from one or more groups to keep
//!   every team rested between appearances

pub mod generator;
pub mod scheduler;

pub use generator::generate_fixtures;
pub use scheduler::{min_rest, schedule_matches};
