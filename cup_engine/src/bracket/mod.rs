//! Elimination bracket seeding from group standings.

pub mod models;
pub mod seeder;

pub use models::{BracketPairing, BracketPlan, BracketSlot, GroupStandings};
pub use seeder::{seed_bracket, select_advancing};
