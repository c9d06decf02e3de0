//! Bracket seeding data models.

use crate::standings::StandingRow;
use crate::tournament::models::{EliminationPhase, GroupId, TeamId};
use serde::{Deserialize, Serialize};

/// Ranked table of one group, as fed to the seeder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStandings {
    pub group_id: GroupId,
    /// Rows in rank order
    pub rows: Vec<StandingRow>,
}

/// Advancing team with its group origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlot {
    pub team_id: TeamId,
    pub group_id: GroupId,
    /// Rank inside the group (0 = group winner)
    pub position: usize,
}

/// One elimination pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPairing {
    pub home: BracketSlot,
    pub away: BracketSlot,
}

/// Seeding outcome before any match is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPlan {
    pub phase: EliminationPhase,
    /// Advancing teams in seed order, truncated to the phase size
    pub seeds: Vec<BracketSlot>,
    pub pairings: Vec<BracketPairing>,
    /// Last seed when an explicit phase leaves an odd number of teams
    pub unpaired: Option<BracketSlot>,
}
