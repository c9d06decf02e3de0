//! Tournament data models shared by every engine component.

use super::errors::TournamentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tournament ID type
pub type TournamentId = i64;
/// Group ID type
pub type GroupId = i64;
/// Team ID type
pub type TeamId = i64;
/// Match ID type
pub type MatchId = i64;
/// Modality (sport) ID type
pub type ModalityId = i64;

/// Gender partition of a modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Mixed,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "mixed" | "x" => Ok(Gender::Mixed),
            other => Err(format!("unknown gender '{other}'")),
        }
    }
}

/// Modality + gender partition inside which groups, standings and brackets live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub modality_id: ModalityId,
    pub gender: Gender,
}

impl Category {
    pub fn new(modality_id: ModalityId, gender: Gender) -> Self {
        Self {
            modality_id,
            gender,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "modality {} ({})", self.modality_id, self.gender)
    }
}

/// Tournament record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Anchor for all scheduled time slots
    pub starts_at: DateTime<Utc>,
}

/// Registered team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub category: Category,
}

/// Named bucket of teams of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub category: Category,
    /// Declaration order inside the category (0-indexed)
    pub position: u32,
}

/// Unscheduled pairing produced by round-robin generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub group_id: GroupId,
    pub home: TeamId,
    pub away: TeamId,
    /// Round number (1-indexed)
    pub round: u32,
}

impl Fixture {
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home == team_id || self.away == team_id
    }
}

/// Fixture placed in the linear play order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledFixture {
    pub fixture: Fixture,
    /// Play order (1-indexed)
    pub order: u32,
}

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Finalized,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Finalized => "finalized",
        }
    }

    /// Whether the match can still be played or forfeited
    pub fn is_pending(&self) -> bool {
        !matches!(self, MatchStatus::Finalized)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "in_progress" => Ok(MatchStatus::InProgress),
            "finalized" => Ok(MatchStatus::Finalized),
            other => Err(format!("unknown match status '{other}'")),
        }
    }
}

/// Elimination round of a bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EliminationPhase {
    #[serde(rename = "round-of-16")]
    RoundOf16,
    Quarterfinals,
    Semifinals,
    Final,
}

impl EliminationPhase {
    /// Infer the phase from the number of ranked teams available
    pub fn for_team_count(count: usize) -> Self {
        match count {
            16.. => EliminationPhase::RoundOf16,
            8.. => EliminationPhase::Quarterfinals,
            4.. => EliminationPhase::Semifinals,
            _ => EliminationPhase::Final,
        }
    }

    /// Number of teams that enter this phase
    pub fn size(&self) -> usize {
        match self {
            EliminationPhase::RoundOf16 => 16,
            EliminationPhase::Quarterfinals => 8,
            EliminationPhase::Semifinals => 4,
            EliminationPhase::Final => 2,
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            EliminationPhase::RoundOf16 => "Round of 16",
            EliminationPhase::Quarterfinals => "Quarterfinals",
            EliminationPhase::Semifinals => "Semifinals",
            EliminationPhase::Final => "Final",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EliminationPhase::RoundOf16 => "round-of-16",
            EliminationPhase::Quarterfinals => "quarterfinals",
            EliminationPhase::Semifinals => "semifinals",
            EliminationPhase::Final => "final",
        }
    }
}

impl fmt::Display for EliminationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EliminationPhase {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '_'], "-").as_str() {
            "round-of-16" | "r16" => Ok(EliminationPhase::RoundOf16),
            "quarterfinals" | "quarterfinal" | "qf" => Ok(EliminationPhase::Quarterfinals),
            "semifinals" | "semifinal" | "sf" => Ok(EliminationPhase::Semifinals),
            "final" => Ok(EliminationPhase::Final),
            _ => Err(TournamentError::InvalidPhase(s.to_string())),
        }
    }
}

/// Goals (or penalty kicks) scored by each side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    /// Nominal score written on walkovers
    pub fn walkover() -> Self {
        Self::default()
    }
}

/// Scheduled contest between two teams
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub category: Category,
    /// Set for group-stage matches
    pub group_id: Option<GroupId>,
    /// Set for elimination matches
    pub phase: Option<EliminationPhase>,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub status: MatchStatus,
    /// Play order (1-indexed)
    pub order: u32,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub score: Option<Score>,
    pub penalties: Option<Score>,
}

impl Match {
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home_team == team_id || self.away_team == team_id
    }

    /// Opponent of `team_id`, if the team plays in this match
    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        if self.home_team == team_id {
            Some(self.away_team)
        } else if self.away_team == team_id {
            Some(self.home_team)
        } else {
            None
        }
    }

    /// Goals (for, against) from the point of view of `team_id`
    pub fn goals_for(&self, team_id: TeamId) -> (u32, u32) {
        match self.score {
            Some(score) if self.home_team == team_id => (score.home, score.away),
            Some(score) if self.away_team == team_id => (score.away, score.home),
            _ => (0, 0),
        }
    }
}

/// Match data before the store assigns an ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub tournament_id: TournamentId,
    pub category: Category,
    pub group_id: Option<GroupId>,
    pub phase: Option<EliminationPhase>,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub order: u32,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl NewMatch {
    pub(crate) fn into_match(self, id: MatchId) -> Match {
        Match {
            id,
            tournament_id: self.tournament_id,
            category: self.category,
            group_id: self.group_id,
            phase: self.phase,
            home_team: self.home_team,
            away_team: self.away_team,
            status: MatchStatus::Scheduled,
            order: self.order,
            scheduled_at: self.scheduled_at,
            score: None,
            penalties: None,
        }
    }
}

/// Outcome of a match for one team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finish {
    Winner,
    Loser,
    Draw,
    Forfeit,
    Pending,
}

impl Finish {
    pub fn as_str(&self) -> &'static str {
        match self {
            Finish::Winner => "winner",
            Finish::Loser => "loser",
            Finish::Draw => "draw",
            Finish::Forfeit => "forfeit",
            Finish::Pending => "pending",
        }
    }
}

impl fmt::Display for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Finish {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "winner" => Ok(Finish::Winner),
            "loser" => Ok(Finish::Loser),
            "draw" => Ok(Finish::Draw),
            "forfeit" => Ok(Finish::Forfeit),
            "pending" => Ok(Finish::Pending),
            other => Err(format!("unknown finish '{other}'")),
        }
    }
}

/// Tournament points awarded per finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsTable {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl PointsTable {
    /// Points earned by `finish`. Forfeits never earn points.
    pub fn points_for(&self, finish: Finish) -> u32 {
        match finish {
            Finish::Winner => self.win,
            Finish::Draw => self.draw,
            Finish::Loser => self.loss,
            Finish::Forfeit | Finish::Pending => 0,
        }
    }
}

impl Default for PointsTable {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

/// Per-team result of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: MatchId,
    pub team_id: TeamId,
    pub finish: Finish,
    pub points: u32,
}

/// Both per-team results written by `record_result`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResult {
    pub home: MatchResult,
    pub away: MatchResult,
}
