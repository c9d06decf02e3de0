//! Standings data models.

use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::{Category, Gender, GroupId, Match, ModalityId, Team, TeamId, TournamentId},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Derived per-team table entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub team_id: TeamId,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    /// Set once the team forfeits any match in scope
    pub forfeited: bool,
}

impl StandingRow {
    pub fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            ..Self::default()
        }
    }
}

/// Which teams and matches a standings query covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    pub tournament_id: TournamentId,
    pub modality_id: Option<ModalityId>,
    pub gender: Option<Gender>,
    pub group_id: Option<GroupId>,
    pub team_ids: Option<Vec<TeamId>>,
}

impl ScopeFilter {
    /// Whole tournament
    pub fn tournament(tournament_id: TournamentId) -> Self {
        Self {
            tournament_id,
            modality_id: None,
            gender: None,
            group_id: None,
            team_ids: None,
        }
    }

    /// One modality/gender partition
    pub fn category(tournament_id: TournamentId, category: Category) -> Self {
        Self {
            modality_id: Some(category.modality_id),
            gender: Some(category.gender),
            ..Self::tournament(tournament_id)
        }
    }

    /// One group
    pub fn group(tournament_id: TournamentId, group_id: GroupId) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::tournament(tournament_id)
        }
    }

    pub fn with_teams(mut self, team_ids: Vec<TeamId>) -> Self {
        self.team_ids = Some(team_ids);
        self
    }

    /// Reject filters that cannot name a meaningful scope
    pub fn validate(&self) -> TournamentResult<()> {
        if self.gender.is_some() && self.modality_id.is_none() {
            return Err(TournamentError::InvalidScope(
                "gender requires a modality".to_string(),
            ));
        }
        if matches!(&self.team_ids, Some(ids) if ids.is_empty()) {
            return Err(TournamentError::InvalidScope(
                "explicit team set is empty".to_string(),
            ));
        }
        Ok(())
    }

    fn matches_category(&self, category: &Category) -> bool {
        self.modality_id.is_none_or(|m| m == category.modality_id)
            && self.gender.is_none_or(|g| g == category.gender)
    }

    fn matches_team_id(&self, team_id: TeamId) -> bool {
        self.team_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&team_id))
    }

    /// Whether a team falls in scope, ignoring group membership
    pub fn covers_team(&self, team: &Team) -> bool {
        team.tournament_id == self.tournament_id
            && self.matches_category(&team.category)
            && self.matches_team_id(team.id)
    }

    /// Whether a match falls in scope
    pub fn covers_match(&self, m: &Match) -> bool {
        m.tournament_id == self.tournament_id
            && self.matches_category(&m.category)
            && self.group_id.is_none_or(|g| m.group_id == Some(g))
            && (self.matches_team_id(m.home_team) || self.matches_team_id(m.away_team))
    }
}

impl FromStr for ScopeFilter {
    type Err = TournamentError;

    /// Parse `tournament=1,modality=2,gender=female,group=4,teams=7;8`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tournament_id: Option<TournamentId> = None;
        let mut filter = ScopeFilter::tournament(0);

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| TournamentError::InvalidScope(format!("expected key=value, got '{part}'")))?;
            let value = value.trim();
            let bad_value =
                || TournamentError::InvalidScope(format!("invalid value '{value}' for {key}"));

            match key.trim() {
                "tournament" => tournament_id = Some(value.parse().map_err(|_| bad_value())?),
                "modality" => filter.modality_id = Some(value.parse().map_err(|_| bad_value())?),
                "gender" => filter.gender = Some(value.parse().map_err(|_| bad_value())?),
                "group" => filter.group_id = Some(value.parse().map_err(|_| bad_value())?),
                "teams" => {
                    let ids = value
                        .split(';')
                        .map(|id| id.trim().parse::<TeamId>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| bad_value())?;
                    filter.team_ids = Some(ids);
                }
                other => {
                    return Err(TournamentError::InvalidScope(format!(
                        "unrecognized scope key '{other}'"
                    )));
                }
            }
        }

        filter.tournament_id = tournament_id
            .ok_or_else(|| TournamentError::InvalidScope("tournament is required".to_string()))?;
        filter.validate()?;
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_scope() {
        let filter: ScopeFilter = "tournament=1, modality=2, gender=female, group=4, teams=7;8"
            .parse()
            .unwrap();
        assert_eq!(filter.tournament_id, 1);
        assert_eq!(filter.modality_id, Some(2));
        assert_eq!(filter.gender, Some(Gender::Female));
        assert_eq!(filter.group_id, Some(4));
        assert_eq!(filter.team_ids, Some(vec![7, 8]));
    }

    #[test]
    fn test_parse_rejects_unknown_keys_and_values() {
        let err = "tournament=1,venue=3".parse::<ScopeFilter>().unwrap_err();
        assert!(matches!(err, TournamentError::InvalidScope(_)));

        let err = "tournament=abc".parse::<ScopeFilter>().unwrap_err();
        assert!(matches!(err, TournamentError::InvalidScope(_)));

        let err = "modality=2".parse::<ScopeFilter>().unwrap_err();
        assert!(err.to_string().contains("tournament is required"));
    }

    #[test]
    fn test_validate() {
        let mut filter = ScopeFilter::tournament(1);
        assert!(filter.validate().is_ok());

        filter.gender = Some(Gender::Male);
        assert!(filter.validate().is_err());

        let filter = ScopeFilter::tournament(1).with_teams(vec![]);
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_covers_team() {
        let team = Team {
            id: 3,
            tournament_id: 1,
            name: "Blue".to_string(),
            category: Category::new(2, Gender::Female),
        };
        assert!(ScopeFilter::tournament(1).covers_team(&team));
        assert!(ScopeFilter::category(1, Category::new(2, Gender::Female)).covers_team(&team));
        assert!(!ScopeFilter::category(1, Category::new(2, Gender::Male)).covers_team(&team));
        assert!(!ScopeFilter::tournament(2).covers_team(&team));
        assert!(!ScopeFilter::tournament(1).with_teams(vec![4]).covers_team(&team));
    }
}
