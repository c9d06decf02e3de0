//! Tournament manager orchestrating scheduling, results, standings and brackets.

use super::{
    config::EngineConfig,
    errors::{TournamentError, TournamentResult},
    locks::ScopeLocks,
    models::{
        Category, EliminationPhase, Finish, Fixture, Group, GroupId, Match, MatchId, MatchResult,
        MatchStatus, NewMatch, RecordedResult, Score, ScheduledFixture, TeamId, Tournament,
        TournamentId,
    },
};
use crate::bracket::{self, GroupStandings};
use crate::db::{TournamentRepository, run_in_transaction};
use crate::fixtures;
use crate::standings::{self, ScopeFilter, StandingRow};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    repo: Arc<dyn TournamentRepository>,
    config: EngineConfig,
    locks: ScopeLocks,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(repo: Arc<dyn TournamentRepository>, config: EngineConfig) -> Self {
        Self {
            repo,
            config,
            locks: ScopeLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Round-robin fixtures for one group
    ///
    /// # Errors
    ///
    /// * `TournamentError::InsufficientTeams` - Fewer than 2 teams
    pub fn generate_fixtures(
        &self,
        group_id: GroupId,
        teams: &[TeamId],
    ) -> TournamentResult<Vec<Fixture>> {
        if teams.len() < 2 {
            return Err(TournamentError::InsufficientTeams {
                needed: 2,
                actual: teams.len(),
            });
        }

        Ok(fixtures::generate_fixtures(group_id, teams))
    }

    /// Play order for fixtures of one or more groups
    pub fn schedule_matches(&self, fixtures: &[Fixture]) -> Vec<ScheduledFixture> {
        fixtures::schedule_matches(fixtures)
    }

    /// Ranked table for a scope, rebuilt from finalized matches
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidScope` - Filter is malformed or the group belongs elsewhere
    /// * `TournamentError::TournamentNotFound` / `GroupNotFound` - Unknown tournament or group
    pub async fn compute_standings(&self, scope: &ScopeFilter) -> TournamentResult<Vec<StandingRow>> {
        scope.validate()?;
        self.require_tournament(scope.tournament_id).await?;

        if let Some(group_id) = scope.group_id {
            let group = self.require_group(group_id).await?;
            if group.tournament_id != scope.tournament_id {
                return Err(TournamentError::InvalidScope(format!(
                    "group {group_id} does not belong to tournament {}",
                    scope.tournament_id
                )));
            }
        }

        self.standings_in(scope).await
    }

    /// Move a scheduled match to in-progress
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidTransition` - Match is not scheduled
    pub async fn start_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        let target = self.require_match(match_id).await?;
        let _guard = self.locks.acquire(target.tournament_id, target.category).await;

        let started = run_in_transaction(
            self.repo.as_ref(),
            &self.config.retry,
            "start_match",
            move |uow| {
                Box::pin(async move {
                    let mut m = uow
                        .find_match(match_id)
                        .await?
                        .ok_or(TournamentError::MatchNotFound(match_id))?;

                    if m.status != MatchStatus::Scheduled {
                        return Err(TournamentError::InvalidTransition {
                            match_id,
                            from: m.status,
                            to: MatchStatus::InProgress,
                        });
                    }

                    m.status = MatchStatus::InProgress;
                    uow.update_match(&m).await?;
                    Ok(m)
                })
            },
        )
        .await?;

        log::info!("Match {match_id} started");
        Ok(started)
    }

    /// Finalize a match with its score and write both per-team results
    ///
    /// # Arguments
    ///
    /// * `match_id` - Match to finalize
    /// * `score` - Final score
    /// * `penalties` - Shootout score, consulted only when `score` is level
    ///
    /// # Errors
    ///
    /// * `TournamentError::MatchAlreadyFinalized` - Match already has a result
    /// * `TournamentError::InvalidResult` - Elimination match left level
    pub async fn record_result(
        &self,
        match_id: MatchId,
        score: Score,
        penalties: Option<Score>,
    ) -> TournamentResult<RecordedResult> {
        let target = self.require_match(match_id).await?;
        let _guard = self.locks.acquire(target.tournament_id, target.category).await;
        let points = self.config.points;

        let recorded = run_in_transaction(
            self.repo.as_ref(),
            &self.config.retry,
            "record_result",
            move |uow| {
                Box::pin(async move {
                    let mut m = uow
                        .find_match(match_id)
                        .await?
                        .ok_or(TournamentError::MatchNotFound(match_id))?;

                    if m.status == MatchStatus::Finalized {
                        return Err(TournamentError::MatchAlreadyFinalized(match_id));
                    }

                    let (home_finish, away_finish) = standings::decide(score, penalties);
                    if m.phase.is_some() && home_finish == Finish::Draw {
                        return Err(TournamentError::InvalidResult {
                            match_id,
                            reason: "elimination matches need a winner; add a decisive shootout"
                                .to_string(),
                        });
                    }
                    m.status = MatchStatus::Finalized;
                    m.score = Some(score);
                    m.penalties = penalties;
                    uow.update_match(&m).await?;

                    let home = MatchResult {
                        match_id,
                        team_id: m.home_team,
                        finish: home_finish,
                        points: points.points_for(home_finish),
                    };
                    let away = MatchResult {
                        match_id,
                        team_id: m.away_team,
                        finish: away_finish,
                        points: points.points_for(away_finish),
                    };
                    uow.upsert_result(&home).await?;
                    uow.upsert_result(&away).await?;

                    Ok(RecordedResult { home, away })
                })
            },
        )
        .await?;

        log::info!(
            "Match {match_id} finalized {}-{}: home {}, away {}",
            score.home,
            score.away,
            recorded.home.finish,
            recorded.away.finish
        );
        Ok(recorded)
    }

    /// Forfeit a match and every other pending match of the forfeiting team
    ///
    /// Each affected match is finalized 0-0 with `Forfeit` for `team_id` and
    /// `Winner` for its opponent. Either all of them change or none does.
    ///
    /// # Returns
    ///
    /// * `TournamentResult<Vec<MatchId>>` - Affected matches, the given one first
    ///
    /// # Errors
    ///
    /// * `TournamentError::TeamNotInMatch` - `team_id` does not play in the match
    /// * `TournamentError::MatchAlreadyFinalized` - Match already has a result
    /// * `TournamentError::Integrity` - Cascade could not commit; nothing changed
    pub async fn record_forfeit(
        &self,
        match_id: MatchId,
        team_id: TeamId,
    ) -> TournamentResult<Vec<MatchId>> {
        let target = self.require_match(match_id).await?;
        if !target.involves(team_id) {
            return Err(TournamentError::TeamNotInMatch { match_id, team_id });
        }

        let _guard = self.locks.acquire(target.tournament_id, target.category).await;
        let points = self.config.points;

        let affected = run_in_transaction(
            self.repo.as_ref(),
            &self.config.retry,
            "record_forfeit",
            move |uow| {
                Box::pin(async move {
                    let first = uow
                        .find_match(match_id)
                        .await?
                        .ok_or(TournamentError::MatchNotFound(match_id))?;

                    if first.status == MatchStatus::Finalized {
                        return Err(TournamentError::MatchAlreadyFinalized(match_id));
                    }

                    let rest = uow
                        .list_pending_matches(first.tournament_id, team_id)
                        .await?
                        .into_iter()
                        .filter(|m| m.id != match_id);

                    let mut affected = Vec::new();
                    for mut m in std::iter::once(first).chain(rest) {
                        let Some(opponent) = m.opponent_of(team_id) else {
                            return Err(TournamentError::TeamNotInMatch {
                                match_id: m.id,
                                team_id,
                            });
                        };

                        m.status = MatchStatus::Finalized;
                        m.score = Some(Score::walkover());
                        m.penalties = None;
                        uow.update_match(&m).await?;

                        uow.upsert_result(&MatchResult {
                            match_id: m.id,
                            team_id,
                            finish: Finish::Forfeit,
                            points: points.points_for(Finish::Forfeit),
                        })
                        .await?;
                        uow.upsert_result(&MatchResult {
                            match_id: m.id,
                            team_id: opponent,
                            finish: Finish::Winner,
                            points: points.points_for(Finish::Winner),
                        })
                        .await?;

                        affected.push(m.id);
                    }

                    Ok(affected)
                })
            },
        )
        .await?;

        log::info!(
            "Team {team_id} forfeited match {match_id}; {} match(es) finalized as walkovers",
            affected.len()
        );
        Ok(affected)
    }

    /// Seed an elimination phase of a category from its group standings
    ///
    /// Elimination matches previously created for the same phase are replaced
    /// in the same unit of work, so running this twice leaves one set.
    ///
    /// # Errors
    ///
    /// * `TournamentError::InsufficientTeams` - Fewer than 2 teams advance
    pub async fn seed_bracket(
        &self,
        tournament_id: TournamentId,
        category: Category,
        phase: Option<EliminationPhase>,
    ) -> TournamentResult<Vec<Match>> {
        let tournament = self.require_tournament(tournament_id).await?;
        let _guard = self.locks.acquire(tournament_id, category).await;

        let groups = self.repo.list_groups(tournament_id, category).await?;
        let mut tables = Vec::with_capacity(groups.len());
        for group in &groups {
            let scope = ScopeFilter::group(tournament_id, group.id);
            tables.push(GroupStandings {
                group_id: group.id,
                rows: self.standings_in(&scope).await?,
            });
        }

        let plan = bracket::seed_bracket(&tables, phase)?;
        let new_matches = plan.to_new_matches(
            tournament_id,
            category,
            tournament.starts_at,
            self.config.slot_interval(),
        );
        let phase = plan.phase;

        let created = run_in_transaction(
            self.repo.as_ref(),
            &self.config.retry,
            "seed_bracket",
            move |uow| {
                let new_matches = new_matches.clone();
                Box::pin(async move {
                    let removed = uow
                        .delete_elimination_matches(tournament_id, category, phase)
                        .await?;
                    if removed > 0 {
                        log::debug!("Replacing {removed} existing {phase} match(es)");
                    }

                    let mut created = Vec::with_capacity(new_matches.len());
                    for new_match in &new_matches {
                        created.push(uow.create_match(new_match).await?);
                    }
                    Ok(created)
                })
            },
        )
        .await?;

        log::info!(
            "Seeded {} for tournament {tournament_id}, {category}: {} match(es)",
            phase.label(),
            created.len()
        );
        Ok(created)
    }

    /// Generate, order and persist the round-robin of one group
    ///
    /// # Errors
    ///
    /// * `TournamentError::InsufficientTeams` - Group has fewer than 2 teams
    /// * `TournamentError::ScheduleExists` - Group already has matches
    pub async fn generate_group_schedule(&self, group_id: GroupId) -> TournamentResult<Vec<Match>> {
        let group = self.require_group(group_id).await?;
        self.persist_schedule(group.tournament_id, group.category, vec![group])
            .await
    }

    /// Generate, order and persist the round-robin of every group of a category
    ///
    /// Fixtures of all groups are ordered together, so groups playing in
    /// parallel interleave and their teams rest longer.
    ///
    /// # Errors
    ///
    /// * `TournamentError::InsufficientTeams` - Category has no groups, or a group has fewer than 2 teams
    /// * `TournamentError::ScheduleExists` - A group already has matches
    pub async fn generate_category_schedule(
        &self,
        tournament_id: TournamentId,
        category: Category,
    ) -> TournamentResult<Vec<Match>> {
        let groups = self.repo.list_groups(tournament_id, category).await?;
        if groups.is_empty() {
            return Err(TournamentError::InsufficientTeams {
                needed: 2,
                actual: 0,
            });
        }

        self.persist_schedule(tournament_id, category, groups).await
    }

    async fn persist_schedule(
        &self,
        tournament_id: TournamentId,
        category: Category,
        groups: Vec<Group>,
    ) -> TournamentResult<Vec<Match>> {
        let tournament = self.require_tournament(tournament_id).await?;
        let _guard = self.locks.acquire(tournament_id, category).await;

        let mut all_fixtures = Vec::new();
        for group in &groups {
            let teams = self.repo.list_group_teams(group.id).await?;
            all_fixtures.extend(self.generate_fixtures(group.id, &teams)?);
        }

        let scheduled = self.schedule_matches(&all_fixtures);
        let new_matches = group_stage_matches(
            &tournament,
            category,
            &scheduled,
            self.config.slot_interval(),
        );
        let group_ids: Vec<GroupId> = groups.iter().map(|g| g.id).collect();

        let created = run_in_transaction(
            self.repo.as_ref(),
            &self.config.retry,
            "generate_schedule",
            move |uow| {
                let new_matches = new_matches.clone();
                let group_ids = group_ids.clone();
                Box::pin(async move {
                    for group_id in group_ids {
                        if uow.count_group_matches(group_id).await? > 0 {
                            return Err(TournamentError::ScheduleExists(group_id));
                        }
                    }

                    let mut created = Vec::with_capacity(new_matches.len());
                    for new_match in &new_matches {
                        created.push(uow.create_match(new_match).await?);
                    }
                    Ok(created)
                })
            },
        )
        .await?;

        log::info!(
            "Scheduled {} group match(es) across {} group(s) of {category}, min rest {:?}",
            created.len(),
            groups.len(),
            fixtures::min_rest(&scheduled)
        );
        Ok(created)
    }

    async fn standings_in(&self, scope: &ScopeFilter) -> TournamentResult<Vec<StandingRow>> {
        let teams = self.repo.list_teams(scope).await?;
        let matches = self.repo.list_matches(scope).await?;
        let finalized: Vec<MatchId> = matches
            .iter()
            .filter(|m| m.status == MatchStatus::Finalized)
            .map(|m| m.id)
            .collect();

        if finalized.is_empty() {
            log::debug!(
                "No finalized matches in tournament {} scope; returning {} zero row(s)",
                scope.tournament_id,
                teams.len()
            );
        }

        let results = self.repo.list_results(&finalized).await?;
        Ok(standings::compute_standings(&teams, &matches, &results))
    }

    async fn require_tournament(&self, id: TournamentId) -> TournamentResult<Tournament> {
        self.repo
            .find_tournament(id)
            .await?
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    async fn require_group(&self, id: GroupId) -> TournamentResult<Group> {
        self.repo
            .find_group(id)
            .await?
            .ok_or(TournamentError::GroupNotFound(id))
    }

    async fn require_match(&self, id: MatchId) -> TournamentResult<Match> {
        self.repo
            .find_match(id)
            .await?
            .ok_or(TournamentError::MatchNotFound(id))
    }
}

/// Scheduled group fixtures as matches, one slot interval apart
fn group_stage_matches(
    tournament: &Tournament,
    category: Category,
    scheduled: &[ScheduledFixture],
    slot_interval: Duration,
) -> Vec<NewMatch> {
    scheduled
        .iter()
        .map(|s| NewMatch {
            tournament_id: tournament.id,
            category,
            group_id: Some(s.fixture.group_id),
            phase: None,
            home_team: s.fixture.home,
            away_team: s.fixture.away,
            order: s.order,
            scheduled_at: Some(slot_time(tournament.starts_at, slot_interval, s.order)),
        })
        .collect()
}

fn slot_time(starts_at: DateTime<Utc>, slot_interval: Duration, order: u32) -> DateTime<Utc> {
    starts_at + slot_interval * (order.saturating_sub(1) as i32)
}
