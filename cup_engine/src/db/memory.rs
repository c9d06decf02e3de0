//! In-memory tournament store.
//!
//! Each unit of work edits a private copy of the whole store and publishes it
//! on commit if nobody else committed in the meantime (optimistic
//! concurrency). Commits can be made to fail, or to apply without being
//! acknowledged, on demand to exercise rollback and retry paths.

use super::repository::{TournamentRepository, UnitOfWork};
use super::timeouts::DEFAULT_TRANSACTION_TIMEOUT;
use crate::standings::ScopeFilter;
use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::{
        Category, EliminationPhase, Group, GroupId, Match, MatchId, MatchResult, NewMatch, Team,
        TeamId, Tournament, TournamentId,
    },
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicU32, Ordering},
};

#[derive(Debug, Clone, Default)]
struct StoreState {
    version: u64,
    next_match_id: MatchId,
    tournaments: BTreeMap<TournamentId, Tournament>,
    groups: BTreeMap<GroupId, Group>,
    /// Registration order
    teams: Vec<Team>,
    group_teams: HashMap<GroupId, Vec<TeamId>>,
    matches: BTreeMap<MatchId, Match>,
    results: BTreeMap<(MatchId, TeamId), MatchResult>,
}

impl StoreState {
    fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    fn teams_in_scope(&self, scope: &ScopeFilter) -> Vec<TeamId> {
        let candidates: Vec<&Team> = match scope.group_id {
            Some(group_id) => self
                .group_teams
                .get(&group_id)
                .map(|ids| ids.iter().filter_map(|id| self.team(*id)).collect())
                .unwrap_or_default(),
            None => self.teams.iter().collect(),
        };

        candidates
            .into_iter()
            .filter(|t| scope.covers_team(t))
            .map(|t| t.id)
            .collect()
    }

    fn matches_in_scope(&self, scope: &ScopeFilter) -> Vec<Match> {
        let mut matches: Vec<Match> = self
            .matches
            .values()
            .filter(|m| scope.covers_match(m))
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.order, m.id));
        matches
    }
}

/// In-memory implementation of `TournamentRepository`
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<StoreState>>,
    failing_commits: Arc<AtomicU32>,
    lost_acks: Arc<AtomicU32>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_tournament(&self, tournament: Tournament) {
        self.lock().tournaments.insert(tournament.id, tournament);
    }

    pub fn add_group(&self, group: Group) {
        self.lock().groups.insert(group.id, group);
    }

    /// Register a team, optionally placing it at the end of a group
    pub fn add_team(&self, team: Team, group_id: Option<GroupId>) {
        let mut state = self.lock();
        if let Some(group_id) = group_id {
            state.group_teams.entry(group_id).or_default().push(team.id);
        }
        state.teams.push(team);
    }

    /// Insert a match directly, bypassing the engine
    pub fn add_match(&self, new_match: NewMatch) -> Match {
        let mut state = self.lock();
        state.next_match_id += 1;
        let m = new_match.into_match(state.next_match_id);
        state.matches.insert(m.id, m.clone());
        state.version += 1;
        m
    }

    /// Make the next `count` commits fail with a write conflict
    pub fn fail_next_commits(&self, count: u32) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` commits apply their changes but report a timeout
    pub fn lose_next_commit_acks(&self, count: u32) {
        self.lost_acks.store(count, Ordering::SeqCst);
    }

    /// Snapshot of every match, in ID order
    pub fn matches(&self) -> Vec<Match> {
        self.lock().matches.values().cloned().collect()
    }

    /// Snapshot of every stored result
    pub fn results(&self) -> Vec<MatchResult> {
        self.lock().results.values().copied().collect()
    }

    /// Number of successful commits (and direct inserts) so far
    pub fn version(&self) -> u64 {
        self.lock().version
    }
}

#[async_trait]
impl TournamentRepository for InMemoryRepository {
    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        Ok(self.lock().tournaments.get(&id).cloned())
    }

    async fn find_group(&self, id: GroupId) -> TournamentResult<Option<Group>> {
        Ok(self.lock().groups.get(&id).cloned())
    }

    async fn find_match(&self, id: MatchId) -> TournamentResult<Option<Match>> {
        Ok(self.lock().matches.get(&id).cloned())
    }

    async fn list_groups(
        &self,
        tournament_id: TournamentId,
        category: Category,
    ) -> TournamentResult<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .lock()
            .groups
            .values()
            .filter(|g| g.tournament_id == tournament_id && g.category == category)
            .cloned()
            .collect();
        groups.sort_by_key(|g| (g.position, g.id));
        Ok(groups)
    }

    async fn list_group_teams(&self, group_id: GroupId) -> TournamentResult<Vec<TeamId>> {
        Ok(self
            .lock()
            .group_teams
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_teams(&self, scope: &ScopeFilter) -> TournamentResult<Vec<TeamId>> {
        Ok(self.lock().teams_in_scope(scope))
    }

    async fn list_matches(&self, scope: &ScopeFilter) -> TournamentResult<Vec<Match>> {
        Ok(self.lock().matches_in_scope(scope))
    }

    async fn list_results(&self, match_ids: &[MatchId]) -> TournamentResult<Vec<MatchResult>> {
        let state = self.lock();
        Ok(state
            .results
            .values()
            .filter(|r| match_ids.contains(&r.match_id))
            .copied()
            .collect())
    }

    async fn begin(&self) -> TournamentResult<Box<dyn UnitOfWork>> {
        let working = self.lock().clone();
        Ok(Box::new(InMemoryUnitOfWork {
            shared: Arc::clone(&self.state),
            failing_commits: Arc::clone(&self.failing_commits),
            lost_acks: Arc::clone(&self.lost_acks),
            base_version: working.version,
            working: Some(working),
        }))
    }
}

/// Unit of work over a private copy of the store
pub struct InMemoryUnitOfWork {
    shared: Arc<Mutex<StoreState>>,
    failing_commits: Arc<AtomicU32>,
    lost_acks: Arc<AtomicU32>,
    base_version: u64,
    working: Option<StoreState>,
}

impl InMemoryUnitOfWork {
    fn working(&mut self) -> TournamentResult<&mut StoreState> {
        self.working
            .as_mut()
            .ok_or(TournamentError::TransactionClosed)
    }

    fn take_injected_fault(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn find_match(&mut self, id: MatchId) -> TournamentResult<Option<Match>> {
        Ok(self.working()?.matches.get(&id).cloned())
    }

    async fn list_pending_matches(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> TournamentResult<Vec<Match>> {
        let mut pending: Vec<Match> = self
            .working()?
            .matches
            .values()
            .filter(|m| {
                m.tournament_id == tournament_id && m.involves(team_id) && m.status.is_pending()
            })
            .cloned()
            .collect();
        pending.sort_by_key(|m| (m.order, m.id));
        Ok(pending)
    }

    async fn count_group_matches(&mut self, group_id: GroupId) -> TournamentResult<u64> {
        Ok(self
            .working()?
            .matches
            .values()
            .filter(|m| m.group_id == Some(group_id))
            .count() as u64)
    }

    async fn create_match(&mut self, new_match: &NewMatch) -> TournamentResult<Match> {
        let state = self.working()?;
        state.next_match_id += 1;
        let m = new_match.clone().into_match(state.next_match_id);
        state.matches.insert(m.id, m.clone());
        Ok(m)
    }

    async fn update_match(&mut self, m: &Match) -> TournamentResult<()> {
        let state = self.working()?;
        match state.matches.get_mut(&m.id) {
            Some(stored) => {
                stored.status = m.status;
                stored.score = m.score;
                stored.penalties = m.penalties;
                Ok(())
            }
            None => Err(TournamentError::MatchNotFound(m.id)),
        }
    }

    async fn upsert_result(&mut self, result: &MatchResult) -> TournamentResult<()> {
        self.working()?
            .results
            .insert((result.match_id, result.team_id), *result);
        Ok(())
    }

    async fn delete_elimination_matches(
        &mut self,
        tournament_id: TournamentId,
        category: Category,
        phase: EliminationPhase,
    ) -> TournamentResult<u64> {
        let state = self.working()?;
        let doomed: Vec<MatchId> = state
            .matches
            .values()
            .filter(|m| {
                m.tournament_id == tournament_id
                    && m.category == category
                    && m.phase == Some(phase)
            })
            .map(|m| m.id)
            .collect();

        for id in &doomed {
            state.matches.remove(id);
        }
        state.results.retain(|(match_id, _), _| !doomed.contains(match_id));
        Ok(doomed.len() as u64)
    }

    async fn commit(&mut self) -> TournamentResult<()> {
        let mut working = self
            .working
            .take()
            .ok_or(TournamentError::TransactionClosed)?;

        if Self::take_injected_fault(&self.failing_commits) {
            return Err(TournamentError::WriteConflict(
                "injected commit failure".to_string(),
            ));
        }

        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        if shared.version != self.base_version {
            return Err(TournamentError::WriteConflict(format!(
                "store moved from version {} to {}",
                self.base_version, shared.version
            )));
        }

        working.version = self.base_version + 1;
        *shared = working;

        if Self::take_injected_fault(&self.lost_acks) {
            return Err(TournamentError::Timeout(DEFAULT_TRANSACTION_TIMEOUT));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> TournamentResult<()> {
        self.working = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{Finish, Gender, MatchStatus};
    use chrono::Utc;

    fn category() -> Category {
        Category::new(1, Gender::Female)
    }

    fn seeded() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        repo.add_tournament(Tournament {
            id: 1,
            name: "Spring Cup".to_string(),
            starts_at: Utc::now(),
        });
        repo.add_group(Group {
            id: 10,
            tournament_id: 1,
            name: "A".to_string(),
            category: category(),
            position: 0,
        });
        for id in [100, 101, 102] {
            repo.add_team(
                Team {
                    id,
                    tournament_id: 1,
                    name: format!("Team {id}"),
                    category: category(),
                },
                Some(10),
            );
        }
        repo.add_team(
            Team {
                id: 200,
                tournament_id: 1,
                name: "Boys".to_string(),
                category: Category::new(1, Gender::Male),
            },
            None,
        );
        repo
    }

    fn group_match(home: TeamId, away: TeamId, order: u32) -> NewMatch {
        NewMatch {
            tournament_id: 1,
            category: category(),
            group_id: Some(10),
            phase: None,
            home_team: home,
            away_team: away,
            order,
            scheduled_at: None,
        }
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let repo = seeded();
        let mut uow = repo.begin().await.unwrap();
        let created = uow.create_match(&group_match(100, 101, 1)).await.unwrap();

        assert!(repo.find_match(created.id).await.unwrap().is_none());
        uow.commit().await.unwrap();
        assert!(repo.find_match(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let repo = seeded();
        let mut uow = repo.begin().await.unwrap();
        uow.create_match(&group_match(100, 101, 1)).await.unwrap();
        uow.rollback().await.unwrap();

        assert!(repo.matches().is_empty());
        assert!(matches!(
            uow.commit().await,
            Err(TournamentError::TransactionClosed)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_commit_conflicts() {
        let repo = seeded();
        let mut first = repo.begin().await.unwrap();
        let mut second = repo.begin().await.unwrap();

        first.create_match(&group_match(100, 101, 1)).await.unwrap();
        second.create_match(&group_match(101, 102, 1)).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(repo.matches().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let repo = seeded();
        repo.fail_next_commits(1);

        let mut uow = repo.begin().await.unwrap();
        assert!(matches!(
            uow.commit().await,
            Err(TournamentError::WriteConflict(_))
        ));

        let mut uow = repo.begin().await.unwrap();
        uow.create_match(&group_match(100, 101, 1)).await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(repo.matches().len(), 1);
    }

    #[tokio::test]
    async fn test_lost_ack_still_publishes() {
        let repo = seeded();
        repo.lose_next_commit_acks(1);

        let mut uow = repo.begin().await.unwrap();
        uow.create_match(&group_match(100, 101, 1)).await.unwrap();
        let err = uow.commit().await.unwrap_err();
        assert!(matches!(err, TournamentError::Timeout(_)));
        assert_eq!(repo.matches().len(), 1);
    }

    #[tokio::test]
    async fn test_scope_listing() {
        let repo = seeded();
        repo.add_match(group_match(100, 101, 2));
        repo.add_match(group_match(102, 100, 1));

        let teams = repo.list_teams(&ScopeFilter::tournament(1)).await.unwrap();
        assert_eq!(teams, vec![100, 101, 102, 200]);

        let teams = repo
            .list_teams(&ScopeFilter::category(1, category()))
            .await
            .unwrap();
        assert_eq!(teams, vec![100, 101, 102]);

        let teams = repo
            .list_teams(&ScopeFilter::group(1, 10).with_teams(vec![102, 100]))
            .await
            .unwrap();
        assert_eq!(teams, vec![100, 102]);

        let matches = repo.list_matches(&ScopeFilter::group(1, 10)).await.unwrap();
        assert_eq!(
            matches.iter().map(|m| m.order).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_pending_matches_and_elimination_cleanup() {
        let repo = seeded();
        let first = repo.add_match(group_match(100, 101, 1));
        repo.add_match(group_match(100, 102, 2));
        let knockout = repo.add_match(NewMatch {
            group_id: None,
            phase: Some(EliminationPhase::Final),
            ..group_match(100, 102, 1)
        });

        let mut uow = repo.begin().await.unwrap();
        let mut finished = uow.find_match(first.id).await.unwrap().unwrap();
        finished.status = MatchStatus::Finalized;
        uow.update_match(&finished).await.unwrap();
        uow.upsert_result(&MatchResult {
            match_id: knockout.id,
            team_id: 100,
            finish: Finish::Winner,
            points: 3,
        })
        .await
        .unwrap();

        let pending = uow.list_pending_matches(1, 100).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(uow.count_group_matches(10).await.unwrap(), 2);

        let removed = uow
            .delete_elimination_matches(1, category(), EliminationPhase::Final)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        uow.commit().await.unwrap();

        assert_eq!(repo.matches().len(), 2);
        assert!(repo.results().is_empty());
    }
}
