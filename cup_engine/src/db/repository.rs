//! Repository trait definitions for the tournament store.
//!
//! The engine only talks to storage through [`TournamentRepository`] for
//! reads and [`UnitOfWork`] for writes, so every multi-record write (forfeit
//! cascade, bracket regeneration, schedule creation) commits or rolls back as
//! a whole. [`PgTournamentRepository`] is the PostgreSQL implementation; an
//! in-memory one lives in [`super::memory`].

use super::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_default_timeout, with_timeout};
use crate::standings::ScopeFilter;
use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::{
        Category, EliminationPhase, Group, GroupId, Match, MatchId, MatchResult, NewMatch, Score,
        TeamId, Tournament, TournamentId,
    },
};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::str::FromStr;

/// Read side of the tournament store
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Find tournament by ID
    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

    /// Find group by ID
    async fn find_group(&self, id: GroupId) -> TournamentResult<Option<Group>>;

    /// Find match by ID
    async fn find_match(&self, id: MatchId) -> TournamentResult<Option<Match>>;

    /// Groups of one category, in declaration order
    async fn list_groups(
        &self,
        tournament_id: TournamentId,
        category: Category,
    ) -> TournamentResult<Vec<Group>>;

    /// Teams of a group, in the order they were placed in it
    async fn list_group_teams(&self, group_id: GroupId) -> TournamentResult<Vec<TeamId>>;

    /// Teams covered by a scope
    async fn list_teams(&self, scope: &ScopeFilter) -> TournamentResult<Vec<TeamId>>;

    /// Matches covered by a scope
    async fn list_matches(&self, scope: &ScopeFilter) -> TournamentResult<Vec<Match>>;

    /// Per-team results of the given matches
    async fn list_results(&self, match_ids: &[MatchId]) -> TournamentResult<Vec<MatchResult>>;

    /// Open a unit of work
    async fn begin(&self) -> TournamentResult<Box<dyn UnitOfWork>>;
}

/// Write side of the tournament store; nothing is visible until `commit`
#[async_trait]
pub trait UnitOfWork: Send {
    /// Find match by ID, as seen inside this unit
    async fn find_match(&mut self, id: MatchId) -> TournamentResult<Option<Match>>;

    /// Scheduled or in-progress matches of a team, in play order
    async fn list_pending_matches(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> TournamentResult<Vec<Match>>;

    /// Number of matches already created for a group
    async fn count_group_matches(&mut self, group_id: GroupId) -> TournamentResult<u64>;

    /// Create a scheduled match
    async fn create_match(&mut self, new_match: &NewMatch) -> TournamentResult<Match>;

    /// Persist status, score and penalties of a match
    async fn update_match(&mut self, m: &Match) -> TournamentResult<()>;

    /// Create or replace the result of one team in one match
    async fn upsert_result(&mut self, result: &MatchResult) -> TournamentResult<()>;

    /// Delete elimination matches (and their results) of one phase of a category
    async fn delete_elimination_matches(
        &mut self,
        tournament_id: TournamentId,
        category: Category,
        phase: EliminationPhase,
    ) -> TournamentResult<u64>;

    /// Make all writes visible
    async fn commit(&mut self) -> TournamentResult<()>;

    /// Discard all writes
    async fn rollback(&mut self) -> TournamentResult<()>;
}

const MATCH_COLUMNS: &str = "id, tournament_id, modality_id, gender, group_id, phase, \
    home_team_id, away_team_id, status, play_order, scheduled_at, \
    home_score, away_score, home_penalties, away_penalties";

fn parse_column<T: FromStr>(value: &str, column: &str) -> TournamentResult<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| {
        TournamentError::Database(sqlx::Error::Decode(
            format!("column {column}: {e}").into(),
        ))
    })
}

fn score_from(home: Option<i32>, away: Option<i32>) -> Option<Score> {
    match (home, away) {
        (Some(home), Some(away)) => Some(Score::new(home as u32, away as u32)),
        _ => None,
    }
}

fn match_from_row(row: &PgRow) -> TournamentResult<Match> {
    let gender: String = row.get("gender");
    let status: String = row.get("status");
    let phase = row
        .get::<Option<String>, _>("phase")
        .map(|p| parse_column::<EliminationPhase>(&p, "phase"))
        .transpose()?;

    Ok(Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        category: Category::new(row.get("modality_id"), parse_column(&gender, "gender")?),
        group_id: row.get("group_id"),
        phase,
        home_team: row.get("home_team_id"),
        away_team: row.get("away_team_id"),
        status: parse_column(&status, "status")?,
        order: row.get::<i32, _>("play_order") as u32,
        scheduled_at: row.get("scheduled_at"),
        score: score_from(row.get("home_score"), row.get("away_score")),
        penalties: score_from(row.get("home_penalties"), row.get("away_penalties")),
    })
}

fn group_from_row(row: &PgRow) -> TournamentResult<Group> {
    let gender: String = row.get("gender");
    Ok(Group {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        name: row.get("name"),
        category: Category::new(row.get("modality_id"), parse_column(&gender, "gender")?),
        position: row.get::<i32, _>("position") as u32,
    })
}

/// PostgreSQL implementation of `TournamentRepository`
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let row = with_default_timeout(
            sqlx::query("SELECT id, name, starts_at FROM tournaments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| Tournament {
            id: r.get("id"),
            name: r.get("name"),
            starts_at: r.get("starts_at"),
        }))
    }

    async fn find_group(&self, id: GroupId) -> TournamentResult<Option<Group>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, tournament_id, name, modality_id, gender, position
                 FROM groups WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(group_from_row).transpose()
    }

    async fn find_match(&self, id: MatchId) -> TournamentResult<Option<Match>> {
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_groups(
        &self,
        tournament_id: TournamentId,
        category: Category,
    ) -> TournamentResult<Vec<Group>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT id, tournament_id, name, modality_id, gender, position
                 FROM groups
                 WHERE tournament_id = $1 AND modality_id = $2 AND gender = $3
                 ORDER BY position, id",
            )
            .bind(tournament_id)
            .bind(category.modality_id)
            .bind(category.gender.as_str())
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(group_from_row).collect()
    }

    async fn list_group_teams(&self, group_id: GroupId) -> TournamentResult<Vec<TeamId>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT team_id FROM group_teams WHERE group_id = $1 ORDER BY position, team_id",
            )
            .bind(group_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(|r| r.get("team_id")).collect())
    }

    async fn list_teams(&self, scope: &ScopeFilter) -> TournamentResult<Vec<TeamId>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT t.id
                 FROM teams t
                 LEFT JOIN group_teams gt ON gt.team_id = t.id AND gt.group_id = $4
                 WHERE t.tournament_id = $1
                   AND ($2::BIGINT IS NULL OR t.modality_id = $2)
                   AND ($3::TEXT IS NULL OR t.gender = $3)
                   AND ($4::BIGINT IS NULL OR gt.group_id IS NOT NULL)
                   AND ($5::BIGINT[] IS NULL OR t.id = ANY($5))
                 ORDER BY gt.position NULLS LAST, t.id",
            )
            .bind(scope.tournament_id)
            .bind(scope.modality_id)
            .bind(scope.gender.map(|g| g.as_str()))
            .bind(scope.group_id)
            .bind(scope.team_ids.clone())
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    async fn list_matches(&self, scope: &ScopeFilter) -> TournamentResult<Vec<Match>> {
        let rows = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {MATCH_COLUMNS}
                 FROM matches
                 WHERE tournament_id = $1
                   AND ($2::BIGINT IS NULL OR modality_id = $2)
                   AND ($3::TEXT IS NULL OR gender = $3)
                   AND ($4::BIGINT IS NULL OR group_id = $4)
                   AND ($5::BIGINT[] IS NULL OR home_team_id = ANY($5) OR away_team_id = ANY($5))
                 ORDER BY play_order, id"
            ))
            .bind(scope.tournament_id)
            .bind(scope.modality_id)
            .bind(scope.gender.map(|g| g.as_str()))
            .bind(scope.group_id)
            .bind(scope.team_ids.clone())
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn list_results(&self, match_ids: &[MatchId]) -> TournamentResult<Vec<MatchResult>> {
        if match_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = with_default_timeout(
            sqlx::query(
                "SELECT match_id, team_id, finish, points
                 FROM match_results
                 WHERE match_id = ANY($1)
                 ORDER BY match_id, team_id",
            )
            .bind(match_ids.to_vec())
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter()
            .map(|r| {
                let finish: String = r.get("finish");
                Ok(MatchResult {
                    match_id: r.get("match_id"),
                    team_id: r.get("team_id"),
                    finish: parse_column(&finish, "finish")?,
                    points: r.get::<i32, _>("points") as u32,
                })
            })
            .collect()
    }

    async fn begin(&self) -> TournamentResult<Box<dyn UnitOfWork>> {
        let mut tx = with_default_timeout(self.pool.begin()).await?;
        with_default_timeout(
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE").execute(&mut *tx),
        )
        .await?;

        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }
}

/// Unit of work backed by a serializable PostgreSQL transaction
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> TournamentResult<&mut PgConnection> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(TournamentError::TransactionClosed),
        }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_match(&mut self, id: MatchId) -> TournamentResult<Option<Match>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1 FOR UPDATE"
            ))
            .bind(id)
            .fetch_optional(conn),
        )
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_pending_matches(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> TournamentResult<Vec<Match>> {
        let conn = self.conn()?;
        let rows = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {MATCH_COLUMNS}
                 FROM matches
                 WHERE tournament_id = $1
                   AND (home_team_id = $2 OR away_team_id = $2)
                   AND status IN ('scheduled', 'in_progress')
                 ORDER BY play_order, id
                 FOR UPDATE"
            ))
            .bind(tournament_id)
            .bind(team_id)
            .fetch_all(conn),
        )
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn count_group_matches(&mut self, group_id: GroupId) -> TournamentResult<u64> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query("SELECT COUNT(*) AS n FROM matches WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(conn),
        )
        .await?;

        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn create_match(&mut self, new_match: &NewMatch) -> TournamentResult<Match> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(
                "INSERT INTO matches (tournament_id, modality_id, gender, group_id, phase,
                                      home_team_id, away_team_id, status, play_order, scheduled_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, 'scheduled', $8, $9)
                 RETURNING id",
            )
            .bind(new_match.tournament_id)
            .bind(new_match.category.modality_id)
            .bind(new_match.category.gender.as_str())
            .bind(new_match.group_id)
            .bind(new_match.phase.map(|p| p.as_str()))
            .bind(new_match.home_team)
            .bind(new_match.away_team)
            .bind(new_match.order as i32)
            .bind(new_match.scheduled_at)
            .fetch_one(conn),
        )
        .await?;

        Ok(new_match.clone().into_match(row.get("id")))
    }

    async fn update_match(&mut self, m: &Match) -> TournamentResult<()> {
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE matches
                 SET status = $1, home_score = $2, away_score = $3,
                     home_penalties = $4, away_penalties = $5, updated_at = NOW()
                 WHERE id = $6",
            )
            .bind(m.status.as_str())
            .bind(m.score.map(|s| s.home as i32))
            .bind(m.score.map(|s| s.away as i32))
            .bind(m.penalties.map(|s| s.home as i32))
            .bind(m.penalties.map(|s| s.away as i32))
            .bind(m.id)
            .execute(conn),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(TournamentError::MatchNotFound(m.id));
        }
        Ok(())
    }

    async fn upsert_result(&mut self, result: &MatchResult) -> TournamentResult<()> {
        let conn = self.conn()?;
        with_default_timeout(
            sqlx::query(
                "INSERT INTO match_results (match_id, team_id, finish, points)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (match_id, team_id)
                 DO UPDATE SET finish = EXCLUDED.finish, points = EXCLUDED.points",
            )
            .bind(result.match_id)
            .bind(result.team_id)
            .bind(result.finish.as_str())
            .bind(result.points as i32)
            .execute(conn),
        )
        .await?;

        Ok(())
    }

    async fn delete_elimination_matches(
        &mut self,
        tournament_id: TournamentId,
        category: Category,
        phase: EliminationPhase,
    ) -> TournamentResult<u64> {
        // match_results rows go with ON DELETE CASCADE
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query(
                "DELETE FROM matches
                 WHERE tournament_id = $1 AND modality_id = $2 AND gender = $3 AND phase = $4",
            )
            .bind(tournament_id)
            .bind(category.modality_id)
            .bind(category.gender.as_str())
            .bind(phase.as_str())
            .execute(conn),
        )
        .await?;

        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> TournamentResult<()> {
        let tx = self.tx.take().ok_or(TournamentError::TransactionClosed)?;
        with_timeout(DEFAULT_TRANSACTION_TIMEOUT, tx.commit()).await
    }

    async fn rollback(&mut self) -> TournamentResult<()> {
        match self.tx.take() {
            Some(tx) => with_timeout(DEFAULT_TRANSACTION_TIMEOUT, tx.rollback()).await,
            None => Ok(()),
        }
    }
}
