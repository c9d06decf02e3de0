//! Tournament engine error types.

use super::models::{GroupId, MatchId, MatchStatus, TeamId, TournamentId};
use thiserror::Error;

/// Broad error classes callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Validation failed; nothing changed, retry with different input
    Input,
    /// Referenced record is absent; nothing changed
    NotFound,
    /// Transaction could not complete and was rolled back
    Integrity,
    /// Commit was sent but never confirmed; the changes may be applied
    OutcomeUnknown,
    /// Store failure outside a transaction
    Store,
}

/// Tournament engine errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Insufficient teams: need {needed}, have {actual}")]
    InsufficientTeams { needed: usize, actual: usize },

    #[error("Invalid scope filter: {0}")]
    InvalidScope(String),

    #[error("Invalid elimination phase: {0}")]
    InvalidPhase(String),

    #[error("Invalid result for match {match_id}: {reason}")]
    InvalidResult { match_id: MatchId, reason: String },

    #[error("Team {team_id} does not play in match {match_id}")]
    TeamNotInMatch { match_id: MatchId, team_id: TeamId },

    #[error("Match {0} is already finalized")]
    MatchAlreadyFinalized(MatchId),

    #[error("Match {match_id} cannot move from {from} to {to}")]
    InvalidTransition {
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    },

    #[error("Group {0} already has scheduled matches")]
    ScheduleExists(GroupId),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("{operation} rolled back after {attempts} attempt(s), no changes applied: {reason}")]
    Integrity {
        operation: &'static str,
        attempts: u32,
        reason: String,
    },

    #[error("{operation} commit was not confirmed, reconcile before retrying: {reason}")]
    OutcomeUnknown {
        operation: &'static str,
        reason: String,
    },

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Unit of work already committed or rolled back")]
    TransactionClosed,

    #[error("Database operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl TournamentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::InsufficientTeams { .. }
            | TournamentError::InvalidScope(_)
            | TournamentError::InvalidPhase(_)
            | TournamentError::InvalidResult { .. }
            | TournamentError::TeamNotInMatch { .. }
            | TournamentError::MatchAlreadyFinalized(_)
            | TournamentError::InvalidTransition { .. }
            | TournamentError::ScheduleExists(_) => ErrorKind::Input,
            TournamentError::TournamentNotFound(_)
            | TournamentError::MatchNotFound(_)
            | TournamentError::GroupNotFound(_) => ErrorKind::NotFound,
            TournamentError::Integrity { .. } => ErrorKind::Integrity,
            TournamentError::OutcomeUnknown { .. } => ErrorKind::OutcomeUnknown,
            TournamentError::WriteConflict(_)
            | TournamentError::TransactionClosed
            | TournamentError::Timeout(_)
            | TournamentError::Database(_) => ErrorKind::Store,
        }
    }

    /// Whether retrying the same transaction may succeed
    ///
    /// Covers PostgreSQL serialization failures (40001) and deadlocks (40P01)
    /// as well as optimistic conflicts reported by the in-memory store.
    pub fn is_transient(&self) -> bool {
        match self {
            TournamentError::WriteConflict(_) => true,
            TournamentError::Database(sqlx::Error::Database(db_err)) => {
                matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
            }
            TournamentError::Database(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }

    /// Get a client-safe error message that doesn't leak store internals
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Input | ErrorKind::NotFound => self.to_string(),
            ErrorKind::Integrity => {
                "Operation failed and was rolled back; no matches were changed".to_string()
            }
            ErrorKind::OutcomeUnknown => {
                "Operation may have been applied; check the affected matches before retrying"
                    .to_string()
            }
            ErrorKind::Store => "Internal server error".to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            TournamentError::InsufficientTeams {
                needed: 2,
                actual: 1
            }
            .kind(),
            ErrorKind::Input
        );
        assert_eq!(TournamentError::MatchNotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(
            TournamentError::Integrity {
                operation: "record_forfeit",
                attempts: 3,
                reason: "conflict".to_string(),
            }
            .kind(),
            ErrorKind::Integrity
        );
    }

    #[test]
    fn test_only_conflicts_are_transient() {
        assert!(TournamentError::WriteConflict("version".to_string()).is_transient());
        assert!(!TournamentError::MatchNotFound(1).is_transient());
        assert!(!TournamentError::Database(sqlx::Error::RowNotFound).is_transient());
    }

    #[test]
    fn test_client_message_hides_store_details() {
        let err = TournamentError::Database(sqlx::Error::PoolClosed);
        assert_eq!(err.client_message(), "Internal server error");

        let err = TournamentError::Integrity {
            operation: "seed_bracket",
            attempts: 4,
            reason: "serialization failure".to_string(),
        };
        assert!(!err.client_message().contains("serialization"));
        assert!(err.to_string().contains("4 attempt(s)"));

        let err = TournamentError::OutcomeUnknown {
            operation: "record_forfeit",
            reason: "Database operation timed out after 10s".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::OutcomeUnknown);
        assert!(!err.is_transient());
        assert!(err.client_message().contains("may have been applied"));
        assert!(!err.client_message().contains("rolled back"));

        let err = TournamentError::MatchAlreadyFinalized(7);
        assert_eq!(err.client_message(), "Match 7 is already finalized");
    }
}
