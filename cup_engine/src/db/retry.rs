//! Bounded retries of units of work on transient write conflicts.

use super::repository::{TournamentRepository, UnitOfWork};
use crate::tournament::errors::{ErrorKind, TournamentError, TournamentResult};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future borrowed from a unit of work
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Retry policy with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Backoff before attempt `attempt + 1`: base · 2^(attempt−1), capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Single attempt, no backoff
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(400),
        }
    }
}

/// Run `work` inside a unit of work, committing on success
///
/// The unit is rolled back whenever `work` fails. Transient conflicts are
/// retried with backoff; once attempts run out, or the store fails in a way
/// retrying cannot fix, the caller gets `TournamentError::Integrity`, which
/// always means nothing was applied. A commit that fails without a transient
/// conflict (a timeout or a dropped connection) may still have landed, so it
/// is reported as `TournamentError::OutcomeUnknown` and never retried. Input
/// and not-found errors raised by `work` are returned unchanged.
pub async fn run_in_transaction<T, F>(
    repo: &dyn TournamentRepository,
    policy: &RetryPolicy,
    operation: &'static str,
    work: F,
) -> TournamentResult<T>
where
    T: Send,
    F: for<'a> Fn(&'a mut dyn UnitOfWork) -> BoxFuture<'a, TournamentResult<T>> + Send + Sync,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match attempt_once(repo, operation, &work).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                log::warn!(
                    "{operation}: attempt {attempt}/{max_attempts} hit a write conflict ({e}), retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) if e.is_transient() || e.kind() == ErrorKind::Store => {
                log::error!("{operation}: giving up after {attempt} attempt(s): {e}");
                return Err(TournamentError::Integrity {
                    operation,
                    attempts: attempt,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
}

async fn attempt_once<T, F>(
    repo: &dyn TournamentRepository,
    operation: &'static str,
    work: &F,
) -> TournamentResult<T>
where
    F: for<'a> Fn(&'a mut dyn UnitOfWork) -> BoxFuture<'a, TournamentResult<T>>,
{
    let mut uow = repo.begin().await?;

    match work(uow.as_mut()).await {
        Ok(value) => match uow.commit().await {
            Ok(()) => Ok(value),
            // Serialization failures at COMMIT are reported after the rollback
            Err(e) if e.is_transient() => Err(e),
            Err(e) => {
                log::error!("{operation}: commit outcome unknown: {e}");
                Err(TournamentError::OutcomeUnknown {
                    operation,
                    reason: e.to_string(),
                })
            }
        },
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                log::error!("Rollback failed after '{e}': {rollback_err}");
            }
            Err(e)
        }
    }
}
