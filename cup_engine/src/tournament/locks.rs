//! Per-category write serialization.

use super::models::{Category, TournamentId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type ScopeKey = (TournamentId, Category);

/// Async lock map keyed by (tournament, modality, gender)
///
/// Writers of the same category queue up; different categories proceed in
/// parallel. Entries are created on first use and kept for the life of the
/// map.
#[derive(Clone, Default)]
pub struct ScopeLocks {
    locks: Arc<Mutex<HashMap<ScopeKey, Arc<Mutex<()>>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one category of a tournament
    pub async fn acquire(&self, tournament_id: TournamentId, category: Category) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry((tournament_id, category)).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of scopes seen so far
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::Gender;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_scope_is_exclusive() {
        let locks = ScopeLocks::new();
        let category = Category::new(1, Gender::Male);

        let guard = locks.acquire(1, category).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(1, category)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(20), locks.acquire(1, category)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_distinct_scopes_do_not_block() {
        let locks = ScopeLocks::new();
        let _boys = locks.acquire(1, Category::new(1, Gender::Male)).await;
        let girls = tokio::time::timeout(
            Duration::from_millis(20),
            locks.acquire(1, Category::new(1, Gender::Female)),
        )
        .await;

        assert!(girls.is_ok());
        assert_eq!(locks.len().await, 2);
    }
}
