//! Per-session lock table serializing every mutation of a session.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;

use crate::error::ServiceError;

/// Lock table keyed by session id. A guard spans the whole critical section
/// (load, burn, reduce, persist, broadcast), giving mutations on one session
/// a total order while leaving other sessions untouched.
#[derive(Default)]
pub struct SessionLocks {
    entries: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the session lock, giving up after `deadline` so a wedged
    /// critical section surfaces as a retryable failure instead of piling
    /// up waiters.
    pub async fn acquire(
        &self,
        key: &str,
        deadline: Duration,
    ) -> Result<OwnedMutexGuard<()>, ServiceError> {
        let lock = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        timeout(deadline, lock.lock_owned())
            .await
            .map_err(|_| ServiceError::Timeout)
    }

    /// Drop the table entry for a removed session.
    pub fn evict(&self, key: &str) {
        self.entries.remove(key);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serializes_holders_of_one_key() {
        let locks = SessionLocks::new();
        let deadline = Duration::from_millis(50);

        let guard = locks.acquire("s1", deadline).await.unwrap();
        let contended = locks.acquire("s1", deadline).await;
        assert!(matches!(contended, Err(ServiceError::Timeout)));

        drop(guard);
        assert!(locks.acquire("s1", deadline).await.is_ok());
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let locks = SessionLocks::new();
        let deadline = Duration::from_millis(50);

        let _guard = locks.acquire("s1", deadline).await.unwrap();
        assert!(locks.acquire("s2", deadline).await.is_ok());
    }

    #[tokio::test]
    async fn evict_drops_the_entry() {
        let locks = SessionLocks::new();
        let deadline = Duration::from_millis(50);
        drop(locks.acquire("s1", deadline).await.unwrap());
        assert_eq!(locks.len(), 1);
        locks.evict("s1");
        assert_eq!(locks.len(), 0);
    }
}
