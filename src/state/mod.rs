/// Per-session broadcast hub and ticker.
pub mod hub;
/// Per-session lock table.
pub mod locks;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::config::AppConfig;
use crate::dao::session_store::DraftStore;
use crate::error::ServiceError;
use crate::services::rate_limit::RateLimiter;
use crate::state::{hub::StreamHub, locks::SessionLocks};

pub type SharedState = Arc<AppState>;

/// Central application state: the storage slot, the degraded flag, the
/// broadcast hub, the session lock table, and the rate-limit buckets.
pub struct AppState {
    config: AppConfig,
    draft_store: RwLock<Option<Arc<dyn DraftStore>>>,
    degraded: watch::Sender<bool>,
    hub: StreamHub,
    locks: SessionLocks,
    action_limiter: RateLimiter,
    owner_limiter: RateLimiter,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            draft_store: RwLock::new(None),
            degraded: degraded_tx,
            hub: StreamHub::new(),
            locks: SessionLocks::new(),
            action_limiter: RateLimiter::player_actions(),
            owner_limiter: RateLimiter::owner_mutations(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current draft store, if one is installed.
    pub async fn draft_store(&self) -> Option<Arc<dyn DraftStore>> {
        let guard = self.draft_store.read().await;
        guard.as_ref().cloned()
    }

    /// Draft store handle, or the degraded-mode failure when none is up.
    pub async fn require_draft_store(&self) -> Result<Arc<dyn DraftStore>, ServiceError> {
        self.draft_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_draft_store(&self, store: Arc<dyn DraftStore>) {
        {
            let mut guard = self.draft_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.draft_store.read().await;
        guard.is_none() || *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }
        let _ = self.degraded.send(value);
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub fanning events out to spectator streams.
    pub fn hub(&self) -> &StreamHub {
        &self.hub
    }

    /// Lock table serializing per-session mutations.
    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    /// Bucket for player-action writes, keyed session plus token/address.
    pub fn action_limiter(&self) -> &RateLimiter {
        &self.action_limiter
    }

    /// Bucket for owner mutations, keyed by owner id.
    pub fn owner_limiter(&self) -> &RateLimiter {
        &self.owner_limiter
    }
}
