/// Outbound handle of a player socket.
pub mod connection;
/// Dealing terms and jokers.
pub mod distribution;
/// Game domain types.
pub mod game;
/// A single match.
pub mod game_match;
/// Live sessions by scorepad.
pub mod registry;
/// Score computation.
pub mod scoring;
/// Game session of one scorepad.
pub mod session;
/// Match phase state machine.
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::scorepad_store::Stores, error::ServiceError};

pub use self::registry::SessionRegistry;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId};

/// Application state shared by handlers and tasks.
pub type SharedState = Arc<AppState>;

/// Shared handle to the installed storage backend, empty while degraded.
#[derive(Clone, Default)]
pub struct StoreSlot {
    inner: Arc<RwLock<Option<Stores>>>,
}

impl StoreSlot {
    /// Installed stores, if any.
    pub async fn get(&self) -> Option<Stores> {
        self.inner.read().await.clone()
    }

    /// Installed stores, or [`ServiceError::Degraded`] when there are none.
    pub async fn require(&self) -> Result<Stores, ServiceError> {
        self.get().await.ok_or(ServiceError::Degraded)
    }

    /// Install `stores`, replacing the previous ones.
    pub async fn set(&self, stores: Stores) {
        *self.inner.write().await = Some(stores);
    }
}

/// Central application state: configuration, storage handles and live game sessions.
pub struct AppState {
    config: Arc<AppConfig>,
    stores: StoreSlot,
    degraded: watch::Sender<bool>,
    sessions: SessionRegistry,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config: Arc::new(config),
            stores: StoreSlot::default(),
            degraded: degraded_tx,
            sessions: SessionRegistry::new(),
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Storage handle shared with the game sessions.
    pub fn store_slot(&self) -> &StoreSlot {
        &self.stores
    }

    /// Installed stores, even while degraded.
    pub async fn stores(&self) -> Option<Stores> {
        self.stores.get().await
    }

    /// Installed stores, or [`ServiceError::Degraded`] while degraded.
    pub async fn require_stores(&self) -> Result<Stores, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.stores.require().await
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_stores(&self, stores: Stores) {
        self.stores.set(stores).await;
        self.update_degraded(false);
    }

    /// Whether storage is currently unavailable.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Live game sessions keyed by scorepad.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::scorepad_store::memory::MemoryStore;

    #[tokio::test]
    async fn installing_stores_leaves_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_stores().await,
            Err(ServiceError::Degraded)
        ));

        state.set_stores(Stores::from_backend(MemoryStore::new())).await;

        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        assert!(state.require_stores().await.is_ok());

        state.update_degraded(true);
        assert!(state.is_degraded());
        assert!(state.stores().await.is_some());
    }
}
