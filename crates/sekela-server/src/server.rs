//! `AppState`: shared handles for request handlers.

use crate::error::ApiError;
use sekela_core::config::SekelaConfig;
use sekela_core::dataset::CatalogDataset;
use sekela_core::storage::{CatalogStore, Session};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// The Sekela API server state.
#[derive(Clone)]
pub struct AppState {
    pub store: CatalogStore,
    pub dataset: Arc<CatalogDataset>,
    pub config: Arc<SekelaConfig>,
    /// Serializes seed and refresh; reads never take it.
    admin_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", self.store.location())
            .field("dataset_version", &self.dataset.version)
            .finish()
    }
}

impl AppState {
    pub fn new(store: CatalogStore, dataset: CatalogDataset, config: SekelaConfig) -> Self {
        Self {
            store,
            dataset: Arc::new(dataset),
            config: Arc::new(config),
            admin_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Open the store and dataset named by `config`.
    pub fn from_config(config: SekelaConfig) -> sekela_core::Result<Self> {
        let store = CatalogStore::open(&config.database)?;
        let dataset = CatalogDataset::load_or_builtin(config.catalog.dataset.as_deref())?;
        Ok(Self::new(store, dataset, config))
    }

    /// Run `f` on the blocking pool with a freshly acquired session.
    ///
    /// The session is dropped when `f` returns, whether it succeeded or not.
    pub async fn with_session<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Session) -> sekela_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let mut session = store.session()?;
            f(&mut session)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("storage task failed: {e}")))?
        .map_err(ApiError::from)
    }

    /// Wait for exclusive access to administrative operations.
    pub async fn admin(&self) -> MutexGuard<'_, ()> {
        self.admin_lock.lock().await
    }
}
