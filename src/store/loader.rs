//! Single-flight, memoized NameStore loading
//!
//! Concurrent and repeated `load()` calls share one fetch. A successful build
//! is kept for the lifetime of the loader; a failed one is handed to every
//! caller that was waiting on it and then forgotten, so the next call retries.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;

use crate::store::error::StoreError;
use crate::store::name_store::NameStore;
use crate::store::source::CandidateSource;

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<NameStore>, StoreError>>>;

pub struct StoreLoader {
    source: Arc<dyn CandidateSource>,
    slot: Mutex<Option<SharedLoad>>,
}

impl StoreLoader {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self {
            source,
            slot: Mutex::new(None),
        }
    }

    pub fn from_source(source: impl CandidateSource + 'static) -> Self {
        Self::new(Arc::new(source))
    }

    /// Name of the underlying source
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Return the built store, fetching it on first use
    pub async fn load(&self) -> Result<Arc<NameStore>, StoreError> {
        let load = {
            let mut slot = self.slot.lock().await;
            match slot.as_ref() {
                // A failed attempt whose waiters all went away is still here
                Some(existing) if !matches!(existing.peek(), Some(Err(_))) => existing.clone(),
                _ => {
                    let fresh = Self::fetch_and_build(self.source.clone()).boxed().shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        let result = load.clone().await;

        if result.is_err() {
            let mut slot = self.slot.lock().await;
            // A newer attempt may already be running; only clear our own.
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&load)) {
                *slot = None;
            }
        }

        result
    }

    /// Store if already built, without triggering a fetch
    pub async fn loaded(&self) -> Option<Arc<NameStore>> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .and_then(|load| load.peek())
            .and_then(|result| result.as_ref().ok().cloned())
    }

    async fn fetch_and_build(
        source: Arc<dyn CandidateSource>,
    ) -> Result<Arc<NameStore>, StoreError> {
        tracing::info!("Loading candidates from {}", source.name());

        let candidates = source.fetch().await.inspect_err(|e| {
            tracing::warn!("Failed to fetch candidates from {}: {}", source.name(), e);
        })?;
        let store = NameStore::build(candidates).inspect_err(|e| {
            tracing::warn!("Rejected candidates from {}: {}", source.name(), e);
        })?;

        tracing::info!("Built name store with {} candidates", store.len());
        Ok(Arc::new(store))
    }
}

impl std::fmt::Debug for StoreLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreLoader")
            .field("source", &self.source.name())
            .finish_non_exhaustive()
    }
}
