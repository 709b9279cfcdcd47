//! # Query Module
//!
//! Asynchronous request/response layer over a shared NameStore and Ranker.
//!
//! A [`QueryService`] is constructed once and handed out by reference (or
//! cloned; clones share the store and ranker). Each caller stream gets its own
//! [`Session`], which enforces that only the response to the caller's latest
//! query is ever delivered.

pub mod session;

use std::sync::Arc;

pub use session::{SearchOutcome, SearchResponse, Session, SessionStatus};

use crate::search::ranker::{FuzzyRanker, Ranker};
use crate::store::{NameStore, StoreError, StoreLoader};

#[derive(Clone)]
pub struct QueryService {
    loader: Arc<StoreLoader>,
    ranker: Arc<dyn Ranker>,
}

impl QueryService {
    pub fn new(loader: StoreLoader, ranker: Arc<dyn Ranker>) -> Self {
        Self {
            loader: Arc::new(loader),
            ranker,
        }
    }

    /// Service using the separator-aware fuzzy ranker
    pub fn fuzzy(loader: StoreLoader) -> Self {
        Self::new(loader, Arc::new(FuzzyRanker::new()))
    }

    /// Open a new, independent query session
    pub fn session(&self) -> Session {
        Session::new(self.loader.clone(), self.ranker.clone())
    }

    /// The shared store, loading it on first use
    pub async fn store(&self) -> Result<Arc<NameStore>, StoreError> {
        self.loader.load().await
    }

    pub fn ranker_name(&self) -> &'static str {
        self.ranker.name()
    }

    pub fn source_name(&self) -> &str {
        self.loader.source_name()
    }
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("loader", &self.loader)
            .field("ranker", &self.ranker.name())
            .finish()
    }
}
