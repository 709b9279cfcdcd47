//! Per-caller query sessions
//!
//! Every `search` call on a session takes the next sequence number. A result
//! is delivered only if its sequence number is still the session's latest when
//! ranking finishes; anything older is superseded and dropped. Delivered
//! sequence numbers therefore only ever increase, whatever order the rankings
//! complete in.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, watch};

use crate::search::ranker::{MatchResult, Query, Ranker, Ranking, SearchError};
use crate::store::StoreLoader;

/// Whether a session has outstanding searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Querying,
}

/// A response delivered to the session's caller
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub sequence: u64,
    pub query: String,
    pub matches: Vec<MatchResult>,
    /// Number of matches before truncation
    pub total: usize,
}

/// Result of a single `search` call
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Delivered(SearchResponse),
    /// A newer search was issued on the session before this one finished
    Superseded { sequence: u64 },
}

impl SearchOutcome {
    pub fn sequence(&self) -> u64 {
        match self {
            SearchOutcome::Delivered(response) => response.sequence,
            SearchOutcome::Superseded { sequence } => *sequence,
        }
    }

    pub fn delivered(self) -> Option<SearchResponse> {
        match self {
            SearchOutcome::Delivered(response) => Some(response),
            SearchOutcome::Superseded { .. } => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, SearchOutcome::Superseded { .. })
    }
}

#[derive(Debug, Default)]
struct SessionState {
    latest_issued: u64,
    last_delivered: u64,
}

/// Counts a search as outstanding until it is dropped, finished or not
struct OutstandingGuard(Arc<AtomicUsize>);

impl OutstandingGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One logical stream of queries. Clones share the same sequence.
#[derive(Clone)]
pub struct Session {
    loader: Arc<StoreLoader>,
    ranker: Arc<dyn Ranker>,
    state: Arc<Mutex<SessionState>>,
    outstanding: Arc<AtomicUsize>,
    delivered: Arc<watch::Sender<Option<SearchResponse>>>,
}

impl Session {
    pub(crate) fn new(loader: Arc<StoreLoader>, ranker: Arc<dyn Ranker>) -> Self {
        let (delivered, _) = watch::channel(None);
        Self {
            loader,
            ranker,
            state: Arc::new(Mutex::new(SessionState::default())),
            outstanding: Arc::new(AtomicUsize::new(0)),
            delivered: Arc::new(delivered),
        }
    }

    /// Receiver that always holds the most recently delivered response
    pub fn subscribe(&self) -> watch::Receiver<Option<SearchResponse>> {
        self.delivered.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        if self.outstanding.load(Ordering::SeqCst) > 0 {
            SessionStatus::Querying
        } else {
            SessionStatus::Idle
        }
    }

    /// Whether a search is running or another handle to this session is alive
    pub(crate) fn is_in_use(&self) -> bool {
        self.status() == SessionStatus::Querying || Arc::strong_count(&self.state) > 1
    }

    /// Highest sequence number issued so far (0 before the first search)
    pub async fn latest_sequence(&self) -> u64 {
        self.state.lock().await.latest_issued
    }

    /// Run `query`, superseding every older search still outstanding on this session
    pub async fn search(&self, query: Query) -> Result<SearchOutcome, SearchError> {
        let _outstanding = OutstandingGuard::enter(&self.outstanding);
        let sequence = {
            let mut state = self.state.lock().await;
            state.latest_issued += 1;
            state.latest_issued
        };
        tracing::debug!("Session search #{} for '{}'", sequence, query.text);

        let result = self.run(&query).await;

        let mut state = self.state.lock().await;
        let is_current = sequence == state.latest_issued && sequence > state.last_delivered;
        if !is_current {
            tracing::debug!(
                "Dropping result of search #{} (latest is #{})",
                sequence,
                state.latest_issued
            );
            return Ok(SearchOutcome::Superseded { sequence });
        }

        let ranking = result?;
        state.last_delivered = sequence;

        let response = SearchResponse {
            sequence,
            query: query.text,
            matches: ranking.matches,
            total: ranking.total,
        };
        self.delivered.send_replace(Some(response.clone()));
        Ok(SearchOutcome::Delivered(response))
    }

    async fn run(&self, query: &Query) -> Result<Ranking, SearchError> {
        if query.pattern().is_none() {
            return Ok(Ranking::empty());
        }

        let store = self.loader.load().await?;
        let ranker = self.ranker.clone();
        let query = query.clone();

        // Ranking is CPU-bound; keep it off the async workers
        tokio::task::spawn_blocking(move || ranker.rank(&store, &query)).await?
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("ranker", &self.ranker.name())
            .finish_non_exhaustive()
    }
}
