use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::search::config::{DEFAULT_MAX_RESULTS, MAX_QUERY_LENGTH};
use crate::search::fuzzy::match_cost;
use crate::store::{Candidate, NameStore, StoreError};

/// Errors raised while answering a query
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The ranking backend failed (index construction, query execution)
    #[error("Ranking backend failed: {0}")]
    Backend(String),

    /// The ranking worker panicked or was cancelled
    #[error("Ranking worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        SearchError::Backend(err.to_string())
    }
}

/// Kind and attribute restrictions applied before matching
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub kinds: BTreeSet<String>,
    #[serde(default)]
    pub attributes: BTreeSet<String>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty() && self.attributes.is_empty()
    }

    /// Whether `candidate` passes both restrictions.
    ///
    /// A non-empty kind set requires the candidate's kind to be a member; a
    /// non-empty attribute set requires at least one shared attribute.
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        let kind_ok = self.kinds.is_empty()
            || candidate
                .kind
                .as_ref()
                .is_some_and(|kind| self.kinds.contains(kind));
        let attributes_ok = self.attributes.is_empty()
            || candidate
                .attributes
                .iter()
                .any(|attribute| self.attributes.contains(attribute));

        kind_ok && attributes_ok
    }
}

/// How many matches a ranking may return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultLimit {
    /// Cap at [`DEFAULT_MAX_RESULTS`]
    #[default]
    Default,
    /// Cap at exactly this many (zero returns nothing)
    Count(usize),
    /// Return every match
    Unlimited,
}

impl ResultLimit {
    /// Limit for a wire request: absent means the default cap, negative means no cap
    pub fn from_request(max_count: Option<i64>) -> Self {
        match max_count {
            None => ResultLimit::Default,
            Some(n) if n < 0 => ResultLimit::Unlimited,
            Some(n) => ResultLimit::Count(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }

    pub fn cap(self) -> Option<usize> {
        match self {
            ResultLimit::Default => Some(DEFAULT_MAX_RESULTS),
            ResultLimit::Count(n) => Some(n),
            ResultLimit::Unlimited => None,
        }
    }
}

/// A search request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub text: String,
    pub limit: ResultLimit,
    pub filters: Filters,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: ResultLimit) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_max_results(self, max_results: usize) -> Self {
        self.with_limit(ResultLimit::Count(max_results))
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Trimmed pattern, or `None` when the query must produce no results
    pub fn pattern(&self) -> Option<&str> {
        let pattern = self.text.trim();
        if pattern.is_empty() {
            return None;
        }
        if pattern.chars().count() > MAX_QUERY_LENGTH {
            tracing::warn!(
                "Ignoring query of {} characters (max {})",
                pattern.chars().count(),
                MAX_QUERY_LENGTH
            );
            return None;
        }
        Some(pattern)
    }
}

/// One ranked candidate
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub candidate: Candidate,
    pub cost: f64,
}

/// Ranked matches plus the number of matches before truncation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub matches: Vec<MatchResult>,
    pub total: usize,
}

impl Ranking {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sort by cost (stable, so equal costs keep store order) and truncate
    pub(crate) fn from_unsorted(mut matches: Vec<MatchResult>, limit: ResultLimit) -> Self {
        matches.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        let total = matches.len();
        if let Some(cap) = limit.cap() {
            matches.truncate(cap);
        }
        Self { matches, total }
    }

    pub fn names(&self) -> Vec<&str> {
        self.matches
            .iter()
            .map(|m| m.candidate.name.as_str())
            .collect()
    }
}

/// Produces an ordered match list for a query over a store
pub trait Ranker: Send + Sync {
    /// Short backend name, reported by the stats tool
    fn name(&self) -> &'static str;

    fn rank(&self, store: &Arc<NameStore>, query: &Query) -> Result<Ranking, SearchError>;
}

/// Ranks candidates with [`match_cost`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyRanker;

impl FuzzyRanker {
    pub fn new() -> Self {
        Self
    }
}

impl Ranker for FuzzyRanker {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn rank(&self, store: &Arc<NameStore>, query: &Query) -> Result<Ranking, SearchError> {
        Ok(rank(store, query))
    }
}

/// Rank every candidate in `store` against `query`
pub fn rank(store: &NameStore, query: &Query) -> Ranking {
    let Some(pattern) = query.pattern() else {
        return Ranking::empty();
    };

    let matches = store
        .iter()
        .filter(|candidate| query.filters.accepts(candidate))
        .filter_map(|candidate| {
            match_cost(&candidate.name, pattern).map(|cost| MatchResult {
                candidate: candidate.clone(),
                cost,
            })
        })
        .collect();

    Ranking::from_unsorted(matches, query.limit)
}
