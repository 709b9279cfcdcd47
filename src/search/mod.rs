//! # Search Module
//!
//! This module ranks declaration names against partial, live-typed queries.
//!
//! Two backends implement the [`Ranker`] trait:
//!
//! - the separator-aware subsequence matcher in [`fuzzy`], the default
//! - a Tantivy full-text index over name, module and description in [`fulltext`]
//!
//! ## Key Components
//!
//! - [`fuzzy`] - Match cost of a pattern against a single name
//! - [`ranker`] - Query type, filters, result limits and the fuzzy ranking pass
//! - [`fulltext`] - Tantivy-backed ranker
//! - [`suggest`] - Query derivation for unresolved documentation URLs
//! - [`tools`] - MCP tool implementations for search operations
//! - [`config`] - Configuration constants for search functionality

pub mod config;
pub mod fulltext;
pub mod fuzzy;
pub mod outputs;
pub mod ranker;
pub mod suggest;
pub mod tools;

use std::sync::Arc;

pub use fulltext::FullTextRanker;
pub use fuzzy::match_cost;
pub use ranker::{
    Filters, FuzzyRanker, MatchResult, Query, Ranker, Ranking, ResultLimit, SearchError, rank,
};
pub use tools::SearchTools;

/// Ranking backend selectable from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    #[default]
    Fuzzy,
    #[value(name = "fulltext")]
    FullText,
}

impl Backend {
    pub fn ranker(self) -> Arc<dyn Ranker> {
        match self {
            Backend::Fuzzy => Arc::new(FuzzyRanker::new()),
            Backend::FullText => Arc::new(FullTextRanker::new()),
        }
    }
}
