use std::collections::BTreeSet;

use crate::store::error::StoreError;
use crate::store::types::Candidate;

/// Immutable, ordered set of search candidates.
///
/// Built once from a finite sequence of candidates; input order is kept so the
/// ranker can break cost ties by store position.
#[derive(Debug, Clone, Default)]
pub struct NameStore {
    candidates: Vec<Candidate>,
}

impl NameStore {
    /// Build a store, rejecting any candidate with an empty name
    pub fn build<I, C>(candidates: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        let candidates: Vec<Candidate> = candidates.into_iter().map(Into::into).collect();

        if let Some(position) = candidates.iter().position(|c| c.name.is_empty()) {
            return Err(StoreError::config(format!(
                "candidate at position {position} has an empty name"
            )));
        }

        Ok(Self { candidates })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate at `ordinal` (its position in the build input)
    pub fn get(&self, ordinal: usize) -> Option<&Candidate> {
        self.candidates.get(ordinal)
    }

    /// Iterate candidates in store order
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Distinct kinds present in the store, sorted
    pub fn kinds(&self) -> Vec<String> {
        self.candidates
            .iter()
            .filter_map(|c| c.kind.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct attribute tags present in the store, sorted
    pub fn attributes(&self) -> Vec<String> {
        self.candidates
            .iter()
            .flat_map(|c| c.attributes.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
