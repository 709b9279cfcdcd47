//! Full-text alternate ranker
//!
//! Indexes each candidate's module, name and description in an in-RAM Tantivy
//! index and answers queries with BM25 relevance. Terms are combined with AND
//! and fields are boosted (name over description over module), so it behaves
//! like a prose search rather than an abbreviation matcher. The index is built
//! lazily on first use and rebuilt only when a different store is passed in.

use std::sync::{Arc, Mutex, Weak};

use tantivy::{
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument,
    collector::TopDocs,
    doc,
    query::QueryParser,
    schema::{FAST, Field, STORED, Schema, TEXT, Value},
};

use crate::search::config::{DESCRIPTION_BOOST, INDEX_WRITER_BUFFER_SIZE, MODULE_BOOST, NAME_BOOST};
use crate::search::ranker::{MatchResult, Query, Ranker, Ranking, SearchError};
use crate::store::NameStore;

#[derive(Debug, Clone, Copy)]
struct IndexFields {
    module: Field,
    name: Field,
    description: Field,
    ordinal: Field,
}

struct TextIndex {
    index: Index,
    reader: IndexReader,
    fields: IndexFields,
    /// Store this index was built from
    store: Weak<NameStore>,
}

impl TextIndex {
    fn build(store: &Arc<NameStore>) -> Result<Self, SearchError> {
        let mut schema_builder = Schema::builder();
        let fields = IndexFields {
            module: schema_builder.add_text_field("module", TEXT),
            name: schema_builder.add_text_field("name", TEXT),
            description: schema_builder.add_text_field("description", TEXT),
            ordinal: schema_builder.add_u64_field("ordinal", FAST | STORED),
        };
        let index = Index::create_in_ram(schema_builder.build());

        let mut writer: IndexWriter = index.writer(INDEX_WRITER_BUFFER_SIZE)?;
        for (ordinal, candidate) in store.iter().enumerate() {
            writer.add_document(doc!(
                fields.module => candidate.module.clone().unwrap_or_default(),
                fields.name => candidate.name.clone(),
                fields.description => candidate.description.clone().unwrap_or_default(),
                fields.ordinal => ordinal as u64,
            ))?;
        }
        writer.commit()?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        tracing::info!("Built full-text index over {} candidates", store.len());

        Ok(Self {
            index,
            reader,
            fields,
            store: Arc::downgrade(store),
        })
    }

    fn query_parser(&self) -> QueryParser {
        let mut parser = QueryParser::for_index(
            &self.index,
            vec![self.fields.module, self.fields.name, self.fields.description],
        );
        parser.set_conjunction_by_default();
        parser.set_field_boost(self.fields.module, MODULE_BOOST);
        parser.set_field_boost(self.fields.description, DESCRIPTION_BOOST);
        parser.set_field_boost(self.fields.name, NAME_BOOST);
        parser
    }

    fn search(&self, store: &NameStore, query: &Query, pattern: &str) -> Result<Ranking, SearchError> {
        let (parsed, errors) = self.query_parser().parse_query_lenient(pattern);
        if !errors.is_empty() {
            tracing::debug!("Lenient parse of '{}' dropped {} clause(s)", pattern, errors.len());
        }

        let searcher = self.reader.searcher();
        let hits = searcher.search(&parsed, &TopDocs::with_limit(store.len().max(1)))?;

        let mut matches = Vec::with_capacity(hits.len());
        for (score, address) in hits {
            let doc: TantivyDocument = searcher.doc(address)?;
            let Some(ordinal) = doc.get_first(self.fields.ordinal).and_then(|v| v.as_u64()) else {
                continue;
            };
            let Some(candidate) = store.get(ordinal as usize) else {
                continue;
            };
            if !query.filters.accepts(candidate) {
                continue;
            }
            matches.push((
                ordinal,
                MatchResult {
                    candidate: candidate.clone(),
                    cost: 1.0 / (1.0 + f64::from(score)),
                },
            ));
        }

        // Relevance ties fall back to store order
        matches.sort_by_key(|(ordinal, _)| *ordinal);
        let matches = matches.into_iter().map(|(_, m)| m).collect();

        Ok(Ranking::from_unsorted(matches, query.limit))
    }
}

/// Tantivy-backed alternative to the fuzzy ranker
#[derive(Default)]
pub struct FullTextRanker {
    index: Mutex<Option<Arc<TextIndex>>>,
}

impl FullTextRanker {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_for(&self, store: &Arc<NameStore>) -> Result<Arc<TextIndex>, SearchError> {
        let mut slot = self
            .index
            .lock()
            .map_err(|_| SearchError::Backend("full-text index lock poisoned".to_string()))?;

        if let Some(index) = slot
            .as_ref()
            .filter(|index| std::ptr::eq(index.store.as_ptr(), Arc::as_ptr(store)))
        {
            return Ok(index.clone());
        }

        let index = Arc::new(TextIndex::build(store)?);
        *slot = Some(index.clone());
        Ok(index)
    }
}

impl Ranker for FullTextRanker {
    fn name(&self) -> &'static str {
        "fulltext"
    }

    fn rank(&self, store: &Arc<NameStore>, query: &Query) -> Result<Ranking, SearchError> {
        let Some(pattern) = query.pattern() else {
            return Ok(Ranking::empty());
        };
        if store.is_empty() {
            return Ok(Ranking::empty());
        }

        self.index_for(store)?.search(store, query, pattern)
    }
}

impl std::fmt::Debug for FullTextRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullTextRanker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ranker::{Filters, ResultLimit};
    use crate::store::Candidate;

    fn store() -> Arc<NameStore> {
        let store = NameStore::build(vec![
            Candidate::new("nat.succ_le_iff")
                .with_module("data.nat.basic")
                .with_description("successor is less or equal")
                .with_kind("theorem"),
            Candidate::new("list.map")
                .with_module("data.list.basic")
                .with_description("apply a function to every element")
                .with_kind("def"),
            Candidate::new("list.filter")
                .with_module("data.list.basic")
                .with_description("keep each element satisfying a predicate")
                .with_kind("def")
                .with_attribute("simp"),
        ])
        .unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_matches_name_terms() {
        let store = store();
        let ranking = FullTextRanker::new()
            .rank(&store, &Query::new("map"))
            .unwrap();
        assert_eq!(ranking.names(), vec!["list.map"]);
        assert!(ranking.matches[0].cost > 0.0 && ranking.matches[0].cost < 1.0);
    }

    #[test]
    fn test_terms_are_combined_with_and() {
        let store = store();
        let ranker = FullTextRanker::new();

        let ranking = ranker.rank(&store, &Query::new("list element")).unwrap();
        assert_eq!(ranking.total, 2);

        let ranking = ranker.rank(&store, &Query::new("list predicate")).unwrap();
        assert_eq!(ranking.names(), vec!["list.filter"]);
    }

    #[test]
    fn test_filters_and_limits_apply() {
        let store = store();
        let ranker = FullTextRanker::new();
        let filters = Filters {
            attributes: ["simp".to_string()].into_iter().collect(),
            ..Default::default()
        };

        let ranking = ranker
            .rank(&store, &Query::new("list").with_filters(filters))
            .unwrap();
        assert_eq!(ranking.names(), vec!["list.filter"]);

        let ranking = ranker
            .rank(&store, &Query::new("list").with_limit(ResultLimit::Count(1)))
            .unwrap();
        assert_eq!(ranking.matches.len(), 1);
        assert_eq!(ranking.total, 2);
    }

    #[test]
    fn test_empty_query_and_empty_store() {
        let ranker = FullTextRanker::new();
        assert!(ranker.rank(&store(), &Query::new("  ")).unwrap().matches.is_empty());

        let empty = Arc::new(NameStore::default());
        assert!(ranker.rank(&empty, &Query::new("map")).unwrap().matches.is_empty());
    }

    #[test]
    fn test_index_is_reused_for_the_same_store() {
        let store = store();
        let ranker = FullTextRanker::new();
        ranker.rank(&store, &Query::new("map")).unwrap();
        let first = ranker.index_for(&store).unwrap();
        ranker.rank(&store, &Query::new("list")).unwrap();
        assert!(Arc::ptr_eq(&first, &ranker.index_for(&store).unwrap()));

        let other = Arc::new(NameStore::build(["list.map"]).unwrap());
        assert!(!Arc::ptr_eq(&first, &ranker.index_for(&other).unwrap()));
    }

    #[test]
    fn test_query_syntax_errors_do_not_fail() {
        let ranking = FullTextRanker::new()
            .rank(&store(), &Query::new("map AND ("))
            .unwrap();
        assert!(ranking.total <= 1);
    }
}
