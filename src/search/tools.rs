use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use rmcp::schemars;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::query::{QueryService, SearchOutcome, Session};
use crate::search::config::MAX_SESSIONS;
use crate::search::outputs::{
    MatchOutput, SearchDeclarationsOutput, StoreStatsOutput, SuggestDeclarationsOutput,
};
use crate::search::ranker::{Filters, Query, ResultLimit, SearchError};
use crate::search::suggest::query_from_url;
use crate::util::{deserialize_limit_lenient, deserialize_text_lenient};

/// Session used when a request does not name one
pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchDeclarationsParams {
    #[schemars(description = "Partial declaration name typed by the user, e.g. 'Nadd' or 'n.m'")]
    #[serde(default, deserialize_with = "deserialize_text_lenient")]
    pub query: String,
    #[schemars(
        description = "Maximum number of results to return (default: 20, negative: no limit)"
    )]
    #[serde(default, deserialize_with = "deserialize_limit_lenient")]
    pub max_count: Option<i64>,
    #[schemars(description = "Only return declarations of one of these kinds (e.g. 'def', 'theorem')")]
    #[serde(default)]
    pub kinds: Option<Vec<String>>,
    #[schemars(description = "Only return declarations carrying at least one of these attributes")]
    #[serde(default)]
    pub attributes: Option<Vec<String>>,
    #[schemars(
        description = "Caller stream identifier. Only the latest query of a session receives results; older ones are reported as superseded (default: 'default')"
    )]
    #[serde(default)]
    pub session: Option<String>,
}

impl SearchDeclarationsParams {
    fn to_query(&self) -> Query {
        let filters = Filters {
            kinds: self.kinds.iter().flatten().cloned().collect(),
            attributes: self.attributes.iter().flatten().cloned().collect(),
        };
        Query::new(self.query.clone())
            .with_limit(ResultLimit::from_request(self.max_count))
            .with_filters(filters)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SuggestDeclarationsParams {
    #[schemars(description = "Documentation URL that could not be resolved")]
    #[serde(default, deserialize_with = "deserialize_text_lenient")]
    pub url: String,
    #[schemars(description = "Maximum number of suggestions to return (default: 20)")]
    #[serde(default, deserialize_with = "deserialize_limit_lenient")]
    pub max_count: Option<i64>,
}

fn error_kind(err: &SearchError) -> Option<String> {
    match err {
        SearchError::Store(store_err) => Some(store_err.kind().to_string()),
        SearchError::Backend(_) => Some("backend_error".to_string()),
        SearchError::Worker(_) => Some("worker_error".to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct SearchTools {
    service: QueryService,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SearchTools {
    pub fn new(service: QueryService) -> Self {
        Self {
            service,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn service(&self) -> &QueryService {
        &self.service
    }

    /// Get or open the named session, evicting unused sessions once the map is full
    async fn session(&self, name: &str) -> Session {
        let mut sessions = self.sessions.lock().await;
        if !sessions.contains_key(name) && sessions.len() >= MAX_SESSIONS {
            let before = sessions.len();
            sessions.retain(|_, session| session.is_in_use());
            tracing::debug!("Evicted {} idle search sessions", before - sessions.len());
        }
        sessions
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!("Opening search session '{}'", name);
                self.service.session()
            })
            .clone()
    }

    /// Rank declarations for a live-typing caller
    pub async fn search_declarations(&self, params: SearchDeclarationsParams) -> String {
        let session_name = params.session.as_deref().unwrap_or(DEFAULT_SESSION);
        let session = self.session(session_name).await;

        let output = match session.search(params.to_query()).await {
            Ok(SearchOutcome::Delivered(response)) => SearchDeclarationsOutput::from(response),
            Ok(SearchOutcome::Superseded { sequence }) => {
                SearchDeclarationsOutput::Superseded { sequence }
            }
            Err(e) => {
                tracing::warn!("Search for '{}' failed: {}", params.query, e);
                SearchDeclarationsOutput::Error {
                    error: format!("Search failed: {e}"),
                    kind: error_kind(&e),
                }
            }
        };

        output.to_json()
    }

    /// Suggest declarations for a documentation URL that did not resolve
    pub async fn suggest_declarations(&self, params: SuggestDeclarationsParams) -> String {
        let Some(query_text) = query_from_url(&params.url) else {
            return SuggestDeclarationsOutput::Ok {
                url: params.url,
                query: None,
                suggestions: Vec::new(),
            }
            .to_json();
        };

        // Each lookup stands alone, so it gets a session of its own
        let query = Query::new(query_text.clone())
            .with_limit(ResultLimit::from_request(params.max_count));
        let output = match self.service.session().search(query).await {
            Ok(outcome) => SuggestDeclarationsOutput::Ok {
                url: params.url,
                query: Some(query_text),
                suggestions: outcome
                    .delivered()
                    .map(|response| response.matches.into_iter().map(MatchOutput::from).collect())
                    .unwrap_or_default(),
            },
            Err(e) => SuggestDeclarationsOutput::Error {
                error: format!("Failed to get suggestions: {e}"),
                kind: error_kind(&e),
            },
        };

        output.to_json()
    }

    /// Candidate count and filter values of the loaded store
    pub async fn store_stats(&self) -> String {
        let output = match self.service.store().await {
            Ok(store) => StoreStatsOutput::Ok {
                source: self.service.source_name().to_string(),
                backend: self.service.ranker_name().to_string(),
                candidates: store.len(),
                kinds: store.kinds(),
                attributes: store.attributes(),
            },
            Err(e) => StoreStatsOutput::Error {
                error: format!("Failed to load store: {e}"),
                kind: Some(e.kind().to_string()),
            },
        };

        output.to_json()
    }
}
