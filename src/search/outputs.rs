//! Output types for search tools
//!
//! These types are used as the return values from search tool methods.
//! They are serialized to JSON strings for the MCP protocol, and can be
//! deserialized in tests for type-safe validation.

use serde::{Deserialize, Serialize};

use crate::query::SearchResponse;
use crate::search::ranker::MatchResult;

/// Individual ranked declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchOutput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Match cost, lower is better
    pub cost: f64,
}

impl From<MatchResult> for MatchOutput {
    fn from(result: MatchResult) -> Self {
        Self {
            name: result.candidate.name,
            module: result.candidate.module,
            description: result.candidate.description,
            kind: result.candidate.kind,
            cost: result.cost,
        }
    }
}

/// Output from search_declarations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status")]
pub enum SearchDeclarationsOutput {
    /// Response to the session's latest query
    #[serde(rename = "ok")]
    Ok {
        sequence: u64,
        query: String,
        response: Vec<MatchOutput>,
        /// Number of matches before truncation
        total: usize,
    },
    /// A newer query on the same session replaced this one
    #[serde(rename = "superseded")]
    Superseded { sequence: u64 },
    #[serde(rename = "error")]
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

impl SearchDeclarationsOutput {
    /// Convert to JSON string for MCP response
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"status":"error","error":"Failed to serialize response"}"#.to_string())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SearchDeclarationsOutput::Ok { .. })
    }

    /// Names of the returned declarations, empty unless this is an `Ok`
    pub fn names(&self) -> Vec<&str> {
        match self {
            SearchDeclarationsOutput::Ok { response, .. } => {
                response.iter().map(|m| m.name.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<SearchResponse> for SearchDeclarationsOutput {
    fn from(response: SearchResponse) -> Self {
        SearchDeclarationsOutput::Ok {
            sequence: response.sequence,
            query: response.query,
            response: response.matches.into_iter().map(MatchOutput::from).collect(),
            total: response.total,
        }
    }
}

/// Output from suggest_declarations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status")]
pub enum SuggestDeclarationsOutput {
    #[serde(rename = "ok")]
    Ok {
        url: String,
        /// Query derived from the URL, absent if the URL has no path segment
        #[serde(skip_serializing_if = "Option::is_none")]
        query: Option<String>,
        suggestions: Vec<MatchOutput>,
    },
    #[serde(rename = "error")]
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

impl SuggestDeclarationsOutput {
    /// Convert to JSON string for MCP response
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"status":"error","error":"Failed to serialize response"}"#.to_string())
    }
}

/// Output from store_stats
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status")]
pub enum StoreStatsOutput {
    #[serde(rename = "ok")]
    Ok {
        source: String,
        backend: String,
        candidates: usize,
        kinds: Vec<String>,
        attributes: Vec<String>,
    },
    #[serde(rename = "error")]
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

impl StoreStatsOutput {
    /// Convert to JSON string for MCP response
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"status":"error","error":"Failed to serialize response"}"#.to_string())
    }
}
