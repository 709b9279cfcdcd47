//! Integration tests for decl-search
//!
//! These tests drive the MCP tool methods end to end over real candidate files:
//! - plain name lists and JSON records, optionally gzip-compressed
//! - per-session supersede behaviour
//! - source failures surfacing as error outputs

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use rmcp::handler::server::wrapper::Parameters;
use tempfile::TempDir;
use tokio::sync::Notify;

use decl_search::DeclSearchService;
use decl_search::query::QueryService;
use decl_search::search::outputs::{
    SearchDeclarationsOutput, StoreStatsOutput, SuggestDeclarationsOutput,
};
use decl_search::search::tools::{SearchDeclarationsParams, SuggestDeclarationsParams};
use decl_search::search::{Backend, FuzzyRanker, Query, Ranker, Ranking, SearchError};
use decl_search::store::{FileSource, NameStore, SourceFormat, StoreLoader};

const DECLARATIONS: &str = "Nat.add\nNat.mul\n\n  Int.add  \nNamespace.Method\nList.map\n";

const RECORDS: &str = r#"[
    {"name": "Nat.add", "module": "Init.Prelude", "kind": "def", "description": "Addition of natural numbers"},
    {"name": "Nat.add_comm", "module": "Init.Data.Nat", "kind": "theorem", "attributes": ["simp"]},
    {"name": "Int.add", "module": "Init.Data.Int", "kind": "def"},
    {"name": "List.map", "module": "Init.Data.List", "kind": "def", "description": "Apply a function to each element"}
]"#;

// Response validation helpers
fn parse_search_response(response: &str) -> Result<SearchDeclarationsOutput> {
    serde_json::from_str(response).map_err(|e| {
        anyhow::anyhow!(
            "Failed to parse search response: {}\nResponse: {}",
            e,
            response
        )
    })
}

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> Result<String> {
    let path = dir.path().join(name);
    std::fs::write(&path, contents)?;
    Ok(path.display().to_string())
}

/// Helper to create a service over a candidate file
fn create_test_service(path: &str, backend: Backend) -> DeclSearchService {
    let loader = StoreLoader::from_source(FileSource::new(path, SourceFormat::Auto));
    DeclSearchService::new(QueryService::new(loader, backend.ranker()))
}

fn search(query: &str, max_count: Option<i64>) -> Parameters<SearchDeclarationsParams> {
    Parameters(SearchDeclarationsParams {
        query: query.to_string(),
        max_count,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_search_name_list() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "decl.txt", DECLARATIONS.as_bytes())?;
    let service = create_test_service(&path, Backend::Fuzzy);

    let output = parse_search_response(&service.search_declarations(search("Nadd", Some(2))).await)?;
    assert_eq!(output.names(), vec!["Nat.add", "Int.add"]);

    let output = parse_search_response(&service.search_declarations(search("n.m", None)).await)?;
    match output {
        SearchDeclarationsOutput::Ok {
            sequence,
            response,
            total,
            ..
        } => {
            assert_eq!(sequence, 2);
            let names: Vec<_> = response.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names, vec!["Nat.mul", "Namespace.Method"]);
            assert_eq!(response[0].cost, 1.0);
            assert_eq!(response[1].cost, 2.625);
            assert_eq!(total, 2);
        }
        other => anyhow::bail!("unexpected output: {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_unlimited_and_zero_counts() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "decl.txt", DECLARATIONS.as_bytes())?;
    let service = create_test_service(&path, Backend::Fuzzy);

    let all = parse_search_response(&service.search_declarations(search("a", Some(-1))).await)?;
    assert_eq!(all.names().len(), 5);

    let none = parse_search_response(&service.search_declarations(search("a", Some(0))).await)?;
    match none {
        SearchDeclarationsOutput::Ok {
            response, total, ..
        } => {
            assert!(response.is_empty());
            assert_eq!(total, 5);
        }
        other => anyhow::bail!("unexpected output: {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_search_json_records_with_filters() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "searchable_data.json", RECORDS.as_bytes())?;
    let service = create_test_service(&path, Backend::Fuzzy);

    let params = Parameters(SearchDeclarationsParams {
        query: "Nadd".to_string(),
        kinds: Some(vec!["theorem".to_string()]),
        ..Default::default()
    });
    let output = parse_search_response(&service.search_declarations(params).await)?;
    assert_eq!(output.names(), vec!["Nat.add_comm"]);

    let json = service.search_declarations(search("Nat.add", Some(1))).await;
    assert!(json.contains(r#""module":"Init.Prelude""#));
    assert!(json.contains(r#""kind":"def""#));

    Ok(())
}

#[tokio::test]
async fn test_gzip_source() -> Result<()> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(RECORDS.as_bytes())?;
    let compressed = encoder.finish()?;

    let dir = TempDir::new()?;
    let path = write_file(&dir, "searchable_data.json.gz", &compressed)?;
    let service = create_test_service(&path, Backend::Fuzzy);

    let output: StoreStatsOutput = serde_json::from_str(&service.store_stats().await)?;
    match output {
        StoreStatsOutput::Ok {
            candidates,
            kinds,
            attributes,
            ..
        } => {
            assert_eq!(candidates, 4);
            assert_eq!(kinds, vec!["def", "theorem"]);
            assert_eq!(attributes, vec!["simp"]);
        }
        other => anyhow::bail!("unexpected output: {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_fulltext_backend() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "searchable_data.json", RECORDS.as_bytes())?;
    let service = create_test_service(&path, Backend::FullText);

    let output = parse_search_response(&service.search_declarations(search("element", None)).await)?;
    assert_eq!(output.names(), vec!["List.map"]);

    let stats: StoreStatsOutput = serde_json::from_str(&service.store_stats().await)?;
    assert!(matches!(stats, StoreStatsOutput::Ok { ref backend, .. } if backend == "fulltext"));

    Ok(())
}

#[tokio::test]
async fn test_missing_source_is_reported() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("missing.txt").display().to_string();
    let service = create_test_service(&path, Backend::Fuzzy);

    let output = parse_search_response(&service.search_declarations(search("add", None)).await)?;
    match output {
        SearchDeclarationsOutput::Error { error, kind } => {
            assert!(error.contains("missing.txt"));
            assert_eq!(kind.as_deref(), Some("source_unavailable"));
        }
        other => anyhow::bail!("unexpected output: {other:?}"),
    }

    // The failure is not cached: once the file exists the next search succeeds
    std::fs::write(&path, DECLARATIONS)?;
    let output = parse_search_response(&service.search_declarations(search("add", None)).await)?;
    assert!(output.is_ok());
    assert_eq!(output.names().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_empty_name_is_a_config_error() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "bad.json", br#"[{"name": "ok"}, {"name": ""}]"#)?;
    let service = create_test_service(&path, Backend::Fuzzy);

    let output: StoreStatsOutput = serde_json::from_str(&service.store_stats().await)?;
    assert!(matches!(
        output,
        StoreStatsOutput::Error { kind: Some(ref kind), .. } if kind == "config_error"
    ));

    Ok(())
}

#[tokio::test]
async fn test_suggestions_for_broken_link() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "decl.txt", DECLARATIONS.as_bytes())?;
    let service = create_test_service(&path, Backend::Fuzzy);

    let params = Parameters(SuggestDeclarationsParams {
        url: "https://example.org/docs/find/?pattern#List.mp".to_string(),
        max_count: None,
    });
    let output: SuggestDeclarationsOutput =
        serde_json::from_str(&service.suggest_declarations(params).await)?;
    assert!(matches!(output, SuggestDeclarationsOutput::Ok { .. }));

    let params = Parameters(SuggestDeclarationsParams {
        url: "https://example.org/docs/List.mp.html".to_string(),
        max_count: Some(1),
    });
    let output: SuggestDeclarationsOutput =
        serde_json::from_str(&service.suggest_declarations(params).await)?;
    match output {
        SuggestDeclarationsOutput::Ok { suggestions, .. } => {
            assert_eq!(suggestions.len(), 1);
            assert_eq!(suggestions[0].name, "List.map");
        }
        other => anyhow::bail!("unexpected output: {other:?}"),
    }

    Ok(())
}

/// Fuzzy ranker that signals when it starts on the one-character query, then stalls
struct StallingRanker {
    started: Arc<Notify>,
}

impl Ranker for StallingRanker {
    fn name(&self) -> &'static str {
        "stalling"
    }

    fn rank(&self, store: &Arc<NameStore>, query: &Query) -> Result<Ranking, SearchError> {
        if query.text == "N" {
            self.started.notify_one();
            std::thread::sleep(Duration::from_millis(300));
        }
        FuzzyRanker::new().rank(store, query)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_older_query_is_superseded_through_tools() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "decl.txt", DECLARATIONS.as_bytes())?;
    let loader = StoreLoader::from_source(FileSource::new(&path, SourceFormat::Lines));
    let started = Arc::new(Notify::new());
    let ranker = StallingRanker {
        started: started.clone(),
    };
    let service = DeclSearchService::new(QueryService::new(loader, Arc::new(ranker)));

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.search_declarations(search("N", None)).await })
    };
    // The first query holds sequence 1 once it is being ranked
    started.notified().await;
    let second = service.search_declarations(search("Nadd", None)).await;
    let first = first.await?;

    assert_eq!(first, r#"{"status":"superseded","sequence":1}"#);
    let second = parse_search_response(&second)?;
    assert_eq!(second.names(), vec!["Nat.add", "Int.add"]);

    Ok(())
}
