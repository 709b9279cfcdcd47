use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use tracing_subscriber::EnvFilter;

use decl_search::query::{QueryService, SearchOutcome};
use decl_search::search::outputs::SearchDeclarationsOutput;
use decl_search::search::{Backend, Filters, Query, ResultLimit};
use decl_search::service::DeclSearchService;
use decl_search::store::{SourceFormat, StoreLoader, source::source_for};

/// MCP server for incremental search over documentation declarations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Declaration list to search: a file path or an http(s) URL
    #[arg(long, env = "DECL_SEARCH_SOURCE")]
    source: String,

    /// Payload format of the source (auto picks by extension)
    #[arg(long, env = "DECL_SEARCH_FORMAT", default_value = "auto")]
    format: SourceFormat,

    /// Ranking backend
    #[arg(long, env = "DECL_SEARCH_BACKEND", value_enum, default_value_t = Backend::Fuzzy)]
    backend: Backend,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the search tools over MCP on stdio (default)
    Serve,
    /// Rank the declarations once and print the result as JSON
    Query {
        /// Partial declaration name
        text: String,
        /// Maximum number of results (default 20, negative for all)
        #[arg(long, allow_negative_numbers = true)]
        max_results: Option<i64>,
        /// Only return declarations of this kind (repeatable)
        #[arg(long = "kind")]
        kinds: Vec<String>,
        /// Only return declarations with this attribute (repeatable)
        #[arg(long = "attribute")]
        attributes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing to stderr to avoid conflicts with stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let source = source_for(&args.source, args.format)
        .with_context(|| format!("Failed to set up candidate source {}", args.source))?;
    let loader = StoreLoader::new(Arc::from(source));
    let query_service = QueryService::new(loader, args.backend.ranker());

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(query_service).await,
        Commands::Query {
            text,
            max_results,
            kinds,
            attributes,
        } => {
            let query = Query::new(text)
                .with_limit(ResultLimit::from_request(max_results))
                .with_filters(Filters {
                    kinds: kinds.into_iter().collect(),
                    attributes: attributes.into_iter().collect(),
                });
            run_query(query_service, query).await
        }
    }
}

async fn serve(query_service: QueryService) -> Result<()> {
    tracing::info!(
        "Starting declaration search server on stdio (source: {}, backend: {})",
        query_service.source_name(),
        query_service.ranker_name()
    );

    let service = DeclSearchService::new(query_service)
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })?;

    service.waiting().await?;
    Ok(())
}

async fn run_query(query_service: QueryService, query: Query) -> Result<()> {
    let output = match query_service.session().search(query).await? {
        SearchOutcome::Delivered(response) => SearchDeclarationsOutput::from(response),
        // A lone query on a fresh session is always the latest
        SearchOutcome::Superseded { sequence } => bail!("query {sequence} was superseded"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
