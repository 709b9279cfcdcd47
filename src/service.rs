use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::query::QueryService;
use crate::search::tools::{SearchDeclarationsParams, SearchTools, SuggestDeclarationsParams};

#[derive(Debug, Clone)]
pub struct DeclSearchService {
    search_tools: SearchTools,
    tool_router: ToolRouter<Self>,
}

impl DeclSearchService {
    pub fn new(query_service: QueryService) -> Self {
        Self {
            search_tools: SearchTools::new(query_service),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl DeclSearchService {
    #[tool(
        description = "Rank declaration names against a partial name, the way a documentation search box does while the user types. Characters of the query must appear in order in the name; jumping across '.' or '_' separators is cheap, so 'Nadd' finds 'Nat.add' and 'n.m' finds 'Namespace.Method'. Results are ordered by ascending cost and capped at max_count (default 20). Optionally restrict by declaration kinds and attributes. Pass a session name when issuing a stream of queries: only the newest query of a session gets results, older ones come back with status 'superseded'."
    )]
    pub async fn search_declarations(&self, params: Parameters<SearchDeclarationsParams>) -> String {
        self.search_tools.search_declarations(params.0).await
    }

    #[tool(
        description = "Suggest declarations for a documentation URL that did not resolve. The last path segment of the URL (without '.html') is used as the query. Use this to recover from broken links to renamed or moved declarations."
    )]
    pub async fn suggest_declarations(
        &self,
        params: Parameters<SuggestDeclarationsParams>,
    ) -> String {
        self.search_tools.suggest_declarations(params.0).await
    }

    #[tool(
        description = "Report the loaded declaration store: its source, the ranking backend, the number of declarations, and the distinct kinds and attributes usable as search filters."
    )]
    pub async fn store_stats(&self) -> String {
        self.search_tools.store_stats().await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for DeclSearchService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "decl-search".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            capabilities: ServerCapabilities {
                tools: Some(Default::default()),
                ..Default::default()
            },
            instructions: Some(
                "MCP server for incremental search over the declarations of a generated documentation site. Use search_declarations with the partial name typed so far; abbreviations across namespace separators work well (e.g. 'Nadd' for 'Nat.add'). Use store_stats to discover the kinds and attributes available as filters. Use suggest_declarations to find the intended declaration behind a broken documentation link.".to_string(),
            ),
            ..Default::default()
        }
    }
}
