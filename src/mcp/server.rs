//! Notes MCP Server implementation

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::commands::open_service;
use notes_search::search::IndexState;
use notes_search::{NewNote, Note, NoteId, NoteService, SqliteNoteStore};

/// Parameters for notes_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Search query; matched literally and by meaning
    #[schemars(description = "Search query (keyword or natural language)")]
    pub query: String,
}

/// Parameters for notes_create tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateParams {
    #[schemars(description = "Note title")]
    pub title: String,
    #[schemars(description = "Note body")]
    #[serde(default)]
    pub content: String,
}

/// Parameters for tools addressing one note
#[derive(Debug, Deserialize, JsonSchema)]
pub struct NoteIdParams {
    #[schemars(description = "Note id")]
    pub id: i64,
}

/// Parameters for notes_index_status tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct IndexStatusParams {
    #[schemars(description = "Note id; omit for overall counters")]
    #[serde(default)]
    pub id: Option<i64>,
}

/// Search result for JSON output
#[derive(Debug, Serialize)]
struct SearchResultJson {
    id: NoteId,
    title: String,
    content: String,
    score: Option<f32>,
    keyword_match: bool,
}

/// Notes MCP Service
#[derive(Clone)]
pub struct NotesService {
    service: Arc<NoteService<SqliteNoteStore>>,
    owner: String,
    tool_router: ToolRouter<Self>,
}

fn internal(context: &str, e: impl std::fmt::Display) -> McpError {
    McpError::internal_error(format!("{}: {}", context, e), None)
}

fn to_json(value: &impl Serialize) -> Result<CallToolResult, McpError> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| internal("JSON serialization failed", e))?;
    Ok(CallToolResult::success(vec![Content::text(output)]))
}

impl NotesService {
    pub fn new(service: Arc<NoteService<SqliteNoteStore>>, owner: String) -> Self {
        Self {
            service,
            owner,
            tool_router: Self::tool_router(),
        }
    }

    /// The note, if it exists and belongs to this server's owner.
    fn owned_note(&self, id: i64) -> Result<Option<Note>, McpError> {
        let note = self
            .service
            .get_note(NoteId(id))
            .map_err(|e| internal("Failed to read note", e))?;
        Ok(note.filter(|n| n.owner == self.owner))
    }

    fn not_found(id: i64) -> CallToolResult {
        CallToolResult::success(vec![Content::text(format!("Note not found: {}", id))])
    }
}

#[tool_router]
impl NotesService {
    /// Search notes with keyword + semantic ranking
    #[tool(description = "Search your notes. Literal keyword matches are always returned; semantically similar notes are added and ranked by similarity.")]
    async fn notes_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .service
            .search(&self.owner, &params.0.query)
            .await
            .map_err(|e| internal("Search failed", e))?;

        let results: Vec<SearchResultJson> = outcome
            .hits
            .into_iter()
            .map(|h| SearchResultJson {
                id: h.candidate.id,
                title: h.candidate.title,
                content: h.candidate.content,
                score: h.score,
                keyword_match: h.keyword_match,
            })
            .collect();

        to_json(&serde_json::json!({
            "mode": outcome.mode,
            "results": results,
        }))
    }

    /// Save a new note
    #[tool(description = "Create a note. It becomes semantically searchable once its embedding finishes in the background.")]
    async fn notes_create(
        &self,
        params: Parameters<CreateParams>,
    ) -> Result<CallToolResult, McpError> {
        let CreateParams { title, content } = params.0;
        let note = self
            .service
            .create_note(NewNote::new(self.owner.clone(), title, content))
            .map_err(|e| internal("Failed to save note", e))?;

        to_json(&note)
    }

    /// List notes owned by this server's user
    #[tool(description = "List all of your notes.")]
    async fn notes_list(&self) -> Result<CallToolResult, McpError> {
        let notes = self
            .service
            .notes_for(&self.owner)
            .map_err(|e| internal("Failed to list notes", e))?;
        to_json(&notes)
    }

    /// Get full content of a specific note
    #[tool(description = "Get a note by id.")]
    async fn notes_get(
        &self,
        params: Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.owned_note(params.0.id)? {
            Some(note) => to_json(&note),
            None => Ok(Self::not_found(params.0.id)),
        }
    }

    /// Delete a note and its embedding
    #[tool(description = "Delete a note by id.")]
    async fn notes_delete(
        &self,
        params: Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = params.0.id;
        if self.owned_note(id)?.is_none() {
            return Ok(Self::not_found(id));
        }

        self.service
            .delete_note(NoteId(id))
            .map_err(|e| internal("Failed to delete note", e))?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Deleted note {}",
            id
        ))]))
    }

    /// Embedding status
    #[tool(description = "Report whether a note has an embedding (indexed, pending, unindexed), or overall index counters when no id is given.")]
    async fn notes_index_status(
        &self,
        params: Parameters<IndexStatusParams>,
    ) -> Result<CallToolResult, McpError> {
        if let Some(id) = params.0.id {
            if self.owned_note(id)?.is_none() {
                return Ok(Self::not_found(id));
            }
            let state: IndexState = self.service.index_state(NoteId(id));
            return to_json(&serde_json::json!({ "id": id, "state": state }));
        }

        let backfill = self.service.backfill_stats();
        to_json(&serde_json::json!({
            "indexed": self.service.indexed_count(),
            "backfill": {
                "indexed": backfill.indexed,
                "failed": backfill.failed,
                "duration_ms": backfill.duration_ms,
            },
            "background": self.service.counters(),
        }))
    }
}

#[tool_handler]
impl ServerHandler for NotesService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Personal notes MCP Server. Provides hybrid keyword + semantic search and note management.".to_string()
            ),
            ..Default::default()
        }
    }
}

/// Run the MCP server
pub async fn run_mcp_server(owner: String) -> Result<()> {
    use tokio::io::{stdin, stdout};

    let notes = Arc::new(open_service().await?);
    let service = NotesService::new(Arc::clone(&notes), owner);
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    notes.shutdown().await;
    Ok(())
}
