use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::internal::{ChatReply, PaperReference, SearchType};

// ==================== REQUEST DTOs ====================

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub query: String,
    pub conversation_id: Option<String>,
    pub n_results: u32,
    pub search_type: String,
    pub max_context_messages: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ExportRequest {
    pub conversation_id: String,
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub n_results: u32,
    pub search_type: String,
}

// ==================== RESPONSE DTOs ====================

/// One search hit as the backend serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDto {
    pub paper_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub chunk_id: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub pdf_path: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub text_length: Option<u64>,
    #[serde(default)]
    pub word_count: Option<u64>,
    #[serde(default)]
    pub full_text_preview: Option<String>,
}

impl TryFrom<SourceDto> for PaperReference {
    type Error = String;

    fn try_from(dto: SourceDto) -> Result<Self, Self::Error> {
        let paper_id = dto
            .paper_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| "source without paper_id".to_string())?;

        let score = dto.score.unwrap_or(0.0);
        if !score.is_finite() {
            return Err(format!("source {} has a non-finite score", paper_id));
        }

        Ok(PaperReference {
            paper_id,
            title: dto.title.unwrap_or_default(),
            authors: dto.authors.unwrap_or_default(),
            abstract_text: dto.abstract_text.unwrap_or_default(),
            score: score.clamp(0.0, 1.0) as f32,
            search_type: SearchType::from_backend(dto.search_type.as_deref()),
            chunk_id: dto.chunk_id,
            categories: dto.categories,
            pdf_path: dto.pdf_path,
            text: dto.text,
            text_length: dto.text_length,
            word_count: dto.word_count,
            full_text_preview: dto.full_text_preview,
        })
    }
}

/// Converts a list of wire sources, failing on the first malformed entry.
pub fn parse_sources(sources: Vec<SourceDto>) -> Result<Vec<PaperReference>, String> {
    sources.into_iter().map(PaperReference::try_from).collect()
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<SourceDto>>,
    #[serde(default)]
    pub follow_up_questions: Option<Vec<String>>,
    #[serde(default)]
    pub reasoning_steps: Option<Vec<String>>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub search_results_count: Option<u32>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
    /// Set when the backend answered with its out-of-scope or ungrounded fallback.
    #[serde(default)]
    pub guardrails_triggered: bool,
    #[serde(default)]
    pub validation_reason: Option<String>,
}

impl ChatResponse {
    pub fn into_reply(self) -> Result<ChatReply, String> {
        let sources = parse_sources(self.sources.unwrap_or_default())?;
        Ok(ChatReply {
            response_text: self.response,
            conversation_id: self.conversation_id.filter(|id| !id.is_empty()),
            sources,
            follow_up_questions: self.follow_up_questions.unwrap_or_default(),
            reasoning_steps: self.reasoning_steps.unwrap_or_default(),
            guardrail_note: self
                .guardrails_triggered
                .then(|| self.validation_reason.unwrap_or_default()),
        })
    }
}

/// Body of `GET /api/v1/chat/health`; only the top-level flag is read.
#[derive(Debug, Deserialize)]
pub struct RagHealthResponse {
    #[serde(default)]
    pub rag_service: Option<String>,
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryMessageDto {
    #[serde(default)]
    pub id: Option<i64>,
    pub conversation_id: String,
    pub message_type: String,
    pub content: String,
    #[serde(default)]
    pub sources: Option<Vec<Value>>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub messages: Vec<HistoryMessageDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConversationStats {
    #[serde(default)]
    pub message_count: Option<i64>,
    #[serde(default)]
    pub user_messages: Option<i64>,
    #[serde(default)]
    pub assistant_messages: Option<i64>,
    #[serde(default)]
    pub total_tokens: Option<i64>,
    #[serde(default)]
    pub first_message: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsResponse {
    pub conversation_id: String,
    #[serde(default)]
    pub stats: ConversationStats,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseStats {
    pub total_papers: u64,
    pub papers_with_full_text: u64,
    pub average_text_length: u64,
    #[serde(default)]
    pub top_categories: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ExportEntry {
    pub filename: String,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportListResponse {
    #[serde(default)]
    pub exports: Vec<ExportEntry>,
}
