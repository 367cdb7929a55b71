use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Text of the assistant message every fresh conversation starts with.
pub const GREETING: &str = "Hello! I'm your research assistant. Ask me anything about the \
papers in the collection and I'll answer with references to the sources I used.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub sources: Option<Vec<PaperReference>>,
    pub follow_up_questions: Option<Vec<String>>,
    pub reasoning_steps: Option<Vec<String>>,
    #[serde(default)]
    pub guardrail_note: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text.into())
    }

    pub fn greeting() -> Self {
        Self::assistant(GREETING)
    }

    fn new(sender: Sender, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            sender,
            timestamp: Utc::now(),
            sources: None,
            follow_up_questions: None,
            reasoning_steps: None,
            guardrail_note: None,
        }
    }

    /// True for the canonical greeting, ignoring id and timestamp.
    pub fn is_greeting(&self) -> bool {
        self.sender == Sender::Assistant && self.text == GREETING && self.sources.is_none()
    }
}

/// Where a retrieved paper came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Vector,
    Fulltext,
    #[default]
    Hybrid,
}

impl SearchType {
    /// Maps the backend's engine names onto the three kinds the client shows.
    pub fn from_backend(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("faiss") | Some("pinecone") | Some("vector") => SearchType::Vector,
            Some("postgres") | Some("fulltext") => SearchType::Fulltext,
            _ => SearchType::Hybrid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Vector => "vector",
            SearchType::Fulltext => "fulltext",
            SearchType::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperReference {
    pub paper_id: String,
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub score: f32,
    pub search_type: SearchType,
    pub chunk_id: Option<String>,
    pub categories: Option<String>,
    pub pdf_path: Option<String>,
    pub text: Option<String>,
    pub text_length: Option<u64>,
    pub word_count: Option<u64>,
    pub full_text_preview: Option<String>,
}

/// Retrieval mode requested from the backend (`search_type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Postgres,
    #[default]
    Faiss,
    Pinecone,
    Both,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::Postgres => "postgres",
            SearchMode::Faiss => "faiss",
            SearchMode::Pinecone => "pinecone",
            SearchMode::Both => "both",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(SearchMode::Postgres),
            "faiss" => Ok(SearchMode::Faiss),
            "pinecone" => Ok(SearchMode::Pinecone),
            "both" => Ok(SearchMode::Both),
            other => Err(format!(
                "unknown search mode '{}' (expected postgres, faiss, pinecone or both)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Pdf,
}

impl ExportFormat {
    /// Path segment used by the export endpoint.
    pub fn as_path(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format '{}' (expected md or pdf)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendHealth {
    Checking,
    Online,
    Degraded,
    Offline,
}

impl fmt::Display for BackendHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendHealth::Checking => "checking",
            BackendHealth::Online => "online",
            BackendHealth::Degraded => "degraded",
            BackendHealth::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Snapshot of a conversation as the front end sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub id: Option<String>,
    pub messages: Vec<Message>,
}

/// A successful chat turn, already validated at the API boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response_text: String,
    pub conversation_id: Option<String>,
    pub sources: Vec<PaperReference>,
    pub follow_up_questions: Vec<String>,
    pub reasoning_steps: Vec<String>,
    /// Why the backend's guardrails replaced or flagged this answer.
    pub guardrail_note: Option<String>,
}

/// Downloaded export, ready for the caller to write somewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub filename: String,
}
