//! Paperchat - terminal client for a research-paper RAG chat service

pub mod api;
pub mod config;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod repl;
pub mod services;

// Re-export main types for convenience
pub use crate::config::Config;
pub use crate::models::internal::{
    BackendHealth, ChatReply, ExportFormat, ExportPayload, Message, PaperReference, SearchMode,
};
pub use crate::orchestrator::conversation_state::{transition, ChatEvent, ConversationState};
pub use crate::orchestrator::{ChatController, ChatSettings, ExportFailure, TurnOutcome};
pub use crate::services::api_client::{ApiClient, ApiError, ChatBackend, FailureKind};
