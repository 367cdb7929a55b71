pub mod conversation_state;
pub mod paper_selection;

use std::sync::Arc;

use crate::config::Config;
use crate::models::internal::{BackendHealth, ExportFormat, ExportPayload, PaperReference, SearchMode};
use crate::services::api_client::{ApiClient, ApiError, ChatBackend, FailureKind};
use conversation_state::{ChatEvent, ConversationState, Effect};
use paper_selection::PaperSelectionState;

/// Retrieval parameters sent with every chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatSettings {
    pub n_results: u32,
    pub search_mode: SearchMode,
    pub max_context_messages: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            n_results: 5,
            search_mode: SearchMode::Faiss,
            max_context_messages: 5,
        }
    }
}

impl From<&Config> for ChatSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            n_results: cfg.n_results,
            search_mode: cfg.search_mode,
            max_context_messages: cfg.max_context_messages,
        }
    }
}

/// Result of one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Empty input or a request already in flight; nothing happened.
    Rejected,
    Answered,
    Failed(FailureKind),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExportFailure {
    #[error("Start a conversation before exporting it")]
    NoConversation,
    #[error("{0}")]
    Unsupported(String),
    #[error("Export failed: {0}")]
    Failed(String),
}

/// Drives the conversation: user actions in, backend calls out.
pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    settings: ChatSettings,
    state: ConversationState,
    selection: PaperSelectionState,
    health: BackendHealth,
}

impl ChatController {
    pub fn new(backend: Arc<dyn ChatBackend>, settings: ChatSettings) -> Self {
        Self {
            backend,
            settings,
            state: ConversationState::new(),
            selection: PaperSelectionState::new(),
            health: BackendHealth::Checking,
        }
    }

    /// Controller talking HTTP to the backend named in `config`.
    pub fn from_config(config: &Config) -> Self {
        let client = ApiClient::new(config.api_base_url.clone());
        Self::new(Arc::new(client), ChatSettings::from(config))
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn selection(&self) -> &PaperSelectionState {
        &self.selection
    }

    pub fn health(&self) -> BackendHealth {
        self.health
    }

    pub fn settings(&self) -> ChatSettings {
        self.settings
    }

    /// Startup health check. Runs once; there is no periodic re-poll.
    pub async fn mount(&mut self) -> BackendHealth {
        self.health = self.backend.check_health().await;
        self.health
    }

    pub async fn on_send(&mut self, text: &str) -> TurnOutcome {
        let (query, conversation_id) = match self.state.apply(ChatEvent::Submit(text.to_string())) {
            Effect::SendChat {
                query,
                conversation_id,
            } => (query, conversation_id),
            Effect::None => return TurnOutcome::Rejected,
        };

        let request = ApiClient::chat_request(
            &query,
            conversation_id.as_deref(),
            self.settings.n_results,
            self.settings.search_mode,
            self.settings.max_context_messages,
        );

        match self.backend.send_chat(request).await {
            Ok(reply) => {
                tracing::debug!("Chat turn answered with {} sources", reply.sources.len());
                self.state.apply(ChatEvent::Success(reply));
                TurnOutcome::Answered
            }
            Err(e) => {
                let kind = e.kind();
                tracing::warn!("Chat turn failed ({:?}): {}", kind, e);
                self.state.apply(ChatEvent::Failure(kind));
                TurnOutcome::Failed(kind)
            }
        }
    }

    /// Replays a suggested question exactly as if it had been typed.
    pub async fn on_follow_up_click(&mut self, question: &str) -> TurnOutcome {
        self.on_send(question).await
    }

    pub async fn on_export(&self, format: ExportFormat) -> Result<ExportPayload, ExportFailure> {
        let conversation_id = self
            .state
            .conversation_id()
            .ok_or(ExportFailure::NoConversation)?
            .to_string();
        let title_hint = self.state.export_query().unwrap_or_default().to_string();

        match self
            .backend
            .export_conversation(conversation_id, format, title_hint)
            .await
        {
            Ok(payload) => Ok(payload),
            Err(ApiError::ExportUnsupported(detail)) => {
                tracing::info!("Backend cannot export {:?}: {}", format, detail);
                Err(ExportFailure::Unsupported(detail))
            }
            Err(e) => {
                tracing::warn!("Export failed: {}", e);
                Err(ExportFailure::Failed(e.to_string()))
            }
        }
    }

    /// Starts a new conversation.
    pub fn reset(&mut self) {
        self.state.apply(ChatEvent::Reset);
        self.selection.close();
    }

    /// Opens the detail view for the `index`th paper of the latest response.
    pub fn select_paper(&mut self, index: usize) -> Option<&PaperReference> {
        let paper = self.state.papers().get(index)?.clone();
        self.selection.select(paper);
        self.selection.selected()
    }

    pub fn close_paper(&mut self) {
        self.selection.close();
    }
}
