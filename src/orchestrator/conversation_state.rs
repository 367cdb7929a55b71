//! Conversation state machine.
//!
//! All mutation goes through [`transition`], a pure function from the current
//! state and one event to the next state plus the effect the caller must run.

use crate::models::internal::{ChatReply, Conversation, Message, PaperReference, Sender};
use crate::services::api_client::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Submit(String),
    Success(ChatReply),
    Failure(FailureKind),
    Reset,
}

/// Work the caller owes the state machine after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    SendChat {
        query: String,
        conversation_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    conversation_id: Option<String>,
    messages: Vec<Message>,
    papers: Vec<PaperReference>,
    phase: Phase,
    last_error: Option<FailureKind>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            conversation_id: None,
            messages: vec![Message::greeting()],
            papers: Vec::new(),
            phase: Phase::Idle,
            last_error: None,
        }
    }

    /// Stand-in left behind while `apply` moves the real state through
    /// `transition`. Allocates nothing.
    fn vacant() -> Self {
        Self {
            conversation_id: None,
            messages: Vec::new(),
            papers: Vec::new(),
            phase: Phase::Idle,
            last_error: None,
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Papers from the most recent successful response.
    pub fn papers(&self) -> &[PaperReference] {
        &self.papers
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::AwaitingResponse
    }

    /// Failure absorbed by the last completed turn, if it failed.
    pub fn last_error(&self) -> Option<FailureKind> {
        self.last_error
    }

    /// Question behind the latest answer that cited sources.
    ///
    /// The backend exports that answer and labels the report with this text.
    /// Without a sourced answer, falls back to the latest user message.
    pub fn export_query(&self) -> Option<&str> {
        let cutoff = self
            .messages
            .iter()
            .rposition(|m| {
                m.sender == Sender::Assistant && m.sources.as_ref().is_some_and(|s| !s.is_empty())
            })
            .unwrap_or(self.messages.len());
        self.messages[..cutoff]
            .iter()
            .rev()
            .find(|m| m.sender == Sender::User)
            .map(|m| m.text.as_str())
    }

    /// Follow-up questions attached to the latest assistant message.
    pub fn latest_follow_ups(&self) -> &[String] {
        self.messages
            .last()
            .and_then(|m| m.follow_up_questions.as_deref())
            .unwrap_or(&[])
    }

    pub fn snapshot(&self) -> Conversation {
        Conversation {
            id: self.conversation_id.clone(),
            messages: self.messages.clone(),
        }
    }

    /// Applies `event` in place and returns the resulting effect.
    pub fn apply(&mut self, event: ChatEvent) -> Effect {
        let (next, effect) = transition(std::mem::replace(self, Self::vacant()), event);
        *self = next;
        effect
    }
}

pub fn transition(mut state: ConversationState, event: ChatEvent) -> (ConversationState, Effect) {
    match (state.phase, event) {
        (_, ChatEvent::Reset) => (ConversationState::new(), Effect::None),

        (Phase::Idle, ChatEvent::Submit(text)) => {
            let query = text.trim();
            if query.is_empty() {
                return (state, Effect::None);
            }
            let query = query.to_string();
            state.messages.push(Message::user(query.clone()));
            state.phase = Phase::AwaitingResponse;
            state.last_error = None;
            let effect = Effect::SendChat {
                query,
                conversation_id: state.conversation_id.clone(),
            };
            (state, effect)
        }
        (Phase::AwaitingResponse, ChatEvent::Submit(_)) => (state, Effect::None),

        (Phase::AwaitingResponse, ChatEvent::Success(reply)) => {
            if state.conversation_id.is_none() {
                state.conversation_id = reply.conversation_id;
            }
            let mut message = Message::assistant(reply.response_text);
            message.sources = Some(reply.sources.clone());
            message.follow_up_questions = non_empty(reply.follow_up_questions);
            message.reasoning_steps = non_empty(reply.reasoning_steps);
            message.guardrail_note = reply.guardrail_note;
            state.messages.push(message);
            state.papers = reply.sources;
            state.phase = Phase::Idle;
            (state, Effect::None)
        }
        (Phase::AwaitingResponse, ChatEvent::Failure(kind)) => {
            state.messages.push(Message::assistant(kind.message()));
            state.last_error = Some(kind);
            state.phase = Phase::Idle;
            (state, Effect::None)
        }

        // Completions with nothing in flight are stale.
        (Phase::Idle, ChatEvent::Success(_)) | (Phase::Idle, ChatEvent::Failure(_)) => {
            (state, Effect::None)
        }
    }
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
