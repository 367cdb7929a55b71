use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::*;
use paperchat::api::dto::ChatRequest;
use paperchat::models::internal::{
    BackendHealth, ChatReply, ExportFormat, ExportPayload, PaperReference, SearchMode, SearchType,
};
use paperchat::orchestrator::{ChatController, ChatSettings, ExportFailure, TurnOutcome};
use paperchat::services::api_client::{ApiError, ChatBackend, FailureKind};
use std::sync::Arc;

// Manually define the mock since automock doesn't work for integration tests
mock! {
    pub Backend {}

    #[async_trait]
    impl ChatBackend for Backend {
        async fn check_health(&self) -> BackendHealth;
        async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ApiError>;
        async fn export_conversation(
            &self,
            conversation_id: String,
            format: ExportFormat,
            title_hint: String,
        ) -> Result<ExportPayload, ApiError>;
    }
}

fn paper(id: &str) -> PaperReference {
    PaperReference {
        paper_id: id.to_string(),
        title: format!("Paper {}", id),
        authors: "Someone".to_string(),
        abstract_text: "Abstract".to_string(),
        score: 0.9,
        search_type: SearchType::Vector,
        chunk_id: None,
        categories: None,
        pdf_path: None,
        text: None,
        text_length: None,
        word_count: None,
        full_text_preview: None,
    }
}

fn reply(id: Option<&str>, sources: Vec<PaperReference>) -> ChatReply {
    ChatReply {
        response_text: "answer".to_string(),
        conversation_id: id.map(|s| s.to_string()),
        sources,
        follow_up_questions: vec!["Why?".to_string()],
        reasoning_steps: vec![],
        guardrail_note: None,
    }
}

fn controller(backend: MockBackend) -> ChatController {
    ChatController::new(Arc::new(backend), ChatSettings::default())
}

#[tokio::test]
async fn test_mount_checks_health_once() {
    let mut backend = MockBackend::new();
    backend
        .expect_check_health()
        .times(1)
        .returning(|| BackendHealth::Degraded);

    let mut controller = controller(backend);
    assert_eq!(controller.health(), BackendHealth::Checking);
    assert_eq!(controller.mount().await, BackendHealth::Degraded);
    assert_eq!(controller.health(), BackendHealth::Degraded);
}

#[tokio::test]
async fn test_empty_send_never_hits_network() {
    let mut backend = MockBackend::new();
    backend.expect_send_chat().times(0);

    let mut controller = controller(backend);
    assert_eq!(controller.on_send("   ").await, TurnOutcome::Rejected);
    assert_eq!(controller.state().messages().len(), 1);
}

#[tokio::test]
async fn test_send_uses_settings_and_binds_id() {
    let mut backend = MockBackend::new();
    backend
        .expect_send_chat()
        .withf(|req: &ChatRequest| {
            req.query == "Tell me about exoplanets"
                && req.conversation_id.is_none()
                && req.n_results == 8
                && req.search_type == "both"
                && req.max_context_messages == 3
        })
        .times(1)
        .returning(|_| Ok(reply(Some("abc123"), vec![paper("P1")])));

    let settings = ChatSettings {
        n_results: 8,
        search_mode: SearchMode::Both,
        max_context_messages: 3,
    };
    let mut controller = ChatController::new(Arc::new(backend), settings);

    let outcome = controller.on_send("Tell me about exoplanets").await;
    assert_eq!(outcome, TurnOutcome::Answered);
    assert_eq!(controller.state().conversation_id(), Some("abc123"));
    assert_eq!(controller.state().messages().len(), 3);
    assert_eq!(controller.state().papers()[0].paper_id, "P1");
    assert!(!controller.state().is_loading());
}

#[tokio::test]
async fn test_second_turn_sends_bound_id() {
    let mut backend = MockBackend::new();
    let mut seq = mockall::Sequence::new();
    backend
        .expect_send_chat()
        .withf(|req: &ChatRequest| req.conversation_id.is_none())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(reply(Some("abc123"), vec![])));
    backend
        .expect_send_chat()
        .withf(|req: &ChatRequest| req.conversation_id.as_deref() == Some("abc123"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(reply(Some("different"), vec![])));

    let mut controller = controller(backend);
    controller.on_send("one").await;
    controller.on_send("two").await;
    assert_eq!(controller.state().conversation_id(), Some("abc123"));
}

#[tokio::test]
async fn test_failure_is_absorbed_into_conversation() {
    let mut backend = MockBackend::new();
    backend.expect_send_chat().times(1).returning(|_| {
        Err(ApiError::ServiceUnavailable {
            status: 500,
            message: "boom".to_string(),
        })
    });

    let mut controller = controller(backend);
    let outcome = controller.on_send("hello").await;

    assert_eq!(outcome, TurnOutcome::Failed(FailureKind::ServiceUnavailable));
    let last = controller.state().messages().last().unwrap();
    assert_eq!(last.text, FailureKind::ServiceUnavailable.message());
    assert_eq!(controller.state().conversation_id(), None);
    assert!(controller.state().papers().is_empty());
}

#[tokio::test]
async fn test_follow_up_click_behaves_like_send() {
    let mut backend = MockBackend::new();
    backend
        .expect_send_chat()
        .withf(|req: &ChatRequest| req.query == "Why?")
        .times(1)
        .returning(|_| Ok(reply(Some("abc"), vec![])));

    let mut controller = controller(backend);
    assert_eq!(controller.on_follow_up_click("Why?").await, TurnOutcome::Answered);
    assert_eq!(controller.state().messages()[1].text, "Why?");
}

#[tokio::test]
async fn test_export_requires_conversation() {
    let mut backend = MockBackend::new();
    backend.expect_export_conversation().times(0);

    let controller = controller(backend);
    assert_eq!(
        controller.on_export(ExportFormat::Markdown).await,
        Err(ExportFailure::NoConversation)
    );
}

#[tokio::test]
async fn test_export_success_passes_id_and_title_hint() {
    let mut backend = MockBackend::new();
    let mut seq = mockall::Sequence::new();
    backend
        .expect_send_chat()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(reply(Some("c1"), vec![paper("P1")])));
    backend
        .expect_send_chat()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(reply(None, vec![paper("P2")])));
    backend
        .expect_export_conversation()
        .with(
            eq("c1".to_string()),
            eq(ExportFormat::Markdown),
            eq("Tell me about exoplanets".to_string()),
        )
        .times(1)
        .returning(|_, _, _| {
            Ok(ExportPayload {
                bytes: b"# Report".to_vec(),
                filename: "research_report_c1.md".to_string(),
            })
        });

    let mut controller = controller(backend);
    controller.on_send("What is dark matter?").await;
    controller.on_send("Tell me about exoplanets").await;
    let history_len = controller.state().messages().len();

    let payload = controller.on_export(ExportFormat::Markdown).await.unwrap();
    assert_eq!(payload.filename, "research_report_c1.md");
    assert_eq!(controller.state().messages().len(), history_len);
}

#[tokio::test]
async fn test_export_unsupported_carries_detail() {
    let mut backend = MockBackend::new();
    backend
        .expect_send_chat()
        .returning(|_| Ok(reply(Some("abc"), vec![])));
    backend
        .expect_export_conversation()
        .returning(|_, _, _| Err(ApiError::ExportUnsupported("Use Markdown".to_string())));

    let mut controller = controller(backend);
    controller.on_send("q").await;
    assert_eq!(
        controller.on_export(ExportFormat::Pdf).await,
        Err(ExportFailure::Unsupported("Use Markdown".to_string()))
    );
}

#[tokio::test]
async fn test_export_other_error_is_generic() {
    let mut backend = MockBackend::new();
    backend
        .expect_send_chat()
        .returning(|_| Ok(reply(Some("abc"), vec![])));
    backend.expect_export_conversation().returning(|_, _, _| {
        Err(ApiError::EndpointMissing("/api/v1/chat/export/pdf".to_string()))
    });

    let mut controller = controller(backend);
    controller.on_send("q").await;
    assert!(matches!(
        controller.on_export(ExportFormat::Pdf).await,
        Err(ExportFailure::Failed(_))
    ));
}

#[tokio::test]
async fn test_select_and_close_paper() {
    let mut backend = MockBackend::new();
    backend
        .expect_send_chat()
        .returning(|_| Ok(reply(Some("abc"), vec![paper("P1"), paper("P2")])));

    let mut controller = controller(backend);
    controller.on_send("q").await;

    assert_eq!(controller.select_paper(1).map(|p| p.paper_id.clone()), Some("P2".to_string()));
    assert!(controller.selection().is_visible());

    assert!(controller.select_paper(5).is_none());
    assert_eq!(controller.selection().selected().unwrap().paper_id, "P2");

    controller.close_paper();
    assert!(!controller.selection().is_visible());
    assert!(controller.selection().selected().is_none());
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let mut backend = MockBackend::new();
    backend
        .expect_send_chat()
        .returning(|_| Ok(reply(Some("abc"), vec![paper("P1")])));

    let mut controller = controller(backend);
    controller.on_send("q").await;
    controller.select_paper(0);

    controller.reset();

    assert_eq!(controller.state().messages().len(), 1);
    assert!(controller.state().messages()[0].is_greeting());
    assert_eq!(controller.state().conversation_id(), None);
    assert!(controller.state().papers().is_empty());
    assert!(controller.selection().selected().is_none());
    assert!(!controller.selection().is_visible());
}
