use paperchat::api::dto::{parse_sources, ChatRequest, ChatResponse, SourceDto};
use paperchat::models::internal::{ExportFormat, PaperReference, SearchMode, SearchType};
use serde_json::json;

fn source(value: serde_json::Value) -> SourceDto {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_chat_request_wire_shape() {
    let request = ChatRequest {
        query: "q".to_string(),
        conversation_id: None,
        n_results: 5,
        search_type: SearchMode::Pinecone.as_str().to_string(),
        max_context_messages: 5,
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "query": "q",
            "conversation_id": null,
            "n_results": 5,
            "search_type": "pinecone",
            "max_context_messages": 5
        })
    );
}

#[test]
fn test_source_optional_fields_default() {
    let paper = PaperReference::try_from(source(json!({
        "paper_id": "2401.00001",
        "title": "A title",
        "authors": null,
        "score": 0.42,
        "search_type": "pinecone",
        "chunk_id": "2401.00001_3",
        "word_count": 5000
    })))
    .unwrap();

    assert_eq!(paper.authors, "");
    assert_eq!(paper.abstract_text, "");
    assert_eq!(paper.search_type, SearchType::Vector);
    assert_eq!(paper.chunk_id.as_deref(), Some("2401.00001_3"));
    assert_eq!(paper.word_count, Some(5000));
    assert_eq!(paper.pdf_path, None);
}

#[test]
fn test_source_score_clamped() {
    let low = PaperReference::try_from(source(json!({"paper_id": "a", "score": -0.3}))).unwrap();
    let high = PaperReference::try_from(source(json!({"paper_id": "b", "score": 3.0}))).unwrap();
    assert_eq!(low.score, 0.0);
    assert_eq!(high.score, 1.0);
}

#[test]
fn test_source_blank_paper_id_rejected() {
    assert!(PaperReference::try_from(source(json!({"paper_id": "  "}))).is_err());
    assert!(parse_sources(vec![
        source(json!({"paper_id": "ok"})),
        source(json!({"title": "missing id"})),
    ])
    .is_err());
}

#[test]
fn test_search_type_mapping() {
    assert_eq!(SearchType::from_backend(Some("faiss")), SearchType::Vector);
    assert_eq!(SearchType::from_backend(Some("Vector")), SearchType::Vector);
    assert_eq!(SearchType::from_backend(Some("postgres")), SearchType::Fulltext);
    assert_eq!(SearchType::from_backend(Some("fulltext")), SearchType::Fulltext);
    assert_eq!(SearchType::from_backend(Some("both")), SearchType::Hybrid);
    assert_eq!(SearchType::from_backend(None), SearchType::Hybrid);
}

#[test]
fn test_chat_response_without_sources_gives_empty_set() {
    let response: ChatResponse = serde_json::from_value(json!({
        "response": "No papers matched.",
        "conversation_id": "abc"
    }))
    .unwrap();
    let reply = response.into_reply().unwrap();
    assert!(reply.sources.is_empty());
    assert!(reply.follow_up_questions.is_empty());
}

#[test]
fn test_chat_response_empty_id_is_treated_as_absent() {
    let response: ChatResponse = serde_json::from_value(json!({
        "response": "hi",
        "conversation_id": "",
        "sources": []
    }))
    .unwrap();
    assert_eq!(response.into_reply().unwrap().conversation_id, None);
}

#[test]
fn test_chat_response_guardrail_note() {
    let response: ChatResponse = serde_json::from_value(json!({
        "response": "I can only answer astronomy questions.",
        "conversation_id": "abc",
        "sources": [],
        "guardrails_triggered": true,
        "validation_reason": "Query is not astronomy-related"
    }))
    .unwrap();
    assert_eq!(
        response.into_reply().unwrap().guardrail_note.as_deref(),
        Some("Query is not astronomy-related")
    );

    let response: ChatResponse = serde_json::from_value(json!({
        "response": "Grounded answer",
        "guardrails_triggered": false,
        "validation_reason": "Response properly grounded"
    }))
    .unwrap();
    assert_eq!(response.into_reply().unwrap().guardrail_note, None);
}

#[test]
fn test_search_mode_and_export_format_parsing() {
    assert_eq!("BOTH".parse::<SearchMode>().unwrap(), SearchMode::Both);
    assert!("hybrid".parse::<SearchMode>().is_err());
    assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
    assert_eq!("markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
    assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
    assert!("docx".parse::<ExportFormat>().is_err());
}
