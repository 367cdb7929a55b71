//! Plain-text views for the terminal front end.

use std::fmt::Write;

use crate::api::dto::{ConversationStats, DatabaseStats, ExportEntry, HistoryMessageDto};
use crate::models::internal::{BackendHealth, Message, PaperReference, Sender};

const ABSTRACT_PREVIEW_CHARS: usize = 300;

pub fn health_line(health: BackendHealth) -> String {
    let hint = match health {
        BackendHealth::Checking => "checking backend...",
        BackendHealth::Online => "backend online",
        BackendHealth::Degraded => "backend reachable, RAG service degraded",
        BackendHealth::Offline => "backend offline",
    };
    format!("[{}] {}", health, hint)
}

pub fn message(msg: &Message) -> String {
    let who = match msg.sender {
        Sender::User => "you",
        Sender::Assistant => "assistant",
    };
    let mut out = format!("{} ({}):\n{}\n", who, msg.timestamp.format("%H:%M"), msg.text);

    if let Some(note) = msg.guardrail_note.as_deref() {
        if note.is_empty() {
            out.push_str("\nNote: the backend flagged this answer as outside its sources.\n");
        } else {
            let _ = writeln!(out, "\nNote: the backend flagged this answer: {}", note);
        }
    }

    if let Some(steps) = msg.reasoning_steps.as_deref() {
        out.push_str("\nReasoning:\n");
        for step in steps {
            let _ = writeln!(out, "  - {}", step);
        }
    }
    if let Some(sources) = msg.sources.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "\n{} source(s), /sources to list them", sources.len());
    }
    if let Some(questions) = msg.follow_up_questions.as_deref() {
        out.push_str("\nFollow-up questions:\n");
        for (i, q) in questions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, q);
        }
    }
    out
}

/// Numbered list of papers, 1-based to match `/paper N`.
pub fn paper_list(papers: &[PaperReference]) -> String {
    if papers.is_empty() {
        return "No papers for the latest answer.\n".to_string();
    }
    let mut out = String::new();
    for (i, paper) in papers.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {} ({:.0}% {}) [{}]",
            i + 1,
            paper.title,
            paper.score * 100.0,
            paper.search_type.as_str(),
            paper.paper_id
        );
        if !paper.authors.is_empty() {
            let _ = writeln!(out, "    {}", paper.authors);
        }
    }
    out
}

pub fn paper_detail(paper: &PaperReference) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", paper.title);
    let _ = writeln!(out, "{}", "=".repeat(paper.title.chars().count().min(80)));
    let _ = writeln!(out, "ID:        {}", paper.paper_id);
    if !paper.authors.is_empty() {
        let _ = writeln!(out, "Authors:   {}", paper.authors);
    }
    let _ = writeln!(
        out,
        "Relevance: {:.1}% ({})",
        paper.score * 100.0,
        paper.search_type.as_str()
    );
    if let Some(categories) = &paper.categories {
        let _ = writeln!(out, "Category:  {}", categories);
    }
    if let Some(words) = paper.word_count {
        let _ = writeln!(out, "Words:     {}", words);
    }
    if let Some(pdf) = &paper.pdf_path {
        let _ = writeln!(out, "PDF:       {}", pdf);
    }
    if !paper.abstract_text.is_empty() {
        let _ = writeln!(out, "\nAbstract:\n{}", paper.abstract_text);
    }
    if let Some(preview) = paper.full_text_preview.as_deref().or(paper.text.as_deref()) {
        let _ = writeln!(out, "\nExcerpt:\n{}", truncate(preview, ABSTRACT_PREVIEW_CHARS));
    }
    out
}

pub fn history(messages: &[HistoryMessageDto]) -> String {
    let mut out = String::new();
    for msg in messages {
        let _ = writeln!(
            out,
            "[{}] {}: {}",
            msg.timestamp.as_deref().unwrap_or("-"),
            msg.message_type,
            msg.content
        );
    }
    out
}

pub fn conversation_stats(stats: &ConversationStats) -> String {
    let n = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "messages: {} (user {}, assistant {})\ntokens:   {}\nfirst:    {}\nlast:     {}\n",
        n(stats.message_count),
        n(stats.user_messages),
        n(stats.assistant_messages),
        n(stats.total_tokens),
        stats.first_message.as_deref().unwrap_or("-"),
        stats.last_message.as_deref().unwrap_or("-"),
    )
}

pub fn database_stats(stats: &DatabaseStats) -> String {
    format!(
        "papers:              {}\nwith full text:      {}\naverage text length: {}\n",
        stats.total_papers, stats.papers_with_full_text, stats.average_text_length
    )
}

pub fn export_list(exports: &[ExportEntry]) -> String {
    if exports.is_empty() {
        return "No exports on the server.\n".to_string();
    }
    let mut out = String::new();
    for entry in exports {
        let _ = writeln!(
            out,
            "{:<48} {:>10} B  {}",
            entry.filename,
            entry.size,
            entry.created.as_deref().unwrap_or("")
        );
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
