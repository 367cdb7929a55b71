//! Interactive chat loop.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::models::internal::{ExportFormat, ExportPayload};
use crate::orchestrator::{ChatController, ExportFailure, TurnOutcome};
use crate::render;

pub const HELP: &str = "\
Type a question to ask about the papers. Commands:
  /new            start a new conversation
  /sources        list papers behind the latest answer
  /paper N        show details for paper N
  /close          close the paper detail view
  /follow N       ask suggested follow-up question N
  /export md|pdf  download the conversation report
  /help           show this help
  /quit           leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    New,
    Sources,
    Paper(usize),
    Close,
    Follow(usize),
    Export(ExportFormat),
    Help,
    Quit,
    Invalid(String),
}

/// Parses one input line; blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(ReplCommand::Ask(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let command = match (name, arg) {
        ("new", _) => ReplCommand::New,
        ("sources", _) => ReplCommand::Sources,
        ("close", _) => ReplCommand::Close,
        ("help", _) => ReplCommand::Help,
        ("quit", _) | ("exit", _) => ReplCommand::Quit,
        ("paper", Some(n)) => match parse_index(n) {
            Some(i) => ReplCommand::Paper(i),
            None => ReplCommand::Invalid(format!("not a paper number: {}", n)),
        },
        ("follow", Some(n)) => match parse_index(n) {
            Some(i) => ReplCommand::Follow(i),
            None => ReplCommand::Invalid(format!("not a question number: {}", n)),
        },
        ("export", Some(fmt)) => match fmt.parse() {
            Ok(format) => ReplCommand::Export(format),
            Err(e) => ReplCommand::Invalid(e),
        },
        ("paper", None) | ("follow", None) | ("export", None) => {
            ReplCommand::Invalid(format!("/{} needs an argument", name))
        }
        _ => ReplCommand::Invalid(format!("unknown command /{}", name)),
    };
    Some(command)
}

/// 1-based user index to 0-based position.
fn parse_index(s: &str) -> Option<usize> {
    s.parse::<usize>().ok().and_then(|n| n.checked_sub(1))
}

/// Writes an export under `dir`, keeping only the file-name part of the
/// server-suggested name.
pub async fn save_export(dir: &Path, payload: &ExportPayload) -> std::io::Result<PathBuf> {
    let name = Path::new(&payload.filename)
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "export".into());
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, &payload.bytes).await?;
    Ok(path)
}

/// Executes one command. Returns `false` when the session should end.
pub async fn execute<W: AsyncWrite + Unpin>(
    controller: &mut ChatController,
    command: ReplCommand,
    export_dir: &Path,
    out: &mut W,
) -> std::io::Result<bool> {
    let text = match command {
        ReplCommand::Quit => return Ok(false),
        ReplCommand::Help => HELP.to_string(),
        ReplCommand::Invalid(reason) => format!("{} (try /help)\n", reason),
        ReplCommand::New => {
            controller.reset();
            render::message(&controller.state().messages()[0])
        }
        ReplCommand::Sources => render::paper_list(controller.state().papers()),
        ReplCommand::Paper(i) => match controller.select_paper(i) {
            Some(paper) => render::paper_detail(paper),
            None => format!("No paper #{}\n", i + 1),
        },
        ReplCommand::Close => {
            controller.close_paper();
            String::new()
        }
        ReplCommand::Follow(i) => match controller.state().latest_follow_ups().get(i).cloned() {
            Some(question) => {
                out.write_all(format!("> {}\n", question).as_bytes()).await?;
                ask(controller, &question).await
            }
            None => format!("No follow-up question #{}\n", i + 1),
        },
        ReplCommand::Ask(query) => ask(controller, &query).await,
        ReplCommand::Export(format) => match controller.on_export(format).await {
            Ok(payload) => match save_export(export_dir, &payload).await {
                Ok(path) => format!("Saved {}\n", path.display()),
                Err(e) => format!("Could not write export: {}\n", e),
            },
            Err(ExportFailure::Unsupported(detail)) => format!("Export unavailable: {}\n", detail),
            Err(e) => format!("{}\n", e),
        },
    };

    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(true)
}

async fn ask(controller: &mut ChatController, query: &str) -> String {
    match controller.on_send(query).await {
        TurnOutcome::Rejected => String::new(),
        TurnOutcome::Answered | TurnOutcome::Failed(_) => controller
            .state()
            .messages()
            .last()
            .map(render::message)
            .unwrap_or_default(),
    }
}

/// Reads commands from stdin until EOF or `/quit`.
pub async fn run(controller: &mut ChatController, export_dir: &Path) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let health = controller.mount().await;
    let banner = format!(
        "{}\n\n{}",
        render::health_line(health),
        render::message(&controller.state().messages()[0])
    );
    stdout.write_all(banner.as_bytes()).await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = parse_command(&line) else {
            continue;
        };
        if !execute(controller, command, export_dir, &mut stdout).await? {
            break;
        }
    }
    Ok(())
}
