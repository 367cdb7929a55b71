use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

use paperchat::{
    config::Config,
    models::internal::{ExportFormat, SearchMode},
    orchestrator::{ChatController, ExportFailure, TurnOutcome},
    render, repl,
    services::api_client::{ApiClient, ChatBackend},
};

#[derive(Parser)]
#[command(name = "paperchat", version, about = "Chat with a research-paper RAG backend")]
struct Cli {
    /// Backend base URL (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Retrieval engine: postgres, faiss, pinecone or both
    #[arg(long, global = true)]
    search_mode: Option<SearchMode>,

    /// Papers to retrieve per question
    #[arg(long, global = true)]
    n_results: Option<u32>,

    /// Directory for downloaded exports
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe backend health
    Health,
    /// Interactive chat (default)
    Chat,
    /// Ask one question and print the answer with its sources
    Ask {
        query: String,
        /// Also download the report: md or pdf
        #[arg(long)]
        export: Option<ExportFormat>,
    },
    /// Search papers without generating an answer
    Search { query: String },
    /// Show stored history of a conversation
    History {
        conversation_id: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show message and token counts of a conversation
    Stats { conversation_id: String },
    /// Show paper collection statistics
    DbStats,
    /// Manage exports stored on the server
    Exports {
        #[command(subcommand)]
        action: ExportsAction,
    },
}

#[derive(Subcommand)]
enum ExportsAction {
    List,
    Delete { filename: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(mode) = cli.search_mode {
        config.search_mode = mode;
    }
    if let Some(n) = cli.n_results {
        config.n_results = n;
    }
    if let Some(dir) = cli.export_dir {
        config.export_dir = dir;
    }
    config.validate().context("Invalid command-line override")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("paperchat={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Using backend {}", config.api_base_url);
    let client = ApiClient::new(config.api_base_url.clone());

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let mut controller = ChatController::from_config(&config);
            repl::run(&mut controller, &config.export_dir).await?;
        }
        Commands::Health => {
            let health = client.check_health().await;
            println!("{}", render::health_line(health));
        }
        Commands::Ask { query, export } => {
            let mut controller = ChatController::from_config(&config);
            let outcome = controller.on_send(&query).await;
            if outcome == TurnOutcome::Rejected {
                anyhow::bail!("Question must not be empty");
            }
            if let Some(last) = controller.state().messages().last() {
                print!("{}", render::message(last));
            }
            if let TurnOutcome::Failed(kind) = outcome {
                anyhow::bail!("Chat failed: {:?}", kind);
            }
            print!("\n{}", render::paper_list(controller.state().papers()));
            if let Some(format) = export {
                match controller.on_export(format).await {
                    Ok(payload) => {
                        let path = repl::save_export(&config.export_dir, &payload).await?;
                        println!("Saved {}", path.display());
                    }
                    Err(ExportFailure::Unsupported(detail)) => {
                        eprintln!("Export unavailable: {}", detail)
                    }
                    Err(e) => anyhow::bail!(e),
                }
            }
        }
        Commands::Search { query } => {
            let papers = client
                .search_papers(&query, config.n_results, config.search_mode)
                .await?;
            print!("{}", render::paper_list(&papers));
        }
        Commands::History {
            conversation_id,
            limit,
        } => {
            let history = client.conversation_history(&conversation_id, limit).await?;
            print!("{}", render::history(&history.messages));
        }
        Commands::Stats { conversation_id } => {
            let stats = client.conversation_stats(&conversation_id).await?;
            print!("{}", render::conversation_stats(&stats.stats));
        }
        Commands::DbStats => {
            let stats = client.database_stats().await?;
            print!("{}", render::database_stats(&stats));
        }
        Commands::Exports { action } => match action {
            ExportsAction::List => {
                let exports = client.list_exports().await?;
                print!("{}", render::export_list(&exports));
            }
            ExportsAction::Delete { filename } => {
                client.delete_export(&filename).await?;
                println!("Deleted {}", filename);
            }
        },
    }

    Ok(())
}
