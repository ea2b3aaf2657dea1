use chrono::Utc;
use clap::{Parser, Subcommand};
use manual_chat_core::{
    AppConfig, AssistantError, ChatModel, Embedder, IndexProgress, IndexState, ManualAssistant,
    SkippedPdf, DEFAULT_CONFIG_FILE, INDEX_FIRST_MESSAGE,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod chat;

#[derive(Parser)]
#[command(name = "manual-chat", version, about = "Chat with a folder of PDF manuals")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// YAML config file with the API key and paths
    #[arg(long, env = "MANUAL_CHAT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Delete the current index and rebuild it from every PDF in the source folder.
    Index,
    /// Show index status and the manuals found in the source folder.
    Status,
    /// Answer a single question and exit.
    Ask {
        /// Question to ask the manuals
        #[arg(long)]
        question: String,
        /// Also print the retrieved passages.
        #[arg(long, default_value_t = false)]
        show_sources: bool,
    },
    /// Interactive chat session.
    Chat,
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .map_err(|error| anyhow::anyhow!("{}: {error}", cli.config.display()))?;
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        chat_model = %config.chat_model,
        index_path = %config.index_path.display(),
        "manual-chat boot"
    );

    let embedder = config.embedder()?;
    let chat_model = config.chat_model()?;
    let assistant = ManualAssistant::new(
        embedder,
        chat_model,
        &config.index_path,
        &config.source_directory,
    )
    .with_top_k(config.top_k);

    match cli.command {
        Command::Index => run_index(&assistant)?,
        Command::Status => print_sidebar(&assistant)?,
        Command::Ask {
            question,
            show_sources,
        } => {
            match assistant.ask(&question) {
                Ok(answer) => {
                    if show_sources {
                        for hit in &answer.sources {
                            println!(
                                "[{} p.{}] relevance={:.2} distance={:.4}",
                                hit.manual(),
                                hit.metadata.page,
                                hit.similarity(),
                                hit.distance
                            );
                        }
                    }
                    println!("{}", answer.text);
                }
                Err(error) if error.is_not_indexed() => println!("{INDEX_FIRST_MESSAGE}"),
                Err(error) => return Err(anyhow::anyhow!("could not answer: {error}")),
            }
        }
        Command::Chat => chat::run(&assistant)?,
    }

    Ok(())
}

/// Rebuilds the index. An empty source folder is a warning, not a failure.
pub(crate) fn run_index<E: Embedder, C: ChatModel>(
    assistant: &ManualAssistant<E, C>,
) -> anyhow::Result<()> {
    println!("Indexing PDFs...");
    let outcome = assistant.index_manuals_with(|step| match step {
        IndexProgress::Loading(name) => println!("  loading {name}"),
        IndexProgress::RemovingPrevious(path) => {
            println!("  removing previous index at {}", path.display())
        }
        IndexProgress::Embedding { pages } => println!("  embedding {pages} pages"),
    });

    match outcome {
        Ok(summary) => {
            print_skipped(&summary.skipped_files);
            println!(
                "Indexed {} pages from {} manual(s) at {}",
                summary.pages,
                summary.manuals.len(),
                Utc::now().to_rfc3339()
            );
            Ok(())
        }
        Err(AssistantError::NoDocumentsFound(folder)) => {
            println!("No PDF found in {}", folder.display());
            Ok(())
        }
        Err(AssistantError::AllManualsUnreadable(skipped)) => {
            print_skipped(&skipped);
            Err(anyhow::anyhow!(
                "none of the {} pdf files could be read; index left unchanged",
                skipped.len()
            ))
        }
        Err(error) => Err(anyhow::anyhow!(error.to_string())),
    }
}

fn print_skipped(skipped: &[SkippedPdf]) {
    for file in skipped {
        warn!(path = %file.path.display(), reason = %file.reason, "skipped pdf");
        println!("  skipped {}: {}", file.path.display(), file.reason);
    }
}

pub(crate) fn print_sidebar<E: Embedder, C: ChatModel>(
    assistant: &ManualAssistant<E, C>,
) -> anyhow::Result<()> {
    match assistant.status()? {
        IndexState::Ready(manifest) => println!(
            "Index: ready ({} pages, {} manuals, built {})",
            manifest.record_count,
            manifest.manuals.len(),
            manifest.built_at.to_rfc3339()
        ),
        IndexState::Absent => println!("Index: not built"),
    }

    let files = assistant.manual_files();
    println!(
        "PDFs found in {}: {}",
        assistant.source_directory().display(),
        files.len()
    );
    for path in files {
        if let Some(name) = path.file_name() {
            println!("  - {}", name.to_string_lossy());
        }
    }
    Ok(())
}
