use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use async_nlp::{
    book,
    config::Config,
    routes::create_router,
    utils::init_logger,
    AppState, OperatingMode,
};

/// An async NLP server.
#[derive(Parser)]
#[command(name = "async-nlp", version)]
struct Cli {
    /// Run in question-answering mode instead of summarization
    #[arg(long, global = true)]
    qa: bool,

    /// Path to the YAML configuration file
    #[arg(long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Split a plain-text book into a JSON book for /summarize_batch
    Prepare {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Text that starts every chapter
        #[arg(long, default_value = "CHAPTER")]
        marker: String,
        /// Number of leading pieces to drop (front matter, contents)
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cli.config, OperatingMode::from_qa_flag(cli.qa)).await,
        Command::Prepare { input, output, marker, skip } => {
            let _guard = init_logger(None);
            prepare(&input, &output, &marker, skip).await
        }
    }
}

async fn serve(config_path: &std::path::Path, mode: OperatingMode) -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load(config_path)?;
    let _guard = init_logger(config.logging.directory.as_deref());
    info!(mode = %mode, "Configuration loaded: {:?}", config.server);

    // Load the engine and start the scheduler
    let (state, scheduler) = AppState::bootstrap(config.clone(), mode)?;

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    // Jobs still running are dropped with the runtime
    scheduler.abort();
    info!("Server stopped");
    Ok(())
}

async fn prepare(input: &std::path::Path, output: &std::path::Path, marker: &str, skip: usize) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(input).await?;
    let chapters = book::chapterize(&text, marker, skip);
    tokio::fs::write(output, serde_json::to_vec(&chapters)?).await?;

    info!(
        input = %input.display(),
        output = %output.display(),
        chapters = chapters.len(),
        "Book prepared"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
