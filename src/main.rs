//! visionlens - streaming image analysis from the command line
//!
//! Thin presentation shell over the library: loads an image, streams the
//! model's answer to stdout as it arrives, then prints a metrics footer.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, anyhow};
use clap::Parser;
use futures::StreamExt;
use tracing::Level;

use visionlens_rs::client::config::{DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_STREAM_TIMEOUT_SECS};
use visionlens_rs::{
    Analyzer, ClientConfig, CompletionClient, DisplayUpdate, ImageFormat, ImagePayload, PromptSpec,
};

#[derive(Debug, Parser)]
#[command(
    name = "visionlens",
    version,
    about = "Analyze an image with a vision model, streaming the answer"
)]
struct Cli {
    /// Path to the image to analyze (jpg, jpeg, png, or webp)
    image: PathBuf,

    /// Ask a specific question instead of requesting a general description
    #[arg(short, long)]
    question: Option<String>,

    /// API key for the endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model identifier
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Endpoint base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Stream idle timeout in seconds
    #[arg(long, default_value_t = DEFAULT_STREAM_TIMEOUT_SECS)]
    timeout: u64,

    /// Declare the image as image/jpeg regardless of its actual format
    #[arg(long)]
    normalize_jpeg: bool,

    /// Suppress informational logging
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging system
    tracing_subscriber::fmt()
        .with_max_level(if cli.quiet { Level::WARN } else { Level::INFO })
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let bytes = std::fs::read(&cli.image)
        .with_context(|| format!("failed to read image {}", cli.image.display()))?;

    let extension = cli
        .image
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let format = ImageFormat::from_extension(extension).ok_or_else(|| {
        anyhow!("unsupported image format '{extension}'; expected jpg, jpeg, png, or webp")
    })?;
    let image = ImagePayload::new(bytes, format);

    let prompt = match cli.question {
        Some(question) => PromptSpec::question(question),
        None => PromptSpec::describe(),
    };

    let config = ClientConfig {
        api_key: cli.api_key,
        api_base: cli.api_base,
        model: cli.model,
        stream_timeout_secs: cli.timeout,
        normalize_mime_to_jpeg: cli.normalize_jpeg,
        ..ClientConfig::default()
    };
    let analyzer = Analyzer::new(CompletionClient::new(config)?);

    let mut updates = analyzer.analyze(&image, &prompt);

    // The library republishes the whole buffer each tick; the terminal only
    // wants the new suffix.
    let mut printed = 0;
    let mut stdout = std::io::stdout();

    while let Some(update) = updates.next().await {
        match update {
            DisplayUpdate::Progress { text, .. } => {
                write!(stdout, "{}", &text[printed..])?;
                stdout.flush()?;
                printed = text.len();
            }
            DisplayUpdate::Final { text, metrics } => {
                write!(stdout, "{}", &text[printed..])?;
                writeln!(stdout)?;
                writeln!(
                    stdout,
                    "~{} words (estimate) | {} chars | {}",
                    metrics.approx_words, metrics.chars, metrics.model
                )?;
            }
            DisplayUpdate::Error { message } => {
                if printed > 0 {
                    writeln!(stdout)?;
                }
                return Err(anyhow!(message));
            }
        }
    }

    Ok(())
}
