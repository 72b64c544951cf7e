//! Command-line front end for speakable text extraction
//!
//! Reads one file, URL or piece of text and prints the text to read aloud.
//! Logs go to stderr; set `RUST_LOG` to change verbosity.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use readaloud_extract::{ContentExtractor, ExtractorConfig, Submission};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

/// Extract speakable text from documents, web pages and pasted text
#[derive(Parser, Debug)]
#[command(name = "readaloud-extract")]
#[command(about = "Extract speakable text from documents, web pages and pasted text")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the result as JSON ({title, text, warning})
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from a .txt, .md, .pdf or .docx file
    File {
        /// Path to the document
        path: PathBuf,
    },
    /// Extract the article behind a URL
    Url {
        /// Web page or X/Twitter status URL
        url: String,
    },
    /// Read pasted text; a single embedded link is followed
    Text {
        /// Text to read; stdin is used when omitted
        text: Option<String>,
    },
}

fn load_config(path: Option<&Path>) -> Result<ExtractorConfig> {
    let Some(path) = path else {
        return Ok(ExtractorConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

async fn submission(command: Command) -> Result<Submission> {
    Ok(match command {
        Command::File { path } => {
            let content = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Submission::file(path.to_string_lossy(), content)
        }
        Command::Url { url } => Submission::url(url),
        Command::Text { text: Some(text) } => Submission::text(text),
        Command::Text { text: None } => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Submission::text(text)
        }
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let extractor = ContentExtractor::new(config).context("invalid configuration")?;
    let submission = submission(args.command).await?;

    match extractor.extract_submission(submission).await {
        Ok(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                if let Some(warning) = &result.warning {
                    eprintln!("warning: {}", warning);
                }
                if let Some(title) = &result.title {
                    println!("{}\n", title);
                }
                println!("{}", result.text);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(kind = ?err.kind(), error = %err, "extraction failed");
            if args.json {
                let body = serde_json::json!({
                    "error": err.public_message(),
                    "kind": err.kind(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                eprintln!("{}", err.public_message());
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
