//! `docqa` - ask questions about a PDF from the terminal.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use docqa_core::Credentials;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Parser, Debug)]
#[command(name = "docqa", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API key for embedding and chat calls (defaults to $OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Chat model used for answers and suggestions
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Ask a single question about a PDF
    Ask {
        /// The PDF to load
        pdf: PathBuf,
        /// The question to answer from the PDF
        question: String,
    },
    /// Suggest questions that the PDF can answer
    Topics {
        /// The PDF to load
        pdf: PathBuf,
    },
    /// Load a PDF and ask questions interactively
    Chat {
        /// The PDF to load
        pdf: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(filter())
    });
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr).with_filter(filter())
    });

    tracing_subscriber::registry().with(fmt_layer).with(json_layer).init();
}

fn resolve_credentials(flag: Option<String>) -> anyhow::Result<Credentials> {
    let credentials = match flag {
        Some(key) => Credentials::new(key),
        None => Credentials::from_env(API_KEY_VAR)
            .with_context(|| format!("no API key: pass --api-key or set {API_KEY_VAR}"))?,
    };
    anyhow::ensure!(!credentials.is_empty(), "API key must not be empty");
    Ok(credentials)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = docqa_session::load_config(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;
    if let Some(model) = cli.model {
        config.generation.chat_model = model;
    }
    let credentials = resolve_credentials(cli.api_key)?;

    match cli.command {
        Command::Ask { pdf, question } => {
            commands::ask(config, &credentials, &pdf, &question).await
        }
        Command::Topics { pdf } => commands::topics(config, &credentials, &pdf).await,
        Command::Chat { pdf } => commands::chat(config, &credentials, &pdf).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ask_with_global_flags() {
        let cli = Cli::try_parse_from([
            "docqa",
            "ask",
            "report.pdf",
            "What is the conclusion?",
            "--model",
            "gpt-4o",
            "--log-json",
        ])
        .unwrap();

        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
        assert!(cli.log_json);
        match cli.command {
            Command::Ask { pdf, question } => {
                assert_eq!(pdf, PathBuf::from("report.pdf"));
                assert_eq!(question, "What is the conclusion?");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn chat_requires_a_pdf() {
        assert!(Cli::try_parse_from(["docqa", "chat"]).is_err());
    }

    #[test]
    fn explicit_key_wins_and_blank_key_is_rejected() {
        let credentials = resolve_credentials(Some("sk-flag".into())).unwrap();
        assert_eq!(credentials.api_key(), "sk-flag");
        assert!(resolve_credentials(Some("  ".into())).is_err());
    }
}
