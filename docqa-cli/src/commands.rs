use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use docqa_core::Credentials;
use docqa_session::{DocQaConfig, PDF_CONTENT_TYPE, QaPipeline, Session, SessionManager};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

async fn open_session(config: DocQaConfig, pdf: &Path) -> anyhow::Result<Arc<Session>> {
    let pipeline = QaPipeline::openai(config)?;
    let manager = SessionManager::new(Arc::new(pipeline));
    let session = manager.create_session().await;

    let bytes =
        tokio::fs::read(pdf).await.with_context(|| format!("failed to read {}", pdf.display()))?;
    let filename = pdf.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    let receipt = session.upload(&filename, &bytes, Some(PDF_CONTENT_TYPE)).await?;
    eprintln!(
        "Loaded {} ({} pages, {} chunks)",
        receipt.filename, receipt.page_count, receipt.chunk_count
    );
    Ok(session)
}

pub async fn ask(
    config: DocQaConfig,
    credentials: &Credentials,
    pdf: &Path,
    question: &str,
) -> anyhow::Result<()> {
    let session = open_session(config, pdf).await?;
    let answer = session.ask(question, credentials).await?;
    println!("{}", answer.answer);
    eprintln!("({} sources used)", answer.sources_used);
    Ok(())
}

pub async fn topics(
    config: DocQaConfig,
    credentials: &Credentials,
    pdf: &Path,
) -> anyhow::Result<()> {
    let session = open_session(config, pdf).await?;
    session.build_index(credentials).await?;
    print_topics(&session.suggest_topics(credentials, false).await.suggestions);
    Ok(())
}

fn print_topics(suggestions: &[String]) {
    if suggestions.is_empty() {
        println!("No suggestions available.");
        return;
    }
    for (i, suggestion) in suggestions.iter().enumerate() {
        println!("{}. {suggestion}", i + 1);
    }
}

const CHAT_HELP: &str = "Commands: :topics (suggest questions, :topics! to regenerate), \
                         :status, :clear, :quit";

pub async fn chat(
    config: DocQaConfig,
    credentials: &Credentials,
    pdf: &Path,
) -> anyhow::Result<()> {
    let session = open_session(config, pdf).await?;
    let mut editor = DefaultEditor::new()?;
    println!("{CHAT_HELP}");

    loop {
        let line = match editor.readline("docqa> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(input);

        match input {
            ":quit" | ":q" => break,
            ":help" => println!("{CHAT_HELP}"),
            ":status" => println!("{}", serde_json::to_string_pretty(&session.status().await)?),
            ":clear" => {
                session.clear().await;
                println!("Document cleared. Restart docqa to load another PDF.");
            }
            ":topics" | ":topics!" => {
                if let Err(e) = session.build_index(credentials).await {
                    println!("Error: {e}");
                    continue;
                }
                let force = input.ends_with('!');
                print_topics(&session.suggest_topics(credentials, force).await.suggestions);
            }
            question => match session.ask(question, credentials).await {
                Ok(answer) => println!("{}\n({} sources used)", answer.answer, answer.sources_used),
                Err(e) => {
                    warn!(error = %e, retryable = e.is_retryable(), "question failed");
                    println!("Error: {e}");
                }
            },
        }
    }

    Ok(())
}
