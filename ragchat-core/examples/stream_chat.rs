//! Streaming Chat Demo
//!
//! Sends one question to a running service and prints the reply as it
//! streams in. Ctrl-C stops the reply early. Lists the knowledge base first
//! when `--rag` is given.
//!
//! Run with: cargo run --example stream_chat -- [--rag] [config.yaml] "question"
//!
//! Set `RUST_LOG=ragchat_core=debug` to see per-request logging.

use ragchat_core::config;
use ragchat_core::stream::StreamOutcome;
use ragchat_core::{ChatClient, ClientConfig, KnowledgeBaseClient, Message, RequestOptions};
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut use_rag = false;
    let mut config_path = None;
    let mut question = None;
    for arg in std::env::args().skip(1) {
        if arg == "--rag" {
            use_rag = true;
        } else if arg.ends_with(".yaml") || arg.ends_with(".yml") || arg.ends_with(".json") {
            config_path = Some(arg);
        } else {
            question = Some(arg);
        }
    }

    let config = match config_path {
        Some(path) => config::load(path)?,
        None => ClientConfig::default(),
    };
    println!("🔗 Service: {}", config.endpoint.base_url);

    if use_rag {
        let kb = KnowledgeBaseClient::from_config(&config)?;
        let files = kb.list_files().await?;
        println!("📚 Knowledge base ({} files)", files.len());
        for file in &files {
            println!("   • {} ({})", file.name, file.size);
        }
    }

    let question = question.unwrap_or_else(|| "What can you tell me about my documents?".to_string());
    let request = RequestOptions::new(vec![
        Message::system("You are a helpful assistant."),
        Message::user(question.as_str()),
    ])
    .with_rag(use_rag);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    println!("\n💬 {}\n", question);
    let chat = ChatClient::from_config(&config)?;
    let mut stdout = std::io::stdout();
    let summary = chat
        .process_text_with_cancel(&request, &cancel, |fragment| {
            stdout.write_all(fragment.as_bytes())?;
            stdout.flush()?;
            Ok(())
        })
        .await?;
    ctrl_c.abort();

    println!();
    match summary.outcome {
        StreamOutcome::Completed => println!(
            "\n✅ Done: {} chunks, {} bytes [request_id: {}]",
            summary.chunks, summary.bytes, summary.request_id
        ),
        StreamOutcome::Cancelled => println!(
            "\n⏹️  Stopped after {} chunks [request_id: {}]",
            summary.chunks, summary.request_id
        ),
    }

    Ok(())
}
