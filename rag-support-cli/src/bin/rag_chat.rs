//! Interactive question answering over the indexed collection.
//!
//! Run: `rag-chat [--in-memory]`, then type questions; `exit` or `quit` leaves.

use clap::Parser;
use rag_support::QueryOrchestrator;
use rag_support_cli::{Settings, init_tracing, is_exit};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "rag-chat", about = "Ask questions answered from the indexed documents")]
struct Cli {
    /// Use a process-local in-memory store instead of Milvus
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let gateway = settings.gateway(cli.in_memory)?;
    if cli.in_memory {
        // an empty collection so that search has something to load
        gateway.connect_default().await?;
        gateway.create_collection(&settings.collection).await?;
    }

    let orchestrator = QueryOrchestrator::builder()
        .config(settings.query_config()?)
        .embedding_provider(settings.embedding_provider())
        .generation_provider(settings.generation_provider())
        .gateway(gateway)
        .build()?;
    orchestrator.prepare().await?;

    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline("\n> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit(question) {
            break;
        }
        editor.add_history_entry(question).ok();

        match orchestrator.answer(question).await {
            Ok(answer) => println!("{answer}"),
            Err(e) => {
                warn!(error = %e, "question could not be answered");
                println!("Error: {e}");
            }
        }
    }
    Ok(())
}
