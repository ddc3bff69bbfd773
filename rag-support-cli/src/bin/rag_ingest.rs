//! Ingest one batch of staged documents into the vector collection.
//!
//! Run: `rag-ingest [number_of_docs] [--in-memory]`

use std::process::ExitCode;

use clap::Parser;
use rag_support::{IngestionOrchestrator, IngestionOutcome, parse_batch_size};
use rag_support_cli::{Settings, ingest_source, init_tracing};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rag-ingest", about = "Embed and index a batch of staged documents")]
struct Cli {
    /// Maximum number of documents to ingest; invalid or missing means 1000
    number_of_docs: Option<String>,

    /// Use a process-local in-memory store instead of Milvus; documents stay staged
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let batch_size = parse_batch_size(cli.number_of_docs.as_deref());
    let config = settings.ingest_config(batch_size)?;
    let source = ingest_source(&config, cli.in_memory);
    info!(
        staging = %config.staging_dir.display(),
        processed = %config.processed_dir.display(),
        batch_size,
        in_memory = cli.in_memory,
        "starting ingestion"
    );

    let orchestrator = IngestionOrchestrator::new(
        config,
        source,
        settings.embedding_provider(),
        settings.gateway(cli.in_memory)?,
    );

    match orchestrator.run().await? {
        IngestionOutcome::NothingToDo => {
            println!("All documents are ingested.");
            Ok(ExitCode::SUCCESS)
        }
        IngestionOutcome::StoreUnavailable { cause } => {
            println!("Vector store unavailable: {cause}");
            Ok(ExitCode::FAILURE)
        }
        IngestionOutcome::Completed(tally) => {
            for failure in &tally.failures {
                println!("Failed {}: {}", failure.document, failure.cause);
            }
            println!("Completed: {} | Failed: {}", tally.succeeded, tally.failed);
            Ok(ExitCode::SUCCESS)
        }
    }
}
