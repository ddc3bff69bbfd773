//! Administrative shell for vector collections.

use clap::Parser;
use rag_support_cli::admin::{self, AdminCommand};
use rag_support_cli::{Settings, init_tracing};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

#[derive(Parser, Debug)]
#[command(name = "rag-admin", about = "List, inspect, create and drop vector collections")]
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
    gateway.connect_default().await?;
    let (host, port) = (&settings.milvus_host, settings.milvus_port);
    println!("Connected to {} at {host}:{port}", gateway.backend());
    println!("Type 'help' for commands");

    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline("milvus> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let command = match AdminCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        editor.add_history_entry(line.trim()).ok();
        if command == AdminCommand::Exit {
            println!("Bye!");
            break;
        }

        match admin::execute(&gateway, &command).await {
            Ok(output) => println!("{output}"),
            Err(e) => println!("Error: {e}"),
        }
    }
    Ok(())
}
