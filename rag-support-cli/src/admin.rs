//! Commands understood by the `rag-admin` shell.

use rag_support::{CollectionStatus, Result, VectorStoreGateway};

/// Reply to `help`.
pub const HELP: &str =
    "Commands: list, info <name>, count <name>, drop <name>, create <name>, exit";

/// Reply to anything that does not parse.
pub const UNKNOWN: &str = "Unknown command. Type 'help'.";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Print [`HELP`].
    Help,
    /// List every collection.
    List,
    /// Show a collection's schema, row count and load state.
    Info(String),
    /// Load a collection and print its entity count.
    Count(String),
    /// Drop a collection.
    Drop(String),
    /// Create a collection at the configured dimensions.
    Create(String),
    /// Leave the shell (`exit` or `quit`).
    Exit,
}

impl AdminCommand {
    /// Parse a line. Blank lines yield `Ok(None)`; unknown commands and
    /// commands missing their collection name yield `Err(UNKNOWN)`.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, &'static str> {
        let mut words = line.split_whitespace();
        let Some(action) = words.next() else {
            return Ok(None);
        };
        let name = words.next().map(str::to_string);

        let command = match (action.to_ascii_lowercase().as_str(), name) {
            ("exit" | "quit", _) => Self::Exit,
            ("help", _) => Self::Help,
            ("list", _) => Self::List,
            ("info", Some(name)) => Self::Info(name),
            ("count", Some(name)) => Self::Count(name),
            ("drop", Some(name)) => Self::Drop(name),
            ("create", Some(name)) => Self::Create(name),
            _ => return Err(UNKNOWN),
        };
        Ok(Some(command))
    }
}

fn not_found(name: &str) -> String {
    format!("Collection '{name}' not found")
}

/// Run a command against a connected gateway and render its output.
///
/// [`AdminCommand::Exit`] renders as an empty string; leaving the loop is up
/// to the caller.
pub async fn execute(gateway: &VectorStoreGateway, command: &AdminCommand) -> Result<String> {
    let output = match command {
        AdminCommand::Help => HELP.to_string(),
        AdminCommand::Exit => String::new(),
        AdminCommand::List => {
            let names = gateway.list_collections().await?;
            if names.is_empty() { "No collections".to_string() } else { names.join("\n") }
        }
        AdminCommand::Info(name) => {
            if !gateway.has_collection(name).await? {
                return Ok(not_found(name));
            }
            let description = gateway.describe(name).await?;
            let schema = &description.schema;
            let mut lines = vec![
                format!("Collection: {}", description.name),
                format!("Description: {}", schema.description),
                format!("Rows: {}", description.row_count),
                format!("Loaded: {}", description.loaded),
            ];
            for field in schema.fields() {
                let mut line = format!("  {} {:?}", field.name, field.data_type);
                if field.is_primary {
                    line.push_str(" primary");
                }
                if field.auto_id {
                    line.push_str(" auto_id");
                }
                if let Some(dim) = field.dim {
                    line.push_str(&format!(" dim={dim}"));
                }
                if let Some(max_length) = field.max_length {
                    line.push_str(&format!(" max_length={max_length}"));
                }
                lines.push(line);
            }
            lines.join("\n")
        }
        AdminCommand::Count(name) => {
            if !gateway.has_collection(name).await? {
                return Ok(not_found(name));
            }
            gateway.load(name).await?;
            format!("Entities in '{name}': {}", gateway.count(name).await?)
        }
        AdminCommand::Drop(name) => {
            if gateway.drop(name).await? {
                format!("Collection '{name}' dropped")
            } else {
                not_found(name)
            }
        }
        AdminCommand::Create(name) => match gateway.create_collection(name).await? {
            CollectionStatus::Created => format!(
                "Collection '{name}' created ({} dimensions)",
                gateway.config().dimensions
            ),
            CollectionStatus::Existing => format!("Collection '{name}' already exists"),
        },
    };
    Ok(output)
}
