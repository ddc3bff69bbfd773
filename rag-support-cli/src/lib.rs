//! Shared plumbing for the `rag-ingest`, `rag-chat` and `rag-admin` binaries.

pub mod admin;
pub mod settings;
pub mod staging;

pub use admin::AdminCommand;
pub use settings::Settings;
pub use staging::{KeepStaged, ingest_source};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).try_init().ok();
}

/// Whether a line typed into an interactive loop asks to leave it.
pub fn is_exit(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "exit" | "quit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_are_case_insensitive() {
        assert!(is_exit("exit"));
        assert!(is_exit("  QUIT "));
        assert!(!is_exit("exit now"));
        assert!(!is_exit(""));
    }
}
