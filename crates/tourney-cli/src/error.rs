//! Error types for the `tourney` binary.

use std::path::PathBuf;

/// Top-level error for the `tourney` binary.
///
/// Each variant wraps a subsystem error so command handlers can
/// propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tourney_core::config::ConfigError,
    },

    /// An engine operation failed.
    #[error(transparent)]
    Engine(#[from] tourney_core::EngineError),

    /// Output could not be written.
    #[error("cannot write {path}: {source}")]
    Output {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A listing could not be encoded as JSON.
    #[error("cannot encode output: {source}")]
    Encode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A destructive command was run without `--yes`.
    #[error("{action} is irreversible; pass --yes to confirm")]
    Unconfirmed {
        /// What would have happened.
        action: &'static str,
    },
}
