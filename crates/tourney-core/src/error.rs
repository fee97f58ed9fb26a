//! Error types for the ledger engine.
//!
//! [`EngineError`] wraps every failure an engine operation can report, so
//! callers can propagate with `?` and still tell a rejected result apart
//! from a storage failure.

use tourney_ledger::LedgerError;

use crate::export::ExportError;
use crate::store::StoreError;

/// Top-level error for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The operation was rejected by validation. Nothing changed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Persisted state could not be read or written. In-memory state is
    /// unchanged.
    #[error("storage error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The configured timestamp format cannot be rendered. Nothing changed.
    #[error("cannot render timestamp with format {format:?}")]
    TimestampFormat {
        /// The format as configured.
        format: String,
    },

    /// The export could not be rendered.
    #[error("export error: {source}")]
    Export {
        /// The underlying export error.
        #[from]
        source: ExportError,
    },
}

impl EngineError {
    /// Whether this is a user-facing validation failure rather than an
    /// infrastructure problem.
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Ledger(_))
    }
}
