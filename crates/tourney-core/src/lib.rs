//! Configuration, persistence, export, and the ledger engine for the
//! tournament scoreboard.
//!
//! This crate owns the process-wide state: it loads the persisted ledger,
//! upgrades legacy records, applies every mutation atomically, and tells
//! subscribers when something changed.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `tourney-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- [`LedgerEngine`], the owner of all state transitions.
//! - [`error`] -- [`EngineError`].
//! - [`export`] -- CSV export of participants, matches, and game types.
//! - [`migrate`] -- Load-time schema migration and the ledger's stored form.
//! - [`store`] -- [`StateStore`] trait with file and in-memory backends.
//!
//! [`LedgerEngine`]: engine::LedgerEngine
//! [`EngineError`]: error::EngineError
//! [`StateStore`]: store::StateStore

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod migrate;
pub mod store;

pub use config::TourneyConfig;
pub use engine::{EngineSettings, LedgerEngine, LedgerEvent};
pub use error::EngineError;
pub use store::{JsonFileStore, MemoryStore, StateStore, StorageKey};
