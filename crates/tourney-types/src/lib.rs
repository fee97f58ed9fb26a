//! Shared type definitions for the tournament star ledger.
//!
//! This crate is the single source of truth for the records the ledger
//! keeps and persists. Types flow to `TypeScript` via `ts-rs` for the
//! browser scoreboard display.
//!
//! # Modules
//!
//! - [`ids`] -- Prefixed sequential identifiers (`P001`, `G001`, `M001`)
//! - [`structs`] -- `Participant`, `GameType`, and `Match` records
//! - [`catalog`] -- The built-in game type catalog

pub mod catalog;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use catalog::game_types;
pub use ids::{GameTypeId, MatchId, ParticipantId};
pub use structs::{
    BANK_ID, BANK_NAME, BANK_STARS, GameType, Match, PARTICIPANT_SCHEMA_VERSION, Participant,
    compose_name,
};
