//! Core records of the tournament: participants, game types, and matches.
//!
//! Field names serialize in camelCase so persisted records keep the shape
//! the browser display reads (`firstName`, `gameType`, `gameCategory`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{GameTypeId, MatchId, ParticipantId};

/// Current participant record schema.
///
/// Version 1 stored `{id, name, stars}`, version 2 added `birthDate`,
/// version 3 split the display name into first and last name.
pub const PARTICIPANT_SCHEMA_VERSION: u32 = 3;

/// Identifier of the non-competing bank entity.
pub const BANK_ID: &str = "P000";

/// Display name of the bank entity.
pub const BANK_NAME: &str = "Banco";

/// Fixed balance held by the bank entity.
pub const BANK_STARS: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A registered participant and their star balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Participant {
    /// Stable sequential identifier.
    pub id: ParticipantId,
    /// Given name as typed at registration.
    pub first_name: String,
    /// Family name as typed at registration. Empty for seeded participants.
    #[serde(default)]
    pub last_name: String,
    /// Date of birth, absent for seeded and migrated participants.
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Display name composed from first and last name.
    pub name: String,
    /// Star balance. Signed: legacy data may hold negative balances.
    #[ts(type = "number")]
    pub stars: i64,
    /// Record schema version, see [`PARTICIPANT_SCHEMA_VERSION`].
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
}

impl Participant {
    /// Create a participant with the current schema.
    pub fn new(
        id: ParticipantId,
        first_name: &str,
        last_name: &str,
        birth_date: Option<NaiveDate>,
        stars: i64,
    ) -> Self {
        let first_name = first_name.trim().to_owned();
        let last_name = last_name.trim().to_owned();
        let name = compose_name(&first_name, &last_name);
        Self {
            id,
            first_name,
            last_name,
            birth_date,
            name,
            stars,
            schema_version: PARTICIPANT_SCHEMA_VERSION,
        }
    }

    /// The bank sentinel: never ranked, never matched, fixed balance.
    pub fn bank() -> Self {
        Self::new(ParticipantId::from(BANK_ID), BANK_NAME, "", None, BANK_STARS)
    }

    /// Whether this participant is the bank sentinel.
    pub fn is_bank(&self) -> bool {
        self.id.as_str() == BANK_ID
    }

    /// Case-insensitive comparison of the display name against `name`.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Compose a display name from first and last name, case preserved.
pub fn compose_name(first_name: &str, last_name: &str) -> String {
    let first_name = first_name.trim();
    let last_name = last_name.trim();
    if last_name.is_empty() {
        first_name.to_owned()
    } else {
        format!("{first_name} {last_name}")
    }
}

const fn current_schema_version() -> u32 {
    PARTICIPANT_SCHEMA_VERSION
}

// ---------------------------------------------------------------------------
// GameType
// ---------------------------------------------------------------------------

/// A kind of game a match can be recorded against. Static reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameType {
    /// Catalog identifier.
    pub id: GameTypeId,
    /// Display name (e.g. "Truco").
    pub name: String,
    /// Category label (e.g. "Cartas").
    pub category: String,
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// A recorded match. Names and game labels are copies taken at recording
/// time, so later changes never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Match {
    /// Sequential identifier, monotonically increasing.
    pub id: MatchId,
    /// Game type name at recording time.
    pub game_type: String,
    /// Game type category at recording time.
    pub game_category: String,
    /// Winner display name at recording time.
    pub winner: String,
    /// Loser display name at recording time.
    pub loser: String,
    /// Locale-formatted wall-clock time of recording.
    pub timestamp: String,
}
