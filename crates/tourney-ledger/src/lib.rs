//! Star ledger, match processing, and standings for the tournament scoreboard.
//!
//! Every star a participant holds moves through this crate. Stars are never
//! created by a match and never destroyed by one: a match moves exactly one
//! star from the loser to the winner. Registration is the only source of
//! new stars, and the bank sentinel sits outside every total.
//!
//! # Architecture
//!
//! - [`registry`] -- The [`Registry`]: participants, balances, registration,
//!   removal, merge-on-load reconciliation, and ranking.
//! - [`processor`] -- Parsing and validation of `"Winner > Loser"` results.
//! - [`ledger`] -- The [`StarLedger`]: registry plus the most-recent-first
//!   [`MatchLog`], and the atomic match recording step.
//! - [`stats`] -- Standings, podium, game and player statistics.
//! - [`conservation`] -- Star conservation verification.
//!
//! # Usage
//!
//! ```
//! use tourney_ledger::{MatchLog, Registry, StarLedger};
//! use tourney_types::{GameTypeId, Participant, ParticipantId};
//!
//! let registry = Registry::new(vec![
//!     Participant::new(ParticipantId::from_sequence(1), "Ana", "", None, 10),
//!     Participant::new(ParticipantId::from_sequence(2), "Bea", "", None, 10),
//! ]);
//! let mut ledger = StarLedger::new(registry, MatchLog::new());
//!
//! let recorded = ledger.record_match(
//!     &GameTypeId::from("M001"),
//!     "Ana > Bea",
//!     String::from("16/10/2026, 20:00:00"),
//! );
//! assert!(recorded.is_ok());
//! assert_eq!(ledger.registry().find_by_name("ana").map(|p| p.stars), Some(11));
//! ```

pub mod conservation;
pub mod ledger;
pub mod processor;
pub mod registry;
pub mod stats;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use ledger::{MatchLog, StarLedger};
pub use processor::ValidatedMatch;
pub use registry::{Registry, RegistryRules};
pub use stats::{GameStat, PlayerStat};

use tourney_types::{GameTypeId, ParticipantId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Validation failures of ledger operations.
///
/// Every variant is a user-facing, non-fatal rejection. An operation that
/// returns one of these has left the ledger untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The free-text result does not split into two non-empty names.
    #[error("malformed result {input:?}: expected \"Winner > Loser\"")]
    MalformedResult {
        /// The text as submitted.
        input: String,
    },

    /// One or both names do not match a registered participant.
    #[error("participant not found: {}", .names.join(", "))]
    UnknownParticipant {
        /// Every name that failed to resolve, winner side first.
        names: Vec<String>,
    },

    /// Winner and loser resolve to the same participant.
    #[error("invalid match: {name} cannot play against themselves")]
    InvalidMatch {
        /// The participant named on both sides.
        name: String,
    },

    /// The paying participant holds no stars to wager.
    #[error("{name} has no stars to wager (balance {stars})")]
    InsufficientStars {
        /// The participant who would pay.
        name: String,
        /// Their current balance.
        stars: i64,
    },

    /// A registration collides with an existing participant's name.
    #[error("a participant named {name:?} is already registered")]
    DuplicateName {
        /// The colliding display name.
        name: String,
    },

    /// A registration omitted a required field.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The birth date is not a calendar date in `YYYY-MM-DD` form.
    #[error("invalid birth date {value:?}: expected YYYY-MM-DD")]
    InvalidBirthDate {
        /// The text as submitted.
        value: String,
    },

    /// The game type id is not in the catalog.
    #[error("unknown game type: {0}")]
    UnknownGameType(GameTypeId),

    /// No participant has the given id.
    #[error("no participant with id {0}")]
    ParticipantNotFound(ParticipantId),

    /// The bank sentinel cannot be removed.
    #[error("the bank cannot be removed")]
    BankImmutable,

    /// A balance update would leave the `i64` range.
    #[error("star balance overflow for {name}")]
    StarOverflow {
        /// The participant whose balance overflowed.
        name: String,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A star conservation violation detected after a match.
///
/// A valid match moves one star between two participants, so the sum of
/// non-bank balances never changes. This struct captures the drift when it
/// does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarAnomaly {
    /// Non-bank star total before the operation, `None` on overflow.
    pub before: Option<i64>,
    /// Non-bank star total after the operation, `None` on overflow.
    pub after: Option<i64>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for StarAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_participant_lists_all_names() {
        let err = LedgerError::UnknownParticipant {
            names: vec![String::from("Zed"), String::from("Yan")],
        };
        assert_eq!(err.to_string(), "participant not found: Zed, Yan");
    }

    #[test]
    fn insufficient_stars_names_participant() {
        let err = LedgerError::InsufficientStars {
            name: String::from("Bea"),
            stars: 0,
        };
        assert_eq!(err.to_string(), "Bea has no stars to wager (balance 0)");
    }
}
