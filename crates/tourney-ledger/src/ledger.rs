//! The star ledger: the participant registry plus the match log.
//!
//! The [`StarLedger`] is the in-memory state of one tournament. Recording a
//! match is the only multi-step mutation in the system; it validates the
//! whole result first and then applies the star transfer and the log entry
//! together.
//!
//! # Design
//!
//! - **Most-recent-first**: new matches go to the front of the log.
//! - **Never reused ids**: the next match id follows the highest id ever
//!   recorded, not the log length.
//! - **Conservation**: a match never changes the non-bank star total.

use tracing::{error, info};

use tourney_types::{GameType, GameTypeId, Match, MatchId, game_types};

use crate::LedgerError;
use crate::conservation::{ConservationResult, total_stars, verify_conservation};
use crate::processor::validate;
use crate::registry::{Registry, RegistryRules};

// ---------------------------------------------------------------------------
// Match log
// ---------------------------------------------------------------------------

/// Append-only log of recorded matches, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchLog {
    /// Matches, most recent first.
    matches: Vec<Match>,
}

impl MatchLog {
    /// Create an empty match log.
    pub const fn new() -> Self {
        Self {
            matches: Vec::new(),
        }
    }

    /// Wrap matches that are already in most-recent-first order (e.g.
    /// loaded from storage).
    pub const fn from_matches(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    /// Return the number of recorded matches.
    pub const fn len(&self) -> usize {
        self.matches.len()
    }

    /// Return whether no match has been recorded.
    pub const fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// All matches, most recent first.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// The most recently recorded match.
    pub fn latest(&self) -> Option<&Match> {
        self.matches.first()
    }

    /// The id the next recorded match receives.
    pub fn next_id(&self) -> MatchId {
        let highest = self
            .matches
            .iter()
            .filter_map(|m| m.id.sequence())
            .max()
            .unwrap_or(0);
        MatchId::from_sequence(highest.saturating_add(1))
    }

    /// Put a match at the front of the log.
    fn record(&mut self, entry: Match) {
        self.matches.insert(0, entry);
    }
}

// ---------------------------------------------------------------------------
// Star ledger
// ---------------------------------------------------------------------------

/// Registry, match log, and game catalog of one tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarLedger {
    registry: Registry,
    log: MatchLog,
    catalog: Vec<GameType>,
}

impl StarLedger {
    /// Create a ledger over the built-in game catalog.
    pub fn new(registry: Registry, log: MatchLog) -> Self {
        Self {
            registry,
            log,
            catalog: game_types(),
        }
    }

    /// The participant registry.
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The match log.
    pub const fn log(&self) -> &MatchLog {
        &self.log
    }

    /// The game catalog matches are recorded against.
    pub fn catalog(&self) -> &[GameType] {
        &self.catalog
    }

    /// Validate and apply one match result.
    ///
    /// On success the winner gains one star, the loser pays one, and a new
    /// match stamped with `timestamp` is put at the front of the log. On
    /// any error nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownGameType`] for an id outside the
    /// catalog, or any validation error from
    /// [`processor::validate`](crate::processor::validate).
    pub fn record_match(
        &mut self,
        game_type_id: &GameTypeId,
        free_text: &str,
        timestamp: String,
    ) -> Result<Match, LedgerError> {
        let game = self
            .catalog
            .iter()
            .find(|g| &g.id == game_type_id)
            .ok_or_else(|| LedgerError::UnknownGameType(game_type_id.clone()))?;

        let validated = validate(&self.registry, free_text)?;
        let entry = Match {
            id: self.log.next_id(),
            game_type: game.name.clone(),
            game_category: game.category.clone(),
            winner: validated.winner_name.clone(),
            loser: validated.loser_name.clone(),
            timestamp,
        };

        let before = self.registry.clone();
        self.registry.transfer_star(&validated.winner, &validated.loser)?;
        self.log.record(entry.clone());

        if let ConservationResult::Anomaly(anomaly) =
            verify_conservation(before.participants(), self.registry.participants())
        {
            error!(
                match_id = %entry.id,
                before = ?anomaly.before,
                after = ?anomaly.after,
                "{anomaly}"
            );
        }

        info!(
            match_id = %entry.id,
            game_type = %entry.game_type,
            winner = %entry.winner,
            loser = %entry.loser,
            "Match recorded"
        );
        Ok(entry)
    }

    /// Register a new participant. See [`Registry::register`].
    ///
    /// # Errors
    ///
    /// Returns the registry's validation errors unchanged.
    pub fn register(
        &mut self,
        first_name: &str,
        last_name: &str,
        birth_date: &str,
        rules: RegistryRules,
    ) -> Result<tourney_types::Participant, LedgerError> {
        let participant = self
            .registry
            .register(first_name, last_name, birth_date, rules)?;
        info!(
            id = %participant.id,
            name = %participant.name,
            stars = participant.stars,
            "Participant registered"
        );
        Ok(participant)
    }

    /// Remove a participant. See [`Registry::remove`].
    ///
    /// # Errors
    ///
    /// Returns the registry's errors unchanged.
    pub fn remove(
        &mut self,
        id: &tourney_types::ParticipantId,
    ) -> Result<tourney_types::Participant, LedgerError> {
        let removed = self.registry.remove(id)?;
        info!(id = %removed.id, name = %removed.name, "Participant removed");
        Ok(removed)
    }

    /// Non-bank star total, `None` if it overflows `i64`.
    pub fn total_stars(&self) -> Option<i64> {
        total_stars(self.registry.participants())
    }
}
