//! The ledger engine: process-wide tournament state with an explicit
//! lifecycle.
//!
//! A [`LedgerEngine`] is constructed from a [`StateStore`] at startup,
//! flushes both records after every mutation, and notifies subscribers.
//!
//! # Mutation protocol
//!
//! 1. Clone the current [`StarLedger`] and apply the operation to the copy.
//! 2. Write the copy through the store.
//! 3. Swap the copy in and broadcast a [`LedgerEvent`].
//!
//! A validation failure stops at step 1 and a storage failure at step 2;
//! either way the engine's state is exactly what it was before the call.
//!
//! # Several views
//!
//! Two engines over the same store (a control panel and a display) converge
//! by last-writer-wins: after being told another view wrote, a view calls
//! [`LedgerEngine::reload`] and adopts the stored state.

use std::fmt::Write as _;

use chrono::Local;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use tourney_ledger::stats::{self, GameStat, PlayerStat};
use tourney_ledger::{MatchLog, Registry, RegistryRules, StarLedger};
use tourney_types::{GameTypeId, Match, Participant, ParticipantId};

use crate::config::TourneyConfig;
use crate::error::EngineError;
use crate::export::export_csv;
use crate::migrate::{LoadReport, load_ledger, save_ledger};
use crate::store::StateStore;

/// Capacity of the change notification channel.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and should reload.
const EVENT_CAPACITY: usize = 64;

/// A committed change to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A match was recorded.
    MatchRecorded {
        /// The new match.
        entry: Match,
    },
    /// A participant was registered.
    ParticipantRegistered {
        /// The new participant.
        participant: Participant,
    },
    /// A participant was removed.
    ParticipantRemoved {
        /// The removed participant.
        participant: Participant,
    },
    /// The tournament was reset to the minimal seed.
    Reset,
    /// State was reloaded from the store.
    Reloaded,
}

/// Engine settings taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Default participant set merged into persisted state.
    pub defaults: Vec<Participant>,
    /// Registration rules.
    pub rules: RegistryRules,
    /// `chrono` format for match timestamps.
    pub timestamp_format: String,
    /// Number of participants on the podium.
    pub podium_size: usize,
}

impl From<&TourneyConfig> for EngineSettings {
    fn from(config: &TourneyConfig) -> Self {
        Self {
            defaults: config.rules.default_participants(),
            rules: config.rules.registry_rules(),
            timestamp_format: config.display.timestamp_format.clone(),
            podium_size: config.display.podium_size,
        }
    }
}

/// Owner of all tournament state transitions.
pub struct LedgerEngine<S: StateStore> {
    ledger: StarLedger,
    store: S,
    settings: EngineSettings,
    events: broadcast::Sender<LedgerEvent>,
}

impl<S: StateStore> LedgerEngine<S> {
    /// Load state from `store` and construct the engine.
    ///
    /// Legacy records are upgraded and corrupt records replaced; when that
    /// happens, or on first run, the normalized state is written back.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store cannot be read or the
    /// write-back fails.
    pub fn open(store: S, settings: EngineSettings) -> Result<Self, EngineError> {
        let (ledger, report) = load_ledger(&store, &settings.defaults)?;
        if report.needs_write_back() {
            save_ledger(&store, &ledger)?;
            debug!(?report, "Normalized state written back");
        }
        info!(
            participants = ledger.registry().len(),
            matches = ledger.log().len(),
            "Ledger engine ready"
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            ledger,
            store,
            settings,
            events,
        })
    }

    /// The current ledger state.
    pub const fn ledger(&self) -> &StarLedger {
        &self.ledger
    }

    /// The store this engine writes through.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Receive a [`LedgerEvent`] after every committed change.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Record a match stamped with the current local time.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TimestampFormat`] if the configured format
    /// cannot be rendered, otherwise see [`LedgerEngine::record_match_at`].
    pub fn record_match(
        &mut self,
        game_type_id: &GameTypeId,
        free_text: &str,
    ) -> Result<Match, EngineError> {
        let mut timestamp = String::new();
        write!(timestamp, "{}", Local::now().format(&self.settings.timestamp_format)).map_err(
            |_fmt| EngineError::TimestampFormat {
                format: self.settings.timestamp_format.clone(),
            },
        )?;
        self.record_match_at(game_type_id, free_text, timestamp)
    }

    /// Record a match with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Ledger`] if the result is rejected and
    /// [`EngineError::Store`] if it cannot be persisted. Either way nothing
    /// changes.
    pub fn record_match_at(
        &mut self,
        game_type_id: &GameTypeId,
        free_text: &str,
        timestamp: String,
    ) -> Result<Match, EngineError> {
        let mut next = self.ledger.clone();
        let entry = next
            .record_match(game_type_id, free_text, timestamp)
            .inspect_err(|e| {
                warn!(game_type = %game_type_id, input = free_text, error = %e, "Match rejected");
            })?;
        self.commit(next, LedgerEvent::MatchRecorded {
            entry: entry.clone(),
        })?;
        Ok(entry)
    }

    /// Register a new participant with the configured starting balance.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Ledger`] for missing fields, an invalid birth
    /// date, or a duplicate name, and [`EngineError::Store`] on a failed
    /// write.
    pub fn register(
        &mut self,
        first_name: &str,
        last_name: &str,
        birth_date: &str,
    ) -> Result<Participant, EngineError> {
        let mut next = self.ledger.clone();
        let participant = next
            .register(first_name, last_name, birth_date, self.settings.rules)
            .inspect_err(|e| warn!(error = %e, "Registration rejected"))?;
        self.commit(next, LedgerEvent::ParticipantRegistered {
            participant: participant.clone(),
        })?;
        Ok(participant)
    }

    /// Remove a participant. The caller is responsible for confirming.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Ledger`] for the bank or an unknown id, and
    /// [`EngineError::Store`] on a failed write.
    pub fn remove(&mut self, id: &ParticipantId) -> Result<Participant, EngineError> {
        let mut next = self.ledger.clone();
        let participant = next.remove(id)?;
        self.commit(next, LedgerEvent::ParticipantRemoved {
            participant: participant.clone(),
        })?;
        Ok(participant)
    }

    /// Reset to the minimal seed: the bank alone and an empty log.
    /// Irreversible; the caller is responsible for confirming.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on a failed write.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        let next = StarLedger::new(Registry::new(vec![Participant::bank()]), MatchLog::new());
        self.commit(next, LedgerEvent::Reset)?;
        info!("Tournament reset");
        Ok(())
    }

    /// Adopt whatever is currently stored, discarding in-memory state.
    ///
    /// Call this after another view has written. Returns whether the
    /// state changed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store cannot be read.
    pub fn reload(&mut self) -> Result<bool, EngineError> {
        let (ledger, report): (StarLedger, LoadReport) =
            load_ledger(&self.store, &self.settings.defaults)?;
        if ledger == self.ledger {
            return Ok(false);
        }
        debug!(?report, "Adopting stored state");
        self.ledger = ledger;
        self.notify(LedgerEvent::Reloaded);
        Ok(true)
    }

    /// Flush `next`, then make it current and notify.
    fn commit(&mut self, next: StarLedger, event: LedgerEvent) -> Result<(), EngineError> {
        if let Err(e) = save_ledger(&self.store, &next) {
            // The first record may already hold `next`; put the current
            // state back so the two records agree again.
            if let Err(restore) = save_ledger(&self.store, &self.ledger) {
                warn!(error = %restore, "Failed to restore persisted state after a failed write");
            }
            return Err(e.into());
        }
        self.ledger = next;
        self.notify(event);
        Ok(())
    }

    fn notify(&self, event: LedgerEvent) {
        if self.events.send(event).is_err() {
            debug!("No subscribers for ledger event");
        }
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    /// Competing participants ranked by stars.
    pub fn standings(&self) -> Vec<&Participant> {
        stats::standings(self.ledger.registry())
    }

    /// The top of the standings, sized by configuration.
    pub fn podium(&self) -> Vec<&Participant> {
        stats::podium(self.ledger.registry(), self.settings.podium_size)
    }

    /// The most recently recorded match.
    pub fn latest_match(&self) -> Option<&Match> {
        stats::latest_match(self.ledger.log())
    }

    /// Match counts per game type.
    pub fn game_statistics(&self) -> Vec<GameStat> {
        stats::game_statistics(self.ledger.log())
    }

    /// Win/loss records per participant.
    pub fn player_statistics(&self) -> Vec<PlayerStat> {
        stats::player_statistics(self.ledger.registry(), self.ledger.log())
    }

    /// Look up a participant by display name, ignoring case.
    pub fn find_participant(&self, name: &str) -> Option<&Participant> {
        self.ledger.registry().find_by_name(name)
    }

    /// Render the CSV export.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Export`] if rendering fails.
    pub fn export_csv(&self) -> Result<String, EngineError> {
        Ok(export_csv(&self.ledger)?)
    }
}

impl<S: StateStore> core::fmt::Debug for LedgerEngine<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("participants", &self.ledger.registry().len())
            .field("matches", &self.ledger.log().len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

