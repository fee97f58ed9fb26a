//! Loading persisted state, with legacy schema migration and reseeding.
//!
//! Participant records have gone through three shapes:
//!
//! | Version | Fields |
//! |---------|--------|
//! | 1 | `id`, `name`, `stars` |
//! | 2 | `id`, `name`, `stars`, `birthDate` |
//! | 3 | `id`, `firstName`, `lastName`, `birthDate`, `name`, `stars`, `schemaVersion` |
//!
//! Each record's shape is detected here, once, and upgraded to version 3.
//! A collection that does not parse at all is discarded: participants fall
//! back to the default set, matches to an empty log.
//!
//! Removed participant ids are kept in a third record so that a removed
//! default participant is not merged back in on the next load.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use tourney_ledger::{MatchLog, Registry, StarLedger};
use tourney_types::{Match, PARTICIPANT_SCHEMA_VERSION, Participant, ParticipantId};

use crate::store::{StateStore, StorageKey, StoreError};

/// A stored participant in any known schema.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredParticipant {
    /// Version 3 (current).
    Current(Participant),
    /// Versions 1 and 2.
    Legacy(LegacyParticipant),
}

/// Versions 1 and 2 of the participant record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyParticipant {
    id: ParticipantId,
    name: String,
    stars: i64,
    #[serde(default)]
    birth_date: Option<String>,
}

impl LegacyParticipant {
    /// Upgrade to the current schema. The old display name becomes the
    /// first name; the display name itself is kept verbatim.
    fn upgrade(self) -> Participant {
        let birth_date = self
            .birth_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());
        let mut participant = Participant::new(self.id, &self.name, "", birth_date, self.stars);
        participant.name = self.name;
        participant
    }
}

/// What happened while loading persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Nothing was stored; the default set was seeded.
    pub fresh: bool,
    /// Participant records upgraded from a legacy schema.
    pub migrated: usize,
    /// Collections that failed to parse and were replaced.
    pub reseeded: Vec<StorageKey>,
}

impl LoadReport {
    /// Whether the loaded state differs from what is stored and should be
    /// written back.
    pub const fn needs_write_back(&self) -> bool {
        self.fresh || self.migrated > 0 || !self.reseeded.is_empty()
    }
}

/// Parse a participant collection, upgrading legacy records.
///
/// Returns the participants and the number of upgraded records.
///
/// # Errors
///
/// Returns the JSON error if the document is not a list of known records.
pub fn parse_participants(
    document: &str,
) -> Result<(Vec<Participant>, usize), serde_json::Error> {
    let stored: Vec<StoredParticipant> = serde_json::from_str(document)?;
    let mut migrated: usize = 0;
    let participants = stored
        .into_iter()
        .map(|record| match record {
            StoredParticipant::Current(mut p) => {
                if p.schema_version < PARTICIPANT_SCHEMA_VERSION {
                    p.schema_version = PARTICIPANT_SCHEMA_VERSION;
                    migrated = migrated.saturating_add(1);
                }
                p
            }
            StoredParticipant::Legacy(legacy) => {
                migrated = migrated.saturating_add(1);
                legacy.upgrade()
            }
        })
        .collect();
    Ok((participants, migrated))
}

/// Parse a match collection.
///
/// # Errors
///
/// Returns the JSON error if the document is not a list of matches.
pub fn parse_matches(document: &str) -> Result<Vec<Match>, serde_json::Error> {
    serde_json::from_str(document)
}

/// Parse the retired id list.
///
/// # Errors
///
/// Returns the JSON error if the document is not a list of ids.
pub fn parse_retired(document: &str) -> Result<BTreeSet<ParticipantId>, serde_json::Error> {
    serde_json::from_str(document)
}

/// Load the ledger from `store`, merging in the `defaults` that were
/// never removed.
///
/// # Errors
///
/// Returns [`StoreError`] only if the store itself cannot be read; corrupt
/// documents are replaced, not reported as errors.
pub fn load_ledger(
    store: &impl StateStore,
    defaults: &[Participant],
) -> Result<(StarLedger, LoadReport), StoreError> {
    let mut report = LoadReport::default();

    let persisted = match store.read(StorageKey::Participants)? {
        None => {
            report.fresh = true;
            Vec::new()
        }
        Some(document) => match parse_participants(&document) {
            Ok((participants, migrated)) => {
                report.migrated = migrated;
                participants
            }
            Err(e) => {
                warn!(
                    key = %StorageKey::Participants,
                    error = %e,
                    "Corrupt participant records, reseeding defaults"
                );
                report.reseeded.push(StorageKey::Participants);
                Vec::new()
            }
        },
    };

    let matches = match store.read(StorageKey::Matches)? {
        None => Vec::new(),
        Some(document) => parse_matches(&document).unwrap_or_else(|e| {
            warn!(
                key = %StorageKey::Matches,
                error = %e,
                "Corrupt match records, starting an empty log"
            );
            report.reseeded.push(StorageKey::Matches);
            Vec::new()
        }),
    };

    let retired = match store.read(StorageKey::Retired)? {
        None => BTreeSet::new(),
        Some(document) => parse_retired(&document).unwrap_or_else(|e| {
            warn!(
                key = %StorageKey::Retired,
                error = %e,
                "Corrupt retired id list, forgetting removals"
            );
            report.reseeded.push(StorageKey::Retired);
            BTreeSet::new()
        }),
    };

    if report.migrated > 0 {
        info!(migrated = report.migrated, "Legacy participant records upgraded");
    }

    let registry = Registry::reconcile(persisted, defaults, retired);
    debug!(
        participants = registry.len(),
        retired = registry.retired().len(),
        matches = matches.len(),
        fresh = report.fresh,
        "Persisted state loaded"
    );
    Ok((StarLedger::new(registry, MatchLog::from_matches(matches)), report))
}

/// Write every record of `ledger` to `store`. The retired id list is
/// removed from the store when it is empty.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or any write fails.
pub fn save_ledger(store: &impl StateStore, ledger: &StarLedger) -> Result<(), StoreError> {
    let registry = ledger.registry();
    let participants = serde_json::to_string(registry.participants())?;
    let matches = serde_json::to_string(ledger.log().matches())?;
    store.write(StorageKey::Participants, &participants)?;
    store.write(StorageKey::Matches, &matches)?;

    if registry.retired().is_empty() {
        store.remove(StorageKey::Retired)?;
    } else {
        store.write(StorageKey::Retired, &serde_json::to_string(registry.retired())?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::store::MemoryStore;

    use super::*;

    fn defaults() -> Vec<Participant> {
        vec![
            Participant::bank(),
            Participant::new(ParticipantId::from_sequence(1), "Ezequiel", "", None, 4),
        ]
    }

    #[test]
    fn version_one_records_upgrade() {
        let doc = r#"[{"id":"P001","name":"Ezequiel","stars":6}]"#;
        let parsed = parse_participants(doc);
        assert!(parsed.is_ok());
        if let Ok((participants, migrated)) = parsed {
            assert_eq!(migrated, 1);
            let p = participants.first();
            assert_eq!(p.map(|p| p.first_name.as_str()), Some("Ezequiel"));
            assert_eq!(p.map(|p| p.stars), Some(6));
            assert_eq!(p.map(|p| p.schema_version), Some(PARTICIPANT_SCHEMA_VERSION));
        }
    }

    #[test]
    fn version_two_records_keep_birth_date() {
        let doc = r#"[{"id":"P004","name":"Ana Souza","stars":3,"birthDate":"1999-01-31"}]"#;
        let parsed = parse_participants(doc).ok();
        let p = parsed.as_ref().and_then(|(ps, _)| ps.first());
        assert_eq!(p.map(|p| p.name.as_str()), Some("Ana Souza"));
        assert_eq!(p.and_then(|p| p.birth_date), NaiveDate::from_ymd_opt(1999, 1, 31));
    }

    #[test]
    fn current_records_pass_through() {
        let current = Participant::new(ParticipantId::from_sequence(2), "Bea", "Lima", None, 5);
        let doc = serde_json::to_string(&vec![current.clone()]).unwrap_or_default();
        let parsed = parse_participants(&doc);
        assert_eq!(parsed.ok(), Some((vec![current], 0)));
    }

    #[test]
    fn fresh_store_seeds_defaults() {
        let store = MemoryStore::new();
        let loaded = load_ledger(&store, &defaults());
        assert!(loaded.is_ok());
        if let Ok((ledger, report)) = loaded {
            assert!(report.fresh);
            assert!(report.needs_write_back());
            assert_eq!(ledger.registry().len(), 2);
            assert!(ledger.log().is_empty());
        }
    }

    #[test]
    fn corrupt_participants_reseed_defaults() {
        let store = MemoryStore::new();
        let _ = store.write(StorageKey::Participants, "{not json");
        let _ = store.write(StorageKey::Matches, "[]");

        let loaded = load_ledger(&store, &defaults());
        assert!(loaded.is_ok());
        if let Ok((ledger, report)) = loaded {
            assert_eq!(report.reseeded, vec![StorageKey::Participants]);
            assert_eq!(ledger.registry().participants(), defaults().as_slice());
        }
    }

    #[test]
    fn corrupt_matches_start_empty_log() {
        let store = MemoryStore::new();
        let _ = store.write(StorageKey::Participants, "[]");
        let _ = store.write(StorageKey::Matches, r#"[{"id":"G001"}]"#);

        let loaded = load_ledger(&store, &defaults());
        assert!(loaded.is_ok());
        if let Ok((ledger, report)) = loaded {
            assert_eq!(report.reseeded, vec![StorageKey::Matches]);
            assert!(ledger.log().is_empty());
        }
    }

    #[test]
    fn removals_survive_save_and_load() {
        let store = MemoryStore::new();
        let loaded = load_ledger(&store, &defaults());
        assert!(loaded.is_ok());
        let Ok((mut ledger, _)) = loaded else { return };

        assert!(ledger.remove(&ParticipantId::from("P001")).is_ok());
        assert!(save_ledger(&store, &ledger).is_ok());
        assert_eq!(
            store.read(StorageKey::Retired).ok().flatten().as_deref(),
            Some(r#"["P001"]"#)
        );

        let reloaded = load_ledger(&store, &defaults());
        assert!(reloaded.is_ok());
        if let Ok((again, _)) = reloaded {
            assert!(again.registry().find_by_name("Ezequiel").is_none());
            assert_eq!(again, ledger);
        }
    }

    #[test]
    fn empty_retired_list_is_not_stored() {
        let store = MemoryStore::new();
        let _ = store.write(StorageKey::Retired, r#"["P001"]"#);
        let ledger = StarLedger::new(Registry::new(vec![Participant::bank()]), MatchLog::new());

        assert!(save_ledger(&store, &ledger).is_ok());
        assert_eq!(store.read(StorageKey::Retired).ok().flatten(), None);
    }

    #[test]
    fn corrupt_retired_list_is_forgotten() {
        let store = MemoryStore::new();
        let _ = store.write(StorageKey::Participants, "[]");
        let _ = store.write(StorageKey::Retired, "P001");

        let loaded = load_ledger(&store, &defaults());
        assert!(loaded.is_ok());
        if let Ok((ledger, report)) = loaded {
            assert_eq!(report.reseeded, vec![StorageKey::Retired]);
            assert!(ledger.registry().retired().is_empty());
            assert_eq!(ledger.registry().len(), 2);
        }
    }

    #[test]
    fn save_then_load_preserves_state() {
        let store = MemoryStore::new();
        let (mut ledger, _) = load_ledger(&store, &defaults()).unwrap_or_else(|_| {
            (StarLedger::new(Registry::default(), MatchLog::new()), LoadReport::default())
        });
        let rules = tourney_ledger::RegistryRules::default();
        let _ = ledger.register("Bea", "Lima", "2001-05-09", rules);
        let _ = ledger.record_match(
            &tourney_types::GameTypeId::from("M002"),
            "Bea Lima > Ezequiel",
            String::from("17/10/2026, 10:00:00"),
        );
        assert!(save_ledger(&store, &ledger).is_ok());

        let reloaded = load_ledger(&store, &defaults());
        assert!(reloaded.is_ok());
        if let Ok((again, report)) = reloaded {
            assert!(!report.needs_write_back());
            assert_eq!(again, ledger);
        }
    }
}
