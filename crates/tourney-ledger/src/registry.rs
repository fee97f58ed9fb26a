//! The participant registry: identities, display names, and star balances.
//!
//! The registry keeps participants in insertion order. That order matters:
//! ranking is a stable sort, so participants tied on stars keep the order
//! in which they entered the registry.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::warn;

use tourney_types::{Participant, ParticipantId, compose_name};

use crate::LedgerError;

/// Format accepted for birth dates at registration.
const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Rules applied when registering new participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryRules {
    /// Star balance a newly registered participant starts with.
    pub starting_stars: i64,
}

impl Default for RegistryRules {
    fn default() -> Self {
        Self { starting_stars: 4 }
    }
}

/// The authoritative set of participants and their balances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    /// Participants in insertion order.
    participants: Vec<Participant>,
    /// Ids of removed participants. Never reassigned, and defaults with
    /// these ids are not merged back in.
    retired: BTreeSet<ParticipantId>,
}

impl Registry {
    /// Create a registry from participants in the given order.
    pub const fn new(participants: Vec<Participant>) -> Self {
        Self {
            participants,
            retired: BTreeSet::new(),
        }
    }

    /// Merge a persisted registry with the default participant set.
    ///
    /// Every default whose id is absent from `persisted` and not in
    /// `retired` is appended after the persisted entries. Persisted entries
    /// are never overwritten. Duplicate ids inside `persisted` keep their
    /// first occurrence. Calling this again with the same inputs changes
    /// nothing.
    pub fn reconcile(
        persisted: Vec<Participant>,
        defaults: &[Participant],
        retired: BTreeSet<ParticipantId>,
    ) -> Self {
        let mut seen: BTreeSet<ParticipantId> = BTreeSet::new();
        let mut participants = Vec::with_capacity(persisted.len().saturating_add(defaults.len()));

        for participant in persisted {
            if seen.insert(participant.id.clone()) {
                participants.push(participant);
            } else {
                warn!(id = %participant.id, "dropping persisted participant with duplicate id");
            }
        }

        for default in defaults {
            if !retired.contains(&default.id) && seen.insert(default.id.clone()) {
                participants.push(default.clone());
            }
        }

        Self {
            participants,
            retired,
        }
    }

    /// Return the number of participants, bank included.
    pub const fn len(&self) -> usize {
        self.participants.len()
    }

    /// Return whether the registry holds no participants at all.
    pub const fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// All participants in registry order, bank included.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Ids of removed participants, see [`Registry::reconcile`].
    pub const fn retired(&self) -> &BTreeSet<ParticipantId> {
        &self.retired
    }

    /// Look up a participant by id.
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    /// Resolve a display name, case-insensitively, to a competing
    /// participant. The bank never resolves.
    pub fn find_by_name(&self, name: &str) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| !p.is_bank() && p.name_matches(name))
    }

    /// Register a new participant.
    ///
    /// All three fields are required. The composed display name must not
    /// collide, ignoring case, with any competing participant. The new id
    /// is `P` followed by the competing-participant count plus one; if
    /// that id is in use or retired, the next free number is taken.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] for an empty field,
    /// [`LedgerError::InvalidBirthDate`] if the birth date does not parse,
    /// and [`LedgerError::DuplicateName`] on a name collision.
    pub fn register(
        &mut self,
        first_name: &str,
        last_name: &str,
        birth_date: &str,
        rules: RegistryRules,
    ) -> Result<Participant, LedgerError> {
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        let birth_date = birth_date.trim();

        if first_name.is_empty() {
            return Err(LedgerError::MissingField("first name"));
        }
        if last_name.is_empty() {
            return Err(LedgerError::MissingField("last name"));
        }
        if birth_date.is_empty() {
            return Err(LedgerError::MissingField("birth date"));
        }

        let birth_date =
            NaiveDate::parse_from_str(birth_date, BIRTH_DATE_FORMAT).map_err(|_parse| {
                LedgerError::InvalidBirthDate {
                    value: birth_date.to_owned(),
                }
            })?;

        let name = compose_name(first_name, last_name);
        if self.find_by_name(&name).is_some() {
            return Err(LedgerError::DuplicateName { name });
        }

        let participant = Participant::new(
            self.next_id(),
            first_name,
            last_name,
            Some(birth_date),
            rules.starting_stars,
        );
        self.participants.push(participant.clone());
        Ok(participant)
    }

    /// Remove a participant by id and retire the id. Recorded matches keep
    /// their copies of the participant's name.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BankImmutable`] for the bank and
    /// [`LedgerError::ParticipantNotFound`] for an unknown id.
    pub fn remove(&mut self, id: &ParticipantId) -> Result<Participant, LedgerError> {
        let position = self
            .participants
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| LedgerError::ParticipantNotFound(id.clone()))?;

        if self.participants.get(position).is_some_and(Participant::is_bank) {
            return Err(LedgerError::BankImmutable);
        }

        let removed = self.participants.remove(position);
        self.retired.insert(removed.id.clone());
        Ok(removed)
    }

    /// Participants sorted by stars, highest first.
    ///
    /// The sort is stable: equal balances keep registry order, so a given
    /// history always produces the same podium.
    pub fn rank(&self) -> Vec<&Participant> {
        let mut ranked: Vec<&Participant> = self.participants.iter().collect();
        ranked.sort_by(|a, b| b.stars.cmp(&a.stars));
        ranked
    }

    /// Move one star from `loser` to `winner`.
    ///
    /// Both new balances are computed before either is written, so an
    /// overflow leaves both untouched.
    pub(crate) fn transfer_star(
        &mut self,
        winner: &ParticipantId,
        loser: &ParticipantId,
    ) -> Result<(), LedgerError> {
        let winner_stars = self.checked_balance(winner, 1)?;
        let loser_stars = self.checked_balance(loser, -1)?;

        for participant in &mut self.participants {
            if &participant.id == winner {
                participant.stars = winner_stars;
            } else if &participant.id == loser {
                participant.stars = loser_stars;
            }
        }
        Ok(())
    }

    /// The balance of `id` after adding `delta`, checked for overflow.
    fn checked_balance(&self, id: &ParticipantId, delta: i64) -> Result<i64, LedgerError> {
        let participant = self
            .get(id)
            .ok_or_else(|| LedgerError::ParticipantNotFound(id.clone()))?;
        participant
            .stars
            .checked_add(delta)
            .ok_or_else(|| LedgerError::StarOverflow {
                name: participant.name.clone(),
            })
    }

    /// The id the next registration receives.
    fn next_id(&self) -> ParticipantId {
        let competing = self.participants.iter().filter(|p| !p.is_bank()).count();
        let mut n = u32::try_from(competing).unwrap_or(u32::MAX).saturating_add(1);
        loop {
            let candidate = ParticipantId::from_sequence(n);
            let taken = self.get(&candidate).is_some() || self.retired.contains(&candidate);
            if !taken || n == u32::MAX {
                return candidate;
            }
            n = n.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(n: u32, name: &str, stars: i64) -> Participant {
        Participant::new(ParticipantId::from_sequence(n), name, "", None, stars)
    }

    fn ids(participants: &[&Participant]) -> Vec<String> {
        participants.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn reconcile_appends_missing_defaults() {
        let persisted = vec![participant(2, "Paulo", 7), participant(1, "Ezequiel", 1)];
        let defaults = vec![
            Participant::bank(),
            participant(1, "Ezequiel", 4),
            participant(3, "Marina", 4),
        ];

        let registry = Registry::reconcile(persisted, &defaults, BTreeSet::new());
        let order: Vec<&str> = registry.participants().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["P002", "P001", "P000", "P003"]);

        // Persisted balance wins over the default.
        let ezequiel = registry.get(&ParticipantId::from("P001"));
        assert_eq!(ezequiel.map(|p| p.stars), Some(1));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let persisted = vec![participant(1, "Ana", 3)];
        let defaults = vec![Participant::bank(), participant(2, "Bea", 4)];

        let once = Registry::reconcile(persisted, &defaults, BTreeSet::new());
        let twice =
            Registry::reconcile(once.participants().to_vec(), &defaults, once.retired().clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn reconcile_drops_duplicate_persisted_ids() {
        let persisted = vec![participant(1, "Ana", 3), participant(1, "Impostor", 9)];
        let registry = Registry::reconcile(persisted, &[], BTreeSet::new());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.participants().first().map(|p| p.name.as_str()), Some("Ana"));
    }

    #[test]
    fn register_assigns_sequential_id_and_starting_stars() {
        let mut registry = Registry::new(vec![Participant::bank(), participant(1, "Ana", 4)]);
        let rules = RegistryRules { starting_stars: 10 };
        let result = registry.register("Bea", "Lima", "2001-05-09", rules);

        assert!(result.is_ok());
        if let Ok(p) = result {
            assert_eq!(p.id.as_str(), "P002");
            assert_eq!(p.name, "Bea Lima");
            assert_eq!(p.stars, 10);
            assert_eq!(p.birth_date, NaiveDate::from_ymd_opt(2001, 5, 9));
        }
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn registered_participant_resolves_in_any_case() {
        let mut registry = Registry::new(vec![Participant::bank()]);
        let _ = registry.register("Ana", "Souza", "1999-01-31", RegistryRules::default());

        assert!(registry.find_by_name("ana souza").is_some());
        assert!(registry.find_by_name("ANA SOUZA").is_some());
        assert!(registry.find_by_name("Ana Souza").is_some());
    }

    #[test]
    fn duplicate_name_rejected_ignoring_case() {
        let mut registry = Registry::new(vec![Participant::bank()]);
        let first = registry.register("Ana", "Souza", "1999-01-31", RegistryRules::default());
        assert!(first.is_ok());

        let second = registry.register("ana", "SOUZA", "2000-02-02", RegistryRules::default());
        assert!(matches!(second, Err(LedgerError::DuplicateName { .. })));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn missing_fields_rejected() {
        let mut registry = Registry::new(vec![Participant::bank()]);
        let rules = RegistryRules::default();

        assert_eq!(
            registry.register("  ", "Souza", "1999-01-31", rules),
            Err(LedgerError::MissingField("first name"))
        );
        assert_eq!(
            registry.register("Ana", "", "1999-01-31", rules),
            Err(LedgerError::MissingField("last name"))
        );
        assert_eq!(
            registry.register("Ana", "Souza", "", rules),
            Err(LedgerError::MissingField("birth date"))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_birth_date_rejected() {
        let mut registry = Registry::new(vec![Participant::bank()]);
        let result = registry.register("Ana", "Souza", "31/01/1999", RegistryRules::default());
        assert!(matches!(result, Err(LedgerError::InvalidBirthDate { .. })));
    }

    #[test]
    fn bank_name_does_not_block_registration() {
        let mut registry = Registry::new(vec![Participant::bank()]);
        let result = registry.register("Banco", "Central", "1990-01-01", RegistryRules::default());
        assert!(result.is_ok());
    }

    #[test]
    fn register_after_removal_skips_taken_id() {
        let mut registry = Registry::new(vec![
            Participant::bank(),
            participant(1, "Ana", 4),
            participant(2, "Bea", 4),
            participant(3, "Caio", 4),
        ]);
        assert!(registry.remove(&ParticipantId::from("P002")).is_ok());

        let result = registry.register("Duda", "Reis", "2002-02-02", RegistryRules::default());
        assert_eq!(result.map(|p| p.id.to_string()), Ok(String::from("P004")));
    }

    #[test]
    fn removed_default_stays_removed_after_reconcile() {
        let defaults = vec![
            Participant::bank(),
            participant(1, "Ana", 4),
            participant(2, "Bea", 4),
        ];
        let mut registry = Registry::reconcile(Vec::new(), &defaults, BTreeSet::new());
        assert!(registry.remove(&ParticipantId::from("P002")).is_ok());
        assert!(registry.retired().contains(&ParticipantId::from("P002")));

        let reloaded = Registry::reconcile(
            registry.participants().to_vec(),
            &defaults,
            registry.retired().clone(),
        );
        assert!(reloaded.find_by_name("Bea").is_none());
        assert_eq!(reloaded, registry);
    }

    #[test]
    fn retired_ids_are_not_reassigned() {
        let mut registry = Registry::new(vec![
            Participant::bank(),
            participant(1, "Ana", 4),
            participant(2, "Bea", 4),
        ]);
        assert!(registry.remove(&ParticipantId::from("P002")).is_ok());

        let result = registry.register("Duda", "Reis", "2002-02-02", RegistryRules::default());
        assert_eq!(result.map(|p| p.id.to_string()), Ok(String::from("P003")));
    }

    #[test]
    fn remove_rejects_bank_and_unknown_ids() {
        let mut registry = Registry::new(vec![Participant::bank(), participant(1, "Ana", 4)]);

        assert_eq!(
            registry.remove(&ParticipantId::from("P000")),
            Err(LedgerError::BankImmutable)
        );
        assert!(matches!(
            registry.remove(&ParticipantId::from("P009")),
            Err(LedgerError::ParticipantNotFound(_))
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn rank_is_stable_under_equal_balances() {
        let registry = Registry::new(vec![
            participant(1, "A", 5),
            participant(2, "B", 5),
            participant(3, "C", 3),
        ]);
        assert_eq!(ids(&registry.rank()), vec!["P001", "P002", "P003"]);

        let reversed = Registry::new(vec![
            participant(3, "C", 3),
            participant(2, "B", 5),
            participant(1, "A", 5),
        ]);
        assert_eq!(ids(&reversed.rank()), vec!["P002", "P001", "P003"]);
    }

    #[test]
    fn transfer_star_moves_exactly_one() {
        let mut registry =
            Registry::new(vec![participant(1, "Ana", 10), participant(2, "Bea", 10)]);
        let result =
            registry.transfer_star(&ParticipantId::from("P001"), &ParticipantId::from("P002"));
        assert!(result.is_ok());
        assert_eq!(registry.find_by_name("Ana").map(|p| p.stars), Some(11));
        assert_eq!(registry.find_by_name("Bea").map(|p| p.stars), Some(9));
    }

    #[test]
    fn transfer_overflow_leaves_balances_untouched() {
        let mut registry =
            Registry::new(vec![participant(1, "Ana", i64::MAX), participant(2, "Bea", 3)]);
        let result =
            registry.transfer_star(&ParticipantId::from("P001"), &ParticipantId::from("P002"));
        assert!(matches!(result, Err(LedgerError::StarOverflow { .. })));
        assert_eq!(registry.find_by_name("Bea").map(|p| p.stars), Some(3));
    }
}
