//! Parsing and validation of free-text match results.
//!
//! A result is written `"Winner > Loser"`. Validation runs every check
//! against a read-only [`Registry`] and produces a [`ValidatedMatch`];
//! nothing is mutated until the whole result has been accepted.

use tourney_types::ParticipantId;

use crate::LedgerError;
use crate::registry::Registry;

/// Separator between the winner and loser names.
const RESULT_SEPARATOR: char = '>';

/// A result that passed every check and can be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMatch {
    /// The participant gaining a star.
    pub winner: ParticipantId,
    /// Winner display name at validation time.
    pub winner_name: String,
    /// The participant paying a star.
    pub loser: ParticipantId,
    /// Loser display name at validation time.
    pub loser_name: String,
}

/// Split a result on the first `>` into trimmed winner and loser names.
///
/// # Errors
///
/// Returns [`LedgerError::MalformedResult`] if there is no `>` or either
/// side is empty after trimming.
pub fn parse_result(free_text: &str) -> Result<(&str, &str), LedgerError> {
    let malformed = || LedgerError::MalformedResult {
        input: free_text.to_owned(),
    };

    let (winner, loser) = free_text.split_once(RESULT_SEPARATOR).ok_or_else(malformed)?;
    let (winner, loser) = (winner.trim(), loser.trim());
    if winner.is_empty() || loser.is_empty() {
        return Err(malformed());
    }
    Ok((winner, loser))
}

/// Validate a result against the registry.
///
/// Checks, in order: the text parses, both names resolve, the two sides
/// are different participants, and the loser holds at least one star.
/// The winner's balance is not checked.
///
/// # Errors
///
/// Returns [`LedgerError::MalformedResult`], [`LedgerError::UnknownParticipant`]
/// (listing every name that failed), [`LedgerError::InvalidMatch`], or
/// [`LedgerError::InsufficientStars`].
pub fn validate(registry: &Registry, free_text: &str) -> Result<ValidatedMatch, LedgerError> {
    let (winner_text, loser_text) = parse_result(free_text)?;

    let winner = registry.find_by_name(winner_text);
    let loser = registry.find_by_name(loser_text);

    let (winner, loser) = match (winner, loser) {
        (Some(w), Some(l)) => (w, l),
        (w, l) => {
            let names = [(w, winner_text), (l, loser_text)]
                .into_iter()
                .filter(|(resolved, _)| resolved.is_none())
                .map(|(_, text)| text.to_owned())
                .collect();
            return Err(LedgerError::UnknownParticipant { names });
        }
    };

    if winner.id == loser.id {
        return Err(LedgerError::InvalidMatch {
            name: winner.name.clone(),
        });
    }

    if loser.stars <= 0 {
        return Err(LedgerError::InsufficientStars {
            name: loser.name.clone(),
            stars: loser.stars,
        });
    }

    Ok(ValidatedMatch {
        winner: winner.id.clone(),
        winner_name: winner.name.clone(),
        loser: loser.id.clone(),
        loser_name: loser.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use tourney_types::Participant;

    use super::*;

    fn registry() -> Registry {
        Registry::new(vec![
            Participant::bank(),
            Participant::new(ParticipantId::from_sequence(1), "Ana", "", None, 10),
            Participant::new(ParticipantId::from_sequence(2), "Bea", "", None, 0),
            Participant::new(ParticipantId::from_sequence(3), "Caio", "Reis", None, -2),
        ])
    }

    #[test]
    fn parse_splits_on_first_separator() {
        assert_eq!(parse_result("Ana > Bea"), Ok(("Ana", "Bea")));
        assert_eq!(parse_result("  Ana>Bea  "), Ok(("Ana", "Bea")));
        assert_eq!(parse_result("Caio Reis > Ana"), Ok(("Caio Reis", "Ana")));
        assert_eq!(parse_result("Ana > > Bea"), Ok(("Ana", "> Bea")));
    }

    #[test]
    fn parse_rejects_missing_separator_or_side() {
        for input in ["OnlyOneName", "Ana >", "> Bea", "  >  ", ""] {
            assert!(
                matches!(parse_result(input), Err(LedgerError::MalformedResult { .. })),
                "expected malformed for {input:?}"
            );
        }
    }

    #[test]
    fn validate_resolves_case_insensitively() {
        let result = validate(&registry(), "ana > caio reis");
        // Caio holds negative stars, Ana wins from him: rejected on balance.
        assert!(matches!(result, Err(LedgerError::InsufficientStars { .. })));

        let reg = Registry::new(vec![
            Participant::new(ParticipantId::from_sequence(1), "Ana", "", None, 1),
            Participant::new(ParticipantId::from_sequence(2), "Bea", "", None, 1),
        ]);
        let ok = validate(&reg, "ANA > bea");
        assert!(ok.is_ok());
        if let Ok(m) = ok {
            assert_eq!(m.winner_name, "Ana");
            assert_eq!(m.loser_name, "Bea");
        }
    }

    #[test]
    fn validate_names_every_unknown_side() {
        let result = validate(&registry(), "Zed > Yan");
        assert_eq!(
            result,
            Err(LedgerError::UnknownParticipant {
                names: vec![String::from("Zed"), String::from("Yan")],
            })
        );

        let result = validate(&registry(), "Ana > Yan");
        assert_eq!(
            result,
            Err(LedgerError::UnknownParticipant {
                names: vec![String::from("Yan")],
            })
        );
    }

    #[test]
    fn bank_never_resolves() {
        let result = validate(&registry(), "Banco > Ana");
        assert!(matches!(result, Err(LedgerError::UnknownParticipant { .. })));
    }

    #[test]
    fn self_match_rejected() {
        let result = validate(&registry(), "Ana > ana");
        assert_eq!(
            result,
            Err(LedgerError::InvalidMatch {
                name: String::from("Ana"),
            })
        );
    }

    #[test]
    fn loser_without_stars_rejected() {
        let result = validate(&registry(), "Ana > Bea");
        assert_eq!(
            result,
            Err(LedgerError::InsufficientStars {
                name: String::from("Bea"),
                stars: 0,
            })
        );
    }

    #[test]
    fn winner_without_stars_may_win() {
        let result = validate(&registry(), "Bea > Ana");
        assert!(result.is_ok());
    }
}
