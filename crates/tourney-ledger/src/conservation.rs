//! Star conservation verification.
//!
//! A match moves exactly one star from the loser to the winner, so the sum
//! of all non-bank balances must be identical before and after. The bank's
//! balance is fixed and stays out of the sum.
//!
//! ```text
//! sum(non-bank stars before match) == sum(non-bank stars after match)
//! ```
//!
//! The check passes by construction for valid transfers; a violation means
//! the state was corrupted and produces a [`StarAnomaly`].

use tourney_types::Participant;

use crate::StarAnomaly;

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// The totals match.
    Balanced,
    /// The totals differ or could not be computed.
    Anomaly(StarAnomaly),
}

/// Sum the balances of every non-bank participant.
///
/// Returns `None` if the sum overflows `i64`.
pub fn total_stars(participants: &[Participant]) -> Option<i64> {
    participants
        .iter()
        .filter(|p| !p.is_bank())
        .try_fold(0_i64, |acc, p| acc.checked_add(p.stars))
}

/// Compare non-bank star totals before and after an operation.
pub fn verify_conservation(before: &[Participant], after: &[Participant]) -> ConservationResult {
    let total_before = total_stars(before);
    let total_after = total_stars(after);

    match (total_before, total_after) {
        (Some(b), Some(a)) if b == a => ConservationResult::Balanced,
        (Some(b), Some(a)) => ConservationResult::Anomaly(StarAnomaly {
            before: Some(b),
            after: Some(a),
            message: format!("STAR_ANOMALY: non-bank total moved from {b} to {a}"),
        }),
        (b, a) => ConservationResult::Anomaly(StarAnomaly {
            before: b,
            after: a,
            message: String::from("STAR_ANOMALY: arithmetic overflow while summing stars"),
        }),
    }
}
