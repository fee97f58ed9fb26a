//! Sequential, prefixed identifiers for participants, matches, and game types.
//!
//! Identifiers are stored as strings (`P001`, `G042`, `M010`) because that is
//! how they appear in persisted records and in the export. The numeric part
//! is zero-padded to three digits and keeps growing past `999`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around a prefixed sequential identifier.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// The single-letter prefix every identifier of this kind carries.
            pub const PREFIX: char = $prefix;

            /// Build the identifier for sequence number `n` (`1` -> `X001`).
            pub fn from_sequence(n: u32) -> Self {
                Self(format!("{}{n:03}", Self::PREFIX))
            }

            /// Return the numeric part, or `None` if the identifier does not
            /// follow the prefixed sequential shape.
            pub fn sequence(&self) -> Option<u32> {
                self.0.strip_prefix(Self::PREFIX)?.parse().ok()
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Identifier of a participant (`P001`). `P000` is reserved for the bank.
    ParticipantId, 'P'
}

define_id! {
    /// Identifier of a recorded match (`G001`). Never reused.
    MatchId, 'G'
}

define_id! {
    /// Identifier of a game type in the static catalog (`M001`).
    GameTypeId, 'M'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_zero_padded() {
        assert_eq!(ParticipantId::from_sequence(1).as_str(), "P001");
        assert_eq!(MatchId::from_sequence(42).as_str(), "G042");
        assert_eq!(GameTypeId::from_sequence(1000).as_str(), "M1000");
    }

    #[test]
    fn sequence_parses_back() {
        assert_eq!(MatchId::from("G017").sequence(), Some(17));
        assert_eq!(ParticipantId::from("P000").sequence(), Some(0));
        assert_eq!(MatchId::from("X017").sequence(), None);
        assert_eq!(MatchId::from("Gabc").sequence(), None);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&ParticipantId::from("P007")).ok();
        assert_eq!(json.as_deref(), Some("\"P007\""));

        let restored: Result<MatchId, _> = serde_json::from_str("\"G003\"");
        assert_eq!(restored.ok(), Some(MatchId::from("G003")));
    }

    #[test]
    fn display_matches_inner_string() {
        let id = GameTypeId::from("M004");
        assert_eq!(id.to_string(), "M004");
    }
}
