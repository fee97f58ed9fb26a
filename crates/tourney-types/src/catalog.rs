//! The built-in game type catalog.
//!
//! Game types are fixed for the lifetime of the process. Matches copy the
//! name and category at recording time, so the catalog can change between
//! releases without touching history.

use crate::ids::GameTypeId;
use crate::structs::GameType;

/// `(id, name, category)` for every game type in the catalog.
const GAME_TYPES: [(&str, &str, &str); 10] = [
    ("M001", "FIFA 24", "Esporte"),
    ("M002", "Truco", "Cartas"),
    ("M003", "Just Dance", "Dança"),
    ("M004", "Sinuca", "Mesa"),
    ("M005", "Tênis de Mesa", "Esporte"),
    ("M006", "Mario Kart", "Corrida"),
    ("M007", "Uno", "Cartas"),
    ("M008", "Pebolim", "Mesa"),
    ("M009", "Damas", "Tabuleiro"),
    ("M010", "Street Fighter", "Luta"),
];

/// Return the full catalog in id order.
pub fn game_types() -> Vec<GameType> {
    GAME_TYPES
        .iter()
        .map(|&(id, name, category)| GameType {
            id: GameTypeId::from(id),
            name: name.to_owned(),
            category: category.to_owned(),
        })
        .collect()
}
