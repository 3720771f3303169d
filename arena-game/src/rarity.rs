//! Item rarity tiers
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality tier of a pulled item, ordered by ascending value band.
///
/// The ordering is presentational only; reward logic never compares rarities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
    Champion,
}

impl Rarity {
    /// Every rarity in display order.
    pub const ALL: [Self; 5] = [
        Self::Common,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
        Self::Champion,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
            Self::Champion => "Champion",
        }
    }

    /// Position in [`Rarity::ALL`], handy for fixed-size tallies.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Common => 0,
            Self::Rare => 1,
            Self::Epic => 2,
            Self::Legendary => 3,
            Self::Champion => 4,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
