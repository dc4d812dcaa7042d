//! Block material identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespaced block material, e.g. `minecraft:wheat`
///
/// Names are stored lowercase and a bare name gets the `minecraft:` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BlockKind(String);

impl BlockKind {
    /// Create a block kind from a namespaced or bare material name
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim().to_lowercase();
        if name.contains(':') {
            Self(name)
        } else {
            Self(format!("minecraft:{name}"))
        }
    }

    /// Get the namespaced name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Crops that visitors with container trust may plant and harvest
    pub fn default_farmable() -> Vec<BlockKind> {
        [
            "pumpkin_stem",
            "wheat",
            "melon_stem",
            "carrots",
            "potatoes",
            "nether_wart",
            "beetroots",
        ]
        .into_iter()
        .map(Self::new)
        .collect()
    }

    /// Materials an attacker may break inside a besieged claim
    pub fn default_siege_breakable() -> Vec<BlockKind> {
        [
            "dirt",
            "grass_block",
            "short_grass",
            "fern",
            "dead_bush",
            "cobblestone",
            "gravel",
            "sand",
            "glass",
            "glass_pane",
            "oak_planks",
            "spruce_planks",
            "birch_planks",
            "jungle_planks",
            "acacia_planks",
            "dark_oak_planks",
            "white_wool",
            "snow",
            "snow_block",
        ]
        .into_iter()
        .map(Self::new)
        .collect()
    }
}

impl From<String> for BlockKind {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for BlockKind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<BlockKind> for String {
    fn from(value: BlockKind) -> Self {
        value.0
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
