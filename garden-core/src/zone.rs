//! The emotion zones of the garden.
//!
//! Eight immutable zones, one per emotion, each with a palette, a tree
//! archetype and the decorative objects that populate it. Lookups are total:
//! anything unrecognised lands in the Tranquil Dell (peace).

use crate::color::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The emotions a memory can be tagged with, in zone order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Love,
    Surprise,
    Peace,
    Nostalgia,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Love,
        Emotion::Surprise,
        Emotion::Peace,
        Emotion::Nostalgia,
    ];

    /// Number of zones in the garden.
    pub const COUNT: usize = Self::ALL.len();

    /// The lowercase key used in prompts and form data.
    pub fn key(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Love => "love",
            Emotion::Surprise => "surprise",
            Emotion::Peace => "peace",
            Emotion::Nostalgia => "nostalgia",
        }
    }

    /// Parse a key, ignoring case and surrounding whitespace.
    pub fn parse(key: &str) -> Option<Emotion> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.key().eq_ignore_ascii_case(key))
    }

    /// Parse a key, falling back to [`Emotion::Peace`].
    pub fn from_key_or_default(key: &str) -> Emotion {
        Self::parse(key).unwrap_or_default()
    }

    /// Position of this zone around the ring (0..8).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Emotion at a ring index, wrapping around.
    pub fn from_index(index: usize) -> Emotion {
        Self::ALL[index % Self::COUNT]
    }
}

impl Default for Emotion {
    fn default() -> Self {
        Emotion::Peace
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Colors that theme a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub text: Rgb,
}

/// The kind of tree a zone grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeArchetype {
    CherryBlossom,
    WeepingWillow,
    GnarledOak,
    TwistedPine,
    Dogwood,
    Bioluminescent,
    Bonsai,
    AncientOak,
}

impl TreeArchetype {
    pub fn name(&self) -> &'static str {
        match self {
            TreeArchetype::CherryBlossom => "cherry blossom",
            TreeArchetype::WeepingWillow => "weeping willow",
            TreeArchetype::GnarledOak => "gnarled oak",
            TreeArchetype::TwistedPine => "twisted pine",
            TreeArchetype::Dogwood => "dogwood",
            TreeArchetype::Bioluminescent => "bioluminescent",
            TreeArchetype::Bonsai => "bonsai",
            TreeArchetype::AncientOak => "ancient oak",
        }
    }
}

/// A themed region of the garden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub emotion: Emotion,
    pub display_name: &'static str,
    pub palette: Palette,
    pub tree_archetype: TreeArchetype,
    pub object_tags: &'static [&'static str],
}

impl Zone {
    /// The zone for an emotion.
    pub fn of(emotion: Emotion) -> &'static Zone {
        &ZONES[emotion.index()]
    }
}

const fn palette(primary: u32, secondary: u32, accent: u32, text: u32) -> Palette {
    Palette {
        primary: Rgb::from_hex(primary),
        secondary: Rgb::from_hex(secondary),
        accent: Rgb::from_hex(accent),
        text: Rgb::from_hex(text),
    }
}

/// All zones, indexed by [`Emotion::index`].
pub static ZONES: [Zone; Emotion::COUNT] = [
    Zone {
        emotion: Emotion::Joy,
        display_name: "Sunlight Grove",
        palette: palette(0xFFD700, 0x98FB98, 0xFFC0CB, 0x333333),
        tree_archetype: TreeArchetype::CherryBlossom,
        object_tags: &[
            "butterflies",
            "hammocks",
            "swings",
            "sunbeams",
            "birds",
            "sparkles",
            "fruit_trees",
        ],
    },
    Zone {
        emotion: Emotion::Sadness,
        display_name: "Misty Hollow",
        palette: palette(0x4682B4, 0x708090, 0x9370DB, 0xFFFFFF),
        tree_archetype: TreeArchetype::WeepingWillow,
        object_tags: &[
            "benches",
            "rain_puddles",
            "lanterns",
            "fog",
            "falling_leaves",
            "books",
            "candles",
        ],
    },
    Zone {
        emotion: Emotion::Anger,
        display_name: "Ember Grove",
        palette: palette(0xDC143C, 0x8B0000, 0xFF4500, 0xFFFFFF),
        tree_archetype: TreeArchetype::GnarledOak,
        object_tags: &[
            "smoldering_rocks",
            "cracked_earth",
            "lightning_rods",
            "wind",
            "charred_stumps",
            "aggressive_winds",
        ],
    },
    Zone {
        emotion: Emotion::Fear,
        display_name: "Shadow Glade",
        palette: palette(0x483D8B, 0x2F4F4F, 0x191970, 0xFFFFFF),
        tree_archetype: TreeArchetype::TwistedPine,
        object_tags: &[
            "flickering_lights",
            "crows",
            "hollow_logs",
            "wind_chimes",
            "dark_caves",
            "owls",
            "eerie_sounds",
        ],
    },
    Zone {
        emotion: Emotion::Love,
        display_name: "Heartbloom Meadow",
        palette: palette(0xFF69B4, 0xDDA0DD, 0xFF1493, 0xFFFFFF),
        tree_archetype: TreeArchetype::Dogwood,
        object_tags: &[
            "vines",
            "doves",
            "picnic_blankets",
            "roses",
            "lovebirds",
            "trellises",
            "heart_leaves",
        ],
    },
    Zone {
        emotion: Emotion::Surprise,
        display_name: "Enchanted Grove",
        palette: palette(0x9932CC, 0x40E0D0, 0xFFD700, 0xFFFFFF),
        tree_archetype: TreeArchetype::Bioluminescent,
        object_tags: &[
            "floating_lanterns",
            "sparkles",
            "crystals",
            "glowing_mushrooms",
            "glowworms",
            "rainbow_trees",
            "light_pulses",
        ],
    },
    Zone {
        emotion: Emotion::Peace,
        display_name: "Tranquil Dell",
        palette: palette(0x98FB98, 0xF5F5DC, 0xE0FFFF, 0x333333),
        tree_archetype: TreeArchetype::Bonsai,
        object_tags: &[
            "streams",
            "stone_paths",
            "koi_ponds",
            "wind_chimes",
            "zen_gardens",
            "soft_bells",
            "olive_trees",
        ],
    },
    Zone {
        emotion: Emotion::Nostalgia,
        display_name: "Timeworn Terrace",
        palette: palette(0xDAA520, 0xD2B48C, 0xCD853F, 0x8B4513),
        tree_archetype: TreeArchetype::AncientOak,
        object_tags: &[
            "old_swings",
            "vintage_clocks",
            "photo_frames",
            "autumn_leaves",
            "memory_fragments",
            "weathered_benches",
        ],
    },
];

/// Look up a zone by emotion key. Unknown keys resolve to the peace zone.
pub fn lookup(key: &str) -> &'static Zone {
    Zone::of(Emotion::from_key_or_default(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_emotion() {
        for (i, zone) in ZONES.iter().enumerate() {
            assert_eq!(zone.emotion.index(), i);
            assert_eq!(Emotion::from_index(i), zone.emotion);
        }
    }

    #[test]
    fn test_lookup_known_keys() {
        assert_eq!(lookup("joy").display_name, "Sunlight Grove");
        assert_eq!(lookup("sadness").palette.primary, Rgb::from_hex(0x4682B4));
        assert_eq!(lookup(" Nostalgia ").emotion, Emotion::Nostalgia);
    }

    #[test]
    fn test_lookup_falls_back_to_peace() {
        assert_eq!(lookup("default").emotion, Emotion::Peace);
        assert_eq!(lookup("").emotion, Emotion::Peace);
        assert_eq!(lookup("boredom").display_name, "Tranquil Dell");
    }

    #[test]
    fn test_every_zone_has_objects() {
        for zone in &ZONES {
            assert!(!zone.object_tags.is_empty(), "{} has no objects", zone.emotion);
        }
    }

    #[test]
    fn test_serde_uses_keys() {
        let json = serde_json::to_string(&Emotion::Surprise).unwrap();
        assert_eq!(json, "\"surprise\"");
        let back: Emotion = serde_json::from_str("\"love\"").unwrap();
        assert_eq!(back, Emotion::Love);
    }
}
