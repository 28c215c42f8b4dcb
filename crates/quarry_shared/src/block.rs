//! # Block Types
//!
//! Block identifiers and the registry describing them.
//!
//! The generator only cares about ids. Everything else in a [`BlockType`]
//! (color, break time, transparency) is carried for the client and is never
//! interpreted here.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// A block identifier.
///
/// `0` is always air. Stored as a single byte so a chunk buffer can be sent
/// as-is.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize,
    Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct BlockId(pub u8);

impl BlockId {
    /// Air block (empty).
    pub const AIR: Self = Self(0);
    /// Dirt block.
    pub const DIRT: Self = Self(1);
    /// Stone block.
    pub const STONE: Self = Self(2);
    /// Glass block.
    pub const GLASS: Self = Self(3);
    /// Quantum block, the rare ore.
    pub const QUANTUM: Self = Self(4);
    /// Teleport block.
    pub const TELEPORT: Self = Self(5);
    /// Grass block.
    pub const GRASS: Self = Self(6);
    /// Sand block.
    pub const SAND: Self = Self(7);
    /// Water block.
    pub const WATER: Self = Self(8);

    /// Creates a block id from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns true if this is an air block.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Special behaviour attached to a block type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockSpecial {
    /// Moves the player when touched.
    Teleport,
    /// Fluid the player can wade through.
    Liquid,
}

/// Properties of one block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockType {
    /// Block id.
    pub id: BlockId,
    /// Display name.
    pub name: String,
    /// RGB color as `0xRRGGBB`.
    #[serde(default)]
    pub color: u32,
    /// Whether light passes through.
    #[serde(default)]
    pub transparent: bool,
    /// Whether a player can move through it.
    #[serde(default)]
    pub walkable: bool,
    /// Seconds to break, `None` if unbreakable.
    #[serde(default)]
    pub break_time: Option<f32>,
    /// Render opacity for transparent blocks.
    #[serde(default)]
    pub opacity: Option<f32>,
    /// Whether the block emits light.
    #[serde(default)]
    pub glow: bool,
    /// Special behaviour.
    #[serde(default)]
    pub special: Option<BlockSpecial>,
}

impl BlockType {
    /// Creates an opaque, solid block type with no extras.
    #[must_use]
    pub fn solid(id: BlockId, name: &str, color: u32, break_time: f32) -> Self {
        Self {
            id,
            name: name.to_owned(),
            color,
            transparent: false,
            walkable: false,
            break_time: Some(break_time),
            opacity: None,
            glow: false,
            special: None,
        }
    }
}

/// Keys the terrain generator resolves at startup.
pub const REQUIRED_BLOCKS: [&str; 7] = ["air", "dirt", "stone", "quantum", "grass", "sand", "water"];

/// The block-type registry, keyed by block key (`"stone"`, `"water"`, ...).
///
/// Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockRegistry {
    types: BTreeMap<String, BlockType>,
}

impl BlockRegistry {
    /// Builds a registry from `(key, type)` pairs.
    #[must_use]
    pub fn from_types<I, K>(types: I) -> Self
    where
        I: IntoIterator<Item = (K, BlockType)>,
        K: Into<String>,
    {
        Self {
            types: types.into_iter().map(|(k, t)| (k.into(), t)).collect(),
        }
    }

    /// Replaces or adds the given `(key, type)` pairs, keeping every other
    /// entry.
    #[must_use]
    pub fn with_overrides<I, K>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = (K, BlockType)>,
        K: Into<String>,
    {
        self.types.extend(types.into_iter().map(|(k, t)| (k.into(), t)));
        self
    }

    /// Looks up a block type by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BlockType> {
        self.types.get(key)
    }

    /// Looks up the id registered under `key`.
    #[must_use]
    pub fn id_of(&self, key: &str) -> Option<BlockId> {
        self.types.get(key).map(|t| t.id)
    }

    /// Like [`Self::id_of`], but a missing key is a configuration error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBlock`] if `key` is not registered.
    pub fn require(&self, key: &str) -> ConfigResult<BlockId> {
        self.id_of(key)
            .ok_or_else(|| ConfigError::MissingBlock(key.to_owned()))
    }

    /// Finds the block type with the given id.
    #[must_use]
    pub fn by_id(&self, id: BlockId) -> Option<&BlockType> {
        self.types.values().find(|t| t.id == id)
    }

    /// Number of registered block types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no block types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates `(key, type)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BlockType)> {
        self.types.iter().map(|(k, t)| (k.as_str(), t))
    }

    /// Checks the registry is usable by the generator.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingBlock`] if a required key is absent
    /// - [`ConfigError::Invalid`] if `air` is not id 0
    /// - [`ConfigError::DuplicateBlockId`] if two keys share an id
    pub fn validate(&self) -> ConfigResult<()> {
        for key in REQUIRED_BLOCKS {
            self.require(key)?;
        }

        if self.id_of("air") != Some(BlockId::AIR) {
            return Err(ConfigError::Invalid {
                field: "blocks.air.id",
                reason: "air must have id 0".to_owned(),
            });
        }

        let mut seen: BTreeMap<BlockId, &str> = BTreeMap::new();
        for (key, block) in self.iter() {
            if let Some(first) = seen.insert(block.id, key) {
                return Err(ConfigError::DuplicateBlockId {
                    id: block.id.value(),
                    first: first.to_owned(),
                    second: key.to_owned(),
                });
            }
        }

        Ok(())
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        let glass = BlockType {
            transparent: true,
            opacity: Some(0.5),
            ..BlockType::solid(BlockId::GLASS, "Glass", 0x88_CC_FF, 0.3)
        };
        let quantum = BlockType {
            glow: true,
            ..BlockType::solid(BlockId::QUANTUM, "Quantum Block", 0xAA_00_FF, 2.0)
        };
        let teleport = BlockType {
            transparent: true,
            opacity: Some(0.7),
            special: Some(BlockSpecial::Teleport),
            ..BlockType::solid(BlockId::TELEPORT, "Teleport Block", 0x00_FF_AA, 1.5)
        };
        let water = BlockType {
            transparent: true,
            walkable: true,
            break_time: None,
            opacity: Some(0.7),
            special: Some(BlockSpecial::Liquid),
            ..BlockType::solid(BlockId::WATER, "Water", 0x34_98_DB, 0.0)
        };
        let air = BlockType {
            transparent: true,
            walkable: true,
            break_time: None,
            ..BlockType::solid(BlockId::AIR, "Air", 0x00_00_00, 0.0)
        };

        Self::from_types([
            ("air", air),
            ("dirt", BlockType::solid(BlockId::DIRT, "Dirt", 0x8B_45_13, 0.5)),
            ("stone", BlockType::solid(BlockId::STONE, "Stone", 0x88_88_88, 1.0)),
            ("glass", glass),
            ("quantum", quantum),
            ("teleport", teleport),
            ("grass", BlockType::solid(BlockId::GRASS, "Grass", 0x4C_AF_50, 0.5)),
            ("sand", BlockType::solid(BlockId::SAND, "Sand", 0xF9_E0_76, 0.4)),
            ("water", water),
        ])
    }
}
