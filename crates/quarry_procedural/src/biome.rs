//! # Biome Classification
//!
//! Determines the terrain type of a column from one low-frequency noise
//! sample. Biomes are never stored; they are recomputed whenever needed.

use quarry_shared::{BlockId, BlockRegistry, ConfigResult, TerrainParams};

/// Biome types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Biome {
    /// Flat sand dunes (sample < desert threshold)
    Desert = 0,
    /// Grassy hills with trees
    Forest = 1,
    /// Tall bare stone, snow on the peaks (sample > mountain threshold)
    Mountain = 2,
}

impl Biome {
    /// Classifies a biome noise sample.
    ///
    /// Both thresholds are strict: a sample exactly on a threshold is forest.
    #[must_use]
    pub fn classify(sample: f64, params: &TerrainParams) -> Self {
        if sample < params.desert_threshold {
            Self::Desert
        } else if sample > params.mountain_threshold {
            Self::Mountain
        } else {
            Self::Forest
        }
    }

    /// Scale applied to the base terrain height.
    #[must_use]
    pub const fn height_multiplier(self) -> f64 {
        match self {
            Self::Desert => 0.5,
            Self::Forest => 1.0,
            Self::Mountain => 1.5,
        }
    }

    /// Returns whether this biome can have trees.
    #[must_use]
    pub const fn has_trees(self) -> bool {
        matches!(self, Self::Forest)
    }
}

/// Block ids the composer places, resolved from the registry once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerrainPalette {
    /// Empty space.
    pub air: BlockId,
    /// Forest subsurface.
    pub dirt: BlockId,
    /// Deep fill and mountain surface.
    pub stone: BlockId,
    /// Forest surface.
    pub grass: BlockId,
    /// Desert surface and subsurface.
    pub sand: BlockId,
    /// Fill below sea level.
    pub water: BlockId,
    /// Rare ore.
    pub quantum: BlockId,
    /// Mountain peaks at or above snow level.
    pub snow: BlockId,
    /// Tree trunk.
    pub trunk: BlockId,
    /// Block on top of a trunk.
    pub foliage: BlockId,
}

impl TerrainPalette {
    /// Resolves the palette from the block registry.
    ///
    /// `snow`, `wood` and `leaves` are optional keys. Without them peaks and
    /// trunks are stone and foliage is dirt.
    ///
    /// # Errors
    ///
    /// Returns [`quarry_shared::ConfigError::MissingBlock`] if a required
    /// block is not registered.
    pub fn from_registry(blocks: &BlockRegistry) -> ConfigResult<Self> {
        let stone = blocks.require("stone")?;
        let dirt = blocks.require("dirt")?;

        Ok(Self {
            air: blocks.require("air")?,
            dirt,
            stone,
            grass: blocks.require("grass")?,
            sand: blocks.require("sand")?,
            water: blocks.require("water")?,
            quantum: blocks.require("quantum")?,
            snow: blocks.id_of("snow").unwrap_or(stone),
            trunk: blocks.id_of("wood").unwrap_or(stone),
            foliage: blocks.id_of("leaves").unwrap_or(dirt),
        })
    }

    /// Surface and subsurface block for a biome.
    #[must_use]
    pub const fn layers(&self, biome: Biome) -> (BlockId, BlockId) {
        match biome {
            Biome::Desert => (self.sand, self.sand),
            Biome::Forest => (self.grass, self.dirt),
            Biome::Mountain => (self.stone, self.stone),
        }
    }
}

impl Default for TerrainPalette {
    fn default() -> Self {
        Self {
            air: BlockId::AIR,
            dirt: BlockId::DIRT,
            stone: BlockId::STONE,
            grass: BlockId::GRASS,
            sand: BlockId::SAND,
            water: BlockId::WATER,
            quantum: BlockId::QUANTUM,
            snow: BlockId::STONE,
            trunk: BlockId::STONE,
            foliage: BlockId::DIRT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_strict() {
        let params = TerrainParams::default();

        assert_eq!(Biome::classify(-0.3, &params), Biome::Forest);
        assert_eq!(Biome::classify(0.3, &params), Biome::Forest);
        assert_eq!(Biome::classify(-0.300_000_1, &params), Biome::Desert);
        assert_eq!(Biome::classify(0.300_000_1, &params), Biome::Mountain);
        assert_eq!(Biome::classify(0.0, &params), Biome::Forest);
    }

    #[test]
    fn test_height_multipliers() {
        assert_eq!(Biome::Desert.height_multiplier(), 0.5);
        assert_eq!(Biome::Forest.height_multiplier(), 1.0);
        assert_eq!(Biome::Mountain.height_multiplier(), 1.5);
    }

    #[test]
    fn test_biome_layers() {
        let palette = TerrainPalette::default();

        assert_eq!(palette.layers(Biome::Desert), (BlockId::SAND, BlockId::SAND));
        assert_eq!(palette.layers(Biome::Forest), (BlockId::GRASS, BlockId::DIRT));
        assert_eq!(palette.layers(Biome::Mountain), (BlockId::STONE, BlockId::STONE));
    }

    #[test]
    fn test_palette_from_default_registry() {
        let palette = TerrainPalette::from_registry(&BlockRegistry::default())
            .expect("default registry has every block");
        assert_eq!(palette, TerrainPalette::default());
    }

    #[test]
    fn test_palette_uses_optional_blocks() {
        let defaults = BlockRegistry::default();
        let mut types: Vec<_> = defaults
            .iter()
            .map(|(key, t)| (key.to_owned(), t.clone()))
            .collect();
        types.push((
            "snow".to_owned(),
            quarry_shared::BlockType::solid(BlockId::new(9), "Snow", 0xFF_FF_FF, 0.2),
        ));

        let palette = TerrainPalette::from_registry(&BlockRegistry::from_types(types))
            .expect("valid registry");
        assert_eq!(palette.snow, BlockId::new(9));
        assert_eq!(palette.trunk, BlockId::STONE);
    }
}
