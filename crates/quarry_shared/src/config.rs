//! # World Configuration
//!
//! Fixed world parameters, supplied once before the first chunk is generated.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file)
//! gives the stock world. Each `[blocks.<key>]` table replaces or adds one
//! entry of the stock block registry; the other stock blocks stay.
//!
//! ```toml
//! chunk_size = 16
//! world_height = 48
//! world_width = 64
//! world_depth = 64
//! seed = 12345
//! feature_placement = "entropy"
//!
//! [terrain]
//! sea_level = 10
//! snow_level = 20
//!
//! [blocks.stone]
//! id = 2
//! name = "Granite"
//!
//! [blocks.snow]
//! id = 9
//! name = "Snow"
//! ```

use std::path::Path;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::block::{BlockRegistry, BlockType};
use crate::error::{ConfigError, ConfigResult};

/// Upper bound for `chunk_size` and the horizontal world extent.
pub const MAX_CHUNK_SIZE: u32 = 1024;

/// Upper bound for `world_height`.
pub const MAX_WORLD_HEIGHT: u32 = 1024;

/// Where ore and tree placement draws its randomness from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeaturePlacement {
    /// Fresh OS entropy per chunk. Ore and trees differ between runs.
    #[default]
    Entropy,
    /// Derived from the seed and chunk coordinates. Fully reproducible.
    Seeded,
}

/// Terrain shaping constants.
///
/// Defaults reproduce the stock world. `cave_surface_margin` and
/// `tree_headroom` are coupled through the surface height; change them
/// together or not at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Horizontal frequency of the biome noise.
    pub biome_scale: f64,
    /// Octaves of the biome noise.
    pub biome_octaves: u32,
    /// Biome samples strictly below this are desert.
    pub desert_threshold: f64,
    /// Biome samples strictly above this are mountain.
    pub mountain_threshold: f64,
    /// Horizontal frequency of the height noise.
    pub terrain_scale: f64,
    /// Octaves of the height noise.
    pub terrain_octaves: u32,
    /// Base height for a noise sample of -1.
    pub base_height_min: f64,
    /// Base height for a noise sample of 1.
    pub base_height_max: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub gain: f64,
    /// Frequency of the 3D cave noise.
    pub cave_scale: f64,
    /// Octaves of the cave noise.
    pub cave_octaves: u32,
    /// Cave noise above this carves air.
    pub cave_threshold: f64,
    /// Caves never reach within this many blocks of the surface.
    pub cave_surface_margin: u32,
    /// Thickness of the subsurface layer under the surface block.
    pub subsurface_depth: u32,
    /// Empty cells below this level fill with water.
    pub sea_level: u32,
    /// Mountain surfaces at or above this level get snow.
    pub snow_level: u32,
    /// Ore only appears this many blocks below the surface.
    pub ore_depth: u32,
    /// Per-cell ore probability.
    pub ore_chance: f64,
    /// Per-column tree probability in forests.
    pub tree_chance: f64,
    /// Trees need the surface this far below the world top.
    pub tree_headroom: u32,
    /// Shortest tree, counting the foliage block.
    pub tree_min_height: u32,
    /// Tallest tree, counting the foliage block.
    pub tree_max_height: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            biome_scale: 0.005,
            biome_octaves: 4,
            desert_threshold: -0.3,
            mountain_threshold: 0.3,
            terrain_scale: 0.05,
            terrain_octaves: 6,
            base_height_min: 4.0,
            base_height_max: 28.0,
            lacunarity: 2.0,
            gain: 0.5,
            cave_scale: 0.1,
            cave_octaves: 4,
            cave_threshold: 0.5,
            cave_surface_margin: 1,
            subsurface_depth: 3,
            sea_level: 10,
            snow_level: 20,
            ore_depth: 5,
            ore_chance: 0.001,
            tree_chance: 0.015,
            tree_headroom: 5,
            tree_min_height: 3,
            tree_max_height: 5,
        }
    }
}

impl TerrainParams {
    /// Checks every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        positive_scale("terrain.biome_scale", self.biome_scale)?;
        positive_scale("terrain.terrain_scale", self.terrain_scale)?;
        positive_scale("terrain.cave_scale", self.cave_scale)?;
        positive_scale("terrain.lacunarity", self.lacunarity)?;
        positive_scale("terrain.gain", self.gain)?;

        nonzero("terrain.biome_octaves", self.biome_octaves)?;
        nonzero("terrain.terrain_octaves", self.terrain_octaves)?;
        nonzero("terrain.cave_octaves", self.cave_octaves)?;

        probability("terrain.ore_chance", self.ore_chance)?;
        probability("terrain.tree_chance", self.tree_chance)?;

        if self.desert_threshold.is_nan()
            || self.mountain_threshold.is_nan()
            || self.desert_threshold > self.mountain_threshold
        {
            return Err(invalid(
                "terrain.desert_threshold",
                "must not exceed mountain_threshold",
            ));
        }
        if !(self.base_height_min.is_finite()
            && self.base_height_max.is_finite()
            && self.base_height_min <= self.base_height_max)
        {
            return Err(invalid(
                "terrain.base_height_min",
                "must be finite and not exceed base_height_max",
            ));
        }
        if self.tree_min_height == 0 {
            return Err(invalid("terrain.tree_min_height", "must be at least 1"));
        }
        if self.tree_min_height > self.tree_max_height {
            return Err(invalid(
                "terrain.tree_min_height",
                "must not exceed tree_max_height",
            ));
        }

        Ok(())
    }
}

/// The complete world configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Chunk width and depth in blocks.
    pub chunk_size: u32,
    /// World height in blocks.
    pub world_height: u32,
    /// Nominal world width in blocks, used to find the spawn column.
    pub world_width: u32,
    /// Nominal world depth in blocks, used to find the spawn column.
    pub world_depth: u32,
    /// World generation seed. Must fit in an `i32`; the lattice hash is
    /// 32-bit.
    pub seed: i64,
    /// Randomness source for ore and trees.
    pub feature_placement: FeaturePlacement,
    /// Spawn position used when the spawn column has no solid ground.
    pub spawn_fallback: [f64; 3],
    /// Terrain shaping constants.
    pub terrain: TerrainParams,
    /// Block-type registry: the stock blocks plus any configured overrides.
    #[serde(deserialize_with = "stock_blocks_with_overrides")]
    pub blocks: BlockRegistry,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            world_height: 48,
            world_width: 64,
            world_depth: 64,
            seed: 12345,
            feature_placement: FeaturePlacement::Entropy,
            spawn_fallback: [32.5, 11.0, 32.5],
            terrain: TerrainParams::default(),
            blocks: BlockRegistry::default(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, or any error from
    /// [`Self::validate`].
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks the configuration once, before any chunk is generated.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(invalid(
                "chunk_size",
                format!("must be in 1..={MAX_CHUNK_SIZE}"),
            ));
        }
        if self.world_height == 0 || self.world_height > MAX_WORLD_HEIGHT {
            return Err(invalid(
                "world_height",
                format!("must be in 1..={MAX_WORLD_HEIGHT}"),
            ));
        }
        if self.world_width == 0 {
            return Err(invalid("world_width", "must be positive"));
        }
        if self.world_depth == 0 {
            return Err(invalid("world_depth", "must be positive"));
        }
        self.lattice_seed()?;
        if self.spawn_fallback.iter().any(|v| !v.is_finite()) {
            return Err(invalid("spawn_fallback", "must be finite"));
        }

        self.terrain.validate()?;
        self.blocks.validate()
    }

    /// The seed as the 32-bit key the noise lattice uses.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the seed is outside `i32` range.
    pub fn lattice_seed(&self) -> ConfigResult<i32> {
        i32::try_from(self.seed).map_err(|_| {
            invalid(
                "seed",
                format!("must be in {}..={}, got {}", i32::MIN, i32::MAX, self.seed),
            )
        })
    }

    /// World column at the horizontal center, where players spawn.
    #[must_use]
    pub const fn center_column(&self) -> (i32, i32) {
        ((self.world_width / 2) as i32, (self.world_depth / 2) as i32)
    }

    /// Chunk containing the world center.
    #[must_use]
    pub const fn center_chunk(&self) -> (i32, i32) {
        (
            (self.world_width / 2 / self.chunk_size) as i32,
            (self.world_depth / 2 / self.chunk_size) as i32,
        )
    }
}

fn stock_blocks_with_overrides<'de, D>(deserializer: D) -> Result<BlockRegistry, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<String, BlockType>::deserialize(deserializer)?;
    Ok(BlockRegistry::default().with_overrides(overrides))
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive_scale(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and positive, got {value}")))
    }
}

fn nonzero(field: &'static str, value: u32) -> ConfigResult<()> {
    if value == 0 {
        Err(invalid(field, "must be at least 1"))
    } else {
        Ok(())
    }
}

fn probability(field: &'static str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must be in [0, 1], got {value}")))
    }
}
