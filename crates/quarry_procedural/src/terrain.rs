//! # Terrain Composer
//!
//! Turns chunk coordinates into a fully populated chunk.
//!
//! ## Pipeline (per column)
//!
//! 1. Biome from low-frequency 2D fBm
//! 2. Surface height from higher-frequency 2D fBm, scaled per biome
//! 3. Vertical fill: stone, subsurface, water up to sea level, air above
//! 4. Caves carved by 3D fBm, never within the surface margin
//! 5. Quantum ore scattered deep underground
//! 6. Surface block (snow on high mountains)
//! 7. Trees in forests
//!
//! Steps 1-4 and 6 are pure functions of the seed. Steps 5 and 7 draw from
//! the scatter RNG, whose source is chosen by [`FeaturePlacement`].

use quarry_shared::{BlockId, ConfigResult, FeaturePlacement, TerrainParams, WorldConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::biome::{Biome, TerrainPalette};
use crate::chunk::{Chunk, ChunkKey};
use crate::chunk_store::ChunkSource;
use crate::noise::{NoiseField, WorldSeed};

/// Sub-seed stream for seeded ore and tree placement.
const SCATTER_STREAM: u64 = 0x5CA7;

/// The seeded part of one column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnProfile {
    /// Raw biome noise sample.
    pub biome_sample: f64,
    /// Biome classified from the sample.
    pub biome: Biome,
    /// Surface height H: the y of the surface block.
    pub surface_height: usize,
}

/// Chunk generator using procedural noise.
#[derive(Clone, Debug)]
pub struct TerrainComposer {
    noise: NoiseField,
    seed: WorldSeed,
    params: TerrainParams,
    palette: TerrainPalette,
    placement: FeaturePlacement,
    chunk_size: usize,
    world_height: usize,
}

impl TerrainComposer {
    /// Creates a composer for a world configuration.
    ///
    /// # Errors
    ///
    /// Returns the configuration's validation error, if any.
    pub fn new(config: &WorldConfig) -> ConfigResult<Self> {
        config.validate()?;
        let palette = TerrainPalette::from_registry(&config.blocks)?;
        let seed = WorldSeed::from_lattice_key(config.lattice_seed()?);

        Ok(Self {
            noise: NoiseField::new(seed),
            seed,
            params: config.terrain.clone(),
            palette,
            placement: config.feature_placement,
            chunk_size: config.chunk_size as usize,
            world_height: config.world_height as usize,
        })
    }

    /// Chunk width and depth in blocks.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// World height in blocks.
    #[must_use]
    pub const fn world_height(&self) -> usize {
        self.world_height
    }

    /// Terrain shaping constants.
    #[must_use]
    pub const fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Block ids this composer places.
    #[must_use]
    pub const fn palette(&self) -> &TerrainPalette {
        &self.palette
    }

    /// Raw biome noise at a world column.
    #[must_use]
    pub fn biome_sample(&self, world_x: i32, world_z: i32) -> f64 {
        let p = &self.params;
        self.noise.fbm_2d(
            f64::from(world_x) * p.biome_scale,
            f64::from(world_z) * p.biome_scale,
            p.biome_octaves,
            p.lacunarity,
            p.gain,
        )
    }

    /// Biome and surface height of a world column.
    #[must_use]
    pub fn column_profile(&self, world_x: i32, world_z: i32) -> ColumnProfile {
        let p = &self.params;
        let biome_sample = self.biome_sample(world_x, world_z);
        let biome = Biome::classify(biome_sample, p);

        let terrain = self.noise.fbm_2d(
            f64::from(world_x) * p.terrain_scale,
            f64::from(world_z) * p.terrain_scale,
            p.terrain_octaves,
            p.lacunarity,
            p.gain,
        );
        // [-1, 1] -> [base_height_min, base_height_max]
        let base = (terrain + 1.0) * 0.5 * (p.base_height_max - p.base_height_min)
            + p.base_height_min;
        let top = (self.world_height - 1) as f64;
        let surface_height = (base * biome.height_multiplier()).floor().clamp(0.0, top) as usize;

        ColumnProfile {
            biome_sample,
            biome,
            surface_height,
        }
    }

    /// Cave noise at a world cell. Above `cave_threshold` carves air.
    #[must_use]
    pub fn cave_sample(&self, world_x: i32, y: usize, world_z: i32) -> f64 {
        let p = &self.params;
        self.noise.fbm_3d(
            f64::from(world_x) * p.cave_scale,
            y as f64 * p.cave_scale,
            f64::from(world_z) * p.cave_scale,
            p.cave_octaves,
            p.lacunarity,
            p.gain,
        )
    }

    /// Generates a chunk at the given coordinates.
    #[must_use]
    pub fn compose(&self, key: ChunkKey) -> Chunk {
        let mut chunk = Chunk::empty(key, self.chunk_size, self.world_height);
        let mut rng = self.scatter_rng(key);

        let size = self.chunk_size as i32;
        let origin_x = key.world_x(size);
        let origin_z = key.world_z(size);

        for local_x in 0..self.chunk_size {
            let world_x = origin_x.wrapping_add(local_x as i32);
            for local_z in 0..self.chunk_size {
                let world_z = origin_z.wrapping_add(local_z as i32);

                let profile = self.column_profile(world_x, world_z);
                self.fill_column(
                    chunk.column_mut(local_x, local_z),
                    &profile,
                    world_x,
                    world_z,
                    &mut rng,
                );
            }
        }

        chunk
    }

    /// RNG for ore and trees in one chunk.
    fn scatter_rng(&self, key: ChunkKey) -> ChaCha8Rng {
        match self.placement {
            FeaturePlacement::Entropy => ChaCha8Rng::from_entropy(),
            FeaturePlacement::Seeded => {
                let packed = (u64::from(key.x as u32) << 32) | u64::from(key.z as u32);
                ChaCha8Rng::seed_from_u64(self.seed.derive(SCATTER_STREAM).derive(packed).value())
            }
        }
    }

    /// Fills one column, bottom to top.
    fn fill_column(
        &self,
        column: &mut [BlockId],
        profile: &ColumnProfile,
        world_x: i32,
        world_z: i32,
        rng: &mut ChaCha8Rng,
    ) {
        let p = &self.params;
        let palette = &self.palette;
        let height = profile.surface_height;
        let (surface, subsurface) = palette.layers(profile.biome);

        let stone_top = height.saturating_sub(p.subsurface_depth as usize);
        let cave_ceiling = height.saturating_sub(p.cave_surface_margin as usize);
        let ore_ceiling = height.saturating_sub(p.ore_depth as usize);
        let sea_level = p.sea_level as usize;

        for (y, cell) in column.iter_mut().enumerate() {
            *cell = if y < height {
                let mut block = if y < stone_top { palette.stone } else { subsurface };
                if y < cave_ceiling && self.cave_sample(world_x, y, world_z) > p.cave_threshold {
                    block = palette.air;
                }
                if y < ore_ceiling && rng.gen::<f64>() < p.ore_chance {
                    block = palette.quantum;
                }
                block
            } else if y < sea_level {
                palette.water
            } else {
                palette.air
            };
        }

        let Some(top) = column.get_mut(height) else {
            return;
        };
        *top = if profile.biome == Biome::Mountain && height >= p.snow_level as usize {
            palette.snow
        } else {
            surface
        };

        if profile.biome.has_trees()
            && rng.gen::<f64>() < p.tree_chance
            && height + (p.tree_headroom as usize) < self.world_height
        {
            let tree_height = rng.gen_range(p.tree_min_height..=p.tree_max_height) as usize;
            let crown = height + tree_height;

            for cell in column.iter_mut().take(crown).skip(height + 1) {
                *cell = palette.trunk;
            }
            if let Some(cell) = column.get_mut(crown) {
                *cell = palette.foliage;
            }
        }
    }
}

impl ChunkSource for TerrainComposer {
    fn generate(&self, key: ChunkKey) -> Chunk {
        self.compose(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_shared::{BlockRegistry, BlockType};

    fn quiet_config() -> WorldConfig {
        let mut config = WorldConfig::default();
        config.terrain.ore_chance = 0.0;
        config.terrain.tree_chance = 0.0;
        config
    }

    /// Checks every cell of a chunk generated without ore or trees.
    fn assert_layering(composer: &TerrainComposer, chunk: &Chunk) {
        let p = composer.params();
        let size = composer.chunk_size() as i32;
        let key = chunk.key();

        for lx in 0..composer.chunk_size() {
            for lz in 0..composer.chunk_size() {
                let wx = key.world_x(size) + lx as i32;
                let wz = key.world_z(size) + lz as i32;
                let profile = composer.column_profile(wx, wz);
                let h = profile.surface_height;
                let (surface, subsurface) = composer.palette().layers(profile.biome);

                for y in 0..composer.world_height() {
                    let carved = y + 1 < h && composer.cave_sample(wx, y, wz) > p.cave_threshold;
                    let expected = if y == h {
                        if profile.biome == Biome::Mountain && h >= 20 {
                            composer.palette().snow
                        } else {
                            surface
                        }
                    } else if y < h {
                        if carved {
                            BlockId::AIR
                        } else if y + 3 < h {
                            BlockId::STONE
                        } else {
                            subsurface
                        }
                    } else if y < 10 {
                        BlockId::WATER
                    } else {
                        BlockId::AIR
                    };

                    assert_eq!(
                        chunk.get_block(lx, y, lz),
                        expected,
                        "Mismatch at world ({wx}, {y}, {wz}) with H = {h}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_layering_matches_profile() {
        let composer = TerrainComposer::new(&quiet_config()).unwrap();

        for key in [ChunkKey::new(0, 0), ChunkKey::new(-1, -1), ChunkKey::new(7, -3)] {
            assert_layering(&composer, &composer.compose(key));
        }
    }

    #[test]
    fn test_surface_height_in_range() {
        let composer = TerrainComposer::new(&WorldConfig::default()).unwrap();

        for wx in (-2000..2000).step_by(37) {
            for wz in (-2000..2000).step_by(41) {
                let profile = composer.column_profile(wx, wz);
                assert!(profile.surface_height < composer.world_height());
                let lowest = (4.0 * profile.biome.height_multiplier()).floor() as usize;
                assert!(
                    profile.surface_height >= lowest,
                    "Height {} below biome minimum {lowest}",
                    profile.surface_height
                );
            }
        }
    }

    #[test]
    fn test_height_clamped_to_world() {
        let mut config = quiet_config();
        config.world_height = 8;
        let composer = TerrainComposer::new(&config).unwrap();

        let chunk = composer.compose(ChunkKey::new(0, 0));
        for lx in 0..16 {
            for lz in 0..16 {
                let profile = composer.column_profile(lx as i32, lz as i32);
                assert!(profile.surface_height <= 7);
                assert!(!chunk.get_block(lx, profile.surface_height, lz).is_air());
            }
        }
    }

    #[test]
    fn test_seeded_placement_is_reproducible() {
        let mut config = WorldConfig::default();
        config.feature_placement = FeaturePlacement::Seeded;
        config.terrain.ore_chance = 0.05;
        config.terrain.tree_chance = 0.2;

        let a = TerrainComposer::new(&config).unwrap();
        let b = TerrainComposer::new(&config).unwrap();

        for key in [ChunkKey::new(0, 0), ChunkKey::new(-4, 9)] {
            assert_eq!(a.compose(key), b.compose(key), "Chunk {key} differs");
        }
        assert_ne!(
            a.compose(ChunkKey::new(0, 0)).blocks(),
            a.compose(ChunkKey::new(1, 0)).blocks()
        );
    }

    #[test]
    fn test_entropy_placement_keeps_terrain_deterministic() {
        let composer = TerrainComposer::new(&quiet_config()).unwrap();
        let key = ChunkKey::new(3, 3);
        assert_eq!(composer.compose(key), composer.compose(key));
    }

    #[test]
    fn test_ore_fills_deep_cells() {
        let mut config = quiet_config();
        config.terrain.ore_chance = 1.0;
        let composer = TerrainComposer::new(&config).unwrap();

        let chunk = composer.compose(ChunkKey::new(0, 0));
        let mut deep_cells = 0;
        for lx in 0..16 {
            for lz in 0..16 {
                let h = composer.column_profile(lx as i32, lz as i32).surface_height;
                for y in 0..h.saturating_sub(5) {
                    assert_eq!(chunk.get_block(lx, y, lz), BlockId::QUANTUM);
                    deep_cells += 1;
                }
                for y in h.saturating_sub(5)..chunk.height() {
                    assert_ne!(chunk.get_block(lx, y, lz), BlockId::QUANTUM);
                }
            }
        }
        assert_eq!(chunk.count(BlockId::QUANTUM), deep_cells);
    }

    #[test]
    fn test_desert_palette() {
        let mut config = quiet_config();
        config.terrain.desert_threshold = 2.0;
        config.terrain.mountain_threshold = 2.0;
        let composer = TerrainComposer::new(&config).unwrap();

        let chunk = composer.compose(ChunkKey::new(2, 5));
        for lx in 0..16 {
            for lz in 0..16 {
                let h = composer
                    .column_profile(32 + lx as i32, 80 + lz as i32)
                    .surface_height;
                assert_eq!(chunk.get_block(lx, h, lz), BlockId::SAND);
            }
        }
        assert_eq!(chunk.count(BlockId::GRASS), 0);
        assert_eq!(chunk.count(BlockId::DIRT), 0);
    }

    #[test]
    fn test_snow_on_high_mountains() {
        let mut config = quiet_config();
        config.terrain.desert_threshold = -2.0;
        config.terrain.mountain_threshold = -2.0;
        let mut types: Vec<_> = config
            .blocks
            .iter()
            .map(|(key, t)| (key.to_owned(), t.clone()))
            .collect();
        types.push(("snow".to_owned(), BlockType::solid(BlockId::new(9), "Snow", 0xFF_FF_FF, 0.2)));
        config.blocks = BlockRegistry::from_types(types);
        let composer = TerrainComposer::new(&config).unwrap();

        for key in [ChunkKey::new(0, 0), ChunkKey::new(10, 10)] {
            let chunk = composer.compose(key);
            let size = 16;
            for lx in 0..16 {
                for lz in 0..16 {
                    let wx = key.world_x(size) + lx as i32;
                    let wz = key.world_z(size) + lz as i32;
                    let profile = composer.column_profile(wx, wz);
                    assert_eq!(profile.biome, Biome::Mountain);

                    let top = chunk.get_block(lx, profile.surface_height, lz);
                    if profile.surface_height >= 20 {
                        assert_eq!(top, BlockId::new(9));
                    } else {
                        assert_eq!(top, BlockId::STONE);
                    }
                }
            }
        }
    }

    #[test]
    fn test_trees_in_forest() {
        let mut config = quiet_config();
        config.feature_placement = FeaturePlacement::Seeded;
        config.terrain.desert_threshold = -2.0;
        config.terrain.mountain_threshold = 2.0;
        config.terrain.tree_chance = 1.0;
        let composer = TerrainComposer::new(&config).unwrap();

        let chunk = composer.compose(ChunkKey::new(0, 0));
        for lx in 0..16 {
            for lz in 0..16 {
                let h = composer.column_profile(lx as i32, lz as i32).surface_height;
                if h + 5 >= chunk.height() {
                    continue;
                }

                let crown = (h + 1..chunk.height())
                    .find(|&y| chunk.get_block(lx, y, lz) != BlockId::STONE)
                    .unwrap();
                let tree_height = crown - h;
                assert!((3..=5).contains(&tree_height), "Tree height {tree_height}");
                assert_eq!(chunk.get_block(lx, crown, lz), BlockId::DIRT);
            }
        }
    }

    #[test]
    fn test_no_trees_outside_forest() {
        let mut config = quiet_config();
        config.feature_placement = FeaturePlacement::Seeded;
        config.terrain.desert_threshold = 2.0;
        config.terrain.mountain_threshold = 2.0;
        config.terrain.tree_chance = 1.0;
        let composer = TerrainComposer::new(&config).unwrap();

        let chunk = composer.compose(ChunkKey::new(0, 0));
        for lx in 0..16 {
            for lz in 0..16 {
                let h = composer.column_profile(lx as i32, lz as i32).surface_height;
                for y in h + 1..chunk.height() {
                    let block = chunk.get_block(lx, y, lz);
                    assert!(block.is_air() || block == BlockId::WATER, "{block:?} at y={y}");
                }
            }
        }
    }

    #[test]
    fn test_negative_seed_gives_own_terrain() {
        let mut config = quiet_config();
        config.seed = 5;
        let positive = TerrainComposer::new(&config).unwrap();
        config.seed = -5;
        let negative = TerrainComposer::new(&config).unwrap();

        let key = ChunkKey::new(0, 0);
        assert_ne!(positive.compose(key).blocks(), negative.compose(key).blocks());
        assert_eq!(negative.compose(key), negative.compose(key));
    }

    #[test]
    fn test_seed_outside_lattice_range_rejected() {
        let mut config = WorldConfig::default();
        config.seed = 7 + (1_i64 << 32);
        assert!(matches!(
            TerrainComposer::new(&config),
            Err(quarry_shared::ConfigError::Invalid { field: "seed", .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = WorldConfig::default();
        config.chunk_size = 0;
        assert!(TerrainComposer::new(&config).is_err());
    }
}
