//! # World Service
//!
//! The process-wide world: one chunk cache plus block lookup and spawn
//! search in world coordinates. Create once at startup and share by
//! reference (or `Arc`) with every connection handler.
//!
//! ```rust,ignore
//! use quarry_procedural::World;
//! use quarry_shared::WorldConfig;
//!
//! let world = World::new(&WorldConfig::default())?;
//! let welcome = world.prewarm_spawn();
//! let spawn = world.find_safe_starting_position();
//! ```

use std::sync::Arc;

use quarry_shared::{BlockId, ConfigResult, WorldConfig};
use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkKey};
use crate::chunk_store::{ChunkSource, ChunkStore};
use crate::terrain::TerrainComposer;

/// A player spawn position in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// X (block center).
    pub x: f64,
    /// Y (top of the ground block).
    pub y: f64,
    /// Z (block center).
    pub z: f64,
}

impl SpawnPoint {
    /// Creates a spawn point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for SpawnPoint {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Block lookup in world coordinates.
pub struct WorldQuery<S = TerrainComposer> {
    store: ChunkStore<S>,
    chunk_size: i32,
    world_height: usize,
}

impl<S: ChunkSource> WorldQuery<S> {
    /// Wraps a store whose chunks are `chunk_size` wide and `world_height` tall.
    #[must_use]
    pub fn new(store: ChunkStore<S>, chunk_size: u32, world_height: u32) -> Self {
        Self {
            store,
            chunk_size: chunk_size.max(1) as i32,
            world_height: world_height as usize,
        }
    }

    /// The underlying chunk cache.
    #[must_use]
    pub const fn store(&self) -> &ChunkStore<S> {
        &self.store
    }

    /// Chunk and local coordinates of a world column.
    #[must_use]
    pub const fn locate(&self, x: i32, z: i32) -> (ChunkKey, usize, usize) {
        let key = ChunkKey::from_block_pos(x, z, self.chunk_size);
        (
            key,
            x.rem_euclid(self.chunk_size) as usize,
            z.rem_euclid(self.chunk_size) as usize,
        )
    }

    /// Returns the chunk at chunk coordinates, generating it if needed.
    pub fn get_chunk(&self, chunk_x: i32, chunk_z: i32) -> Arc<Chunk> {
        self.store.get_chunk(ChunkKey::new(chunk_x, chunk_z))
    }

    /// Block at integer world coordinates.
    ///
    /// The containing chunk is generated if needed, even when `y` is out of
    /// range. Out-of-range `y` reads as air.
    pub fn get_block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        let (key, local_x, local_z) = self.locate(x, z);
        let chunk = self.store.get_chunk(key);

        match usize::try_from(y) {
            Ok(y) if y < self.world_height => chunk.get_block(local_x, y, local_z),
            _ => BlockId::AIR,
        }
    }

    /// Block at fractional world coordinates, each floored.
    ///
    /// Non-finite coordinates read as air without touching the cache.
    pub fn get_block_at_f64(&self, x: f64, y: f64, z: f64) -> BlockId {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return BlockId::AIR;
        }
        // Saturating casts; anything past i32 range lands in the edge chunk
        self.get_block_at(x.floor() as i32, y.floor() as i32, z.floor() as i32)
    }
}

impl<S> std::fmt::Debug for WorldQuery<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldQuery")
            .field("store", &self.store)
            .field("chunk_size", &self.chunk_size)
            .field("world_height", &self.world_height)
            .finish()
    }
}

/// Finds where a new player should stand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnLocator {
    column: (i32, i32),
    world_height: i32,
    fallback: SpawnPoint,
    air: BlockId,
    water: BlockId,
}

impl SpawnLocator {
    /// Builds the locator for a world configuration.
    ///
    /// # Errors
    ///
    /// Returns [`quarry_shared::ConfigError::MissingBlock`] if `air` or
    /// `water` is not registered.
    pub fn from_config(config: &WorldConfig) -> ConfigResult<Self> {
        Ok(Self {
            column: config.center_column(),
            world_height: config.world_height as i32,
            fallback: SpawnPoint::from(config.spawn_fallback),
            air: config.blocks.require("air")?,
            water: config.blocks.require("water")?,
        })
    }

    /// Scans the spawn column top-down for the first block that is neither
    /// air nor water and returns the position just above it.
    pub fn locate<S: ChunkSource>(&self, query: &WorldQuery<S>) -> SpawnPoint {
        let (x, z) = self.column;

        let ground = (0..self.world_height).rev().find(|&y| {
            let block = query.get_block_at(x, y, z);
            block != self.air && block != self.water
        });

        if let Some(y) = ground {
            SpawnPoint::new(f64::from(x) + 0.5, f64::from(y + 1), f64::from(z) + 0.5)
        } else {
            tracing::warn!(
                x,
                z,
                fallback = ?self.fallback,
                "No safe spawn found, using fallback"
            );
            self.fallback
        }
    }
}

/// The world service.
pub struct World<S = TerrainComposer> {
    query: WorldQuery<S>,
    spawn: SpawnLocator,
    spawn_chunk: ChunkKey,
}

impl World {
    /// Creates the procedural world for a configuration.
    ///
    /// # Errors
    ///
    /// Returns the configuration's validation error, if any.
    pub fn new(config: &WorldConfig) -> ConfigResult<Self> {
        let composer = TerrainComposer::new(config)?;
        Self::with_source(config, composer)
    }
}

impl<S: ChunkSource> World<S> {
    /// Creates a world whose chunks come from `source`.
    ///
    /// # Errors
    ///
    /// Returns the configuration's validation error, if any.
    pub fn with_source(config: &WorldConfig, source: S) -> ConfigResult<Self> {
        config.validate()?;

        let (chunk_x, chunk_z) = config.center_chunk();
        let world = Self {
            query: WorldQuery::new(ChunkStore::new(source), config.chunk_size, config.world_height),
            spawn: SpawnLocator::from_config(config)?,
            spawn_chunk: ChunkKey::new(chunk_x, chunk_z),
        };

        tracing::info!(
            seed = config.seed,
            chunk_size = config.chunk_size,
            world_height = config.world_height,
            placement = ?config.feature_placement,
            "World ready"
        );
        Ok(world)
    }

    /// Block lookup and the chunk cache.
    #[must_use]
    pub const fn query(&self) -> &WorldQuery<S> {
        &self.query
    }

    /// The chunk cache.
    #[must_use]
    pub const fn store(&self) -> &ChunkStore<S> {
        self.query.store()
    }

    /// Chunk containing the world center.
    #[must_use]
    pub const fn spawn_chunk(&self) -> ChunkKey {
        self.spawn_chunk
    }

    /// Generates the `(2r + 1)²` chunks around `center`.
    ///
    /// Returns them in neighborhood order, ready to send to a client.
    pub fn prewarm(&self, center: ChunkKey, radius: u32) -> Vec<(ChunkKey, Arc<Chunk>)> {
        let before = self.store().generated_count();
        let chunks: Vec<_> = center
            .neighborhood(radius)
            .map(|key| (key, self.store().get_chunk(key)))
            .collect();

        tracing::info!(
            center = %center,
            radius,
            requested = chunks.len(),
            generated = self.store().generated_count().saturating_sub(before),
            "Pre-warmed chunks"
        );
        chunks
    }

    /// Generates the 3x3 chunks around the spawn chunk.
    pub fn prewarm_spawn(&self) -> Vec<(ChunkKey, Arc<Chunk>)> {
        self.prewarm(self.spawn_chunk, 1)
    }

    /// Returns the chunk at chunk coordinates, generating it if needed.
    pub fn get_chunk(&self, chunk_x: i32, chunk_z: i32) -> Arc<Chunk> {
        self.query.get_chunk(chunk_x, chunk_z)
    }

    /// Block at world coordinates. Out-of-range `y` reads as air.
    pub fn get_block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.query.get_block_at(x, y, z)
    }

    /// Position just above the highest solid block of the center column.
    pub fn find_safe_starting_position(&self) -> SpawnPoint {
        let spawn = self.spawn.locate(&self.query);
        tracing::info!(x = spawn.x, y = spawn.y, z = spawn.z, "Spawn position");
        spawn
    }
}

impl<S> std::fmt::Debug for World<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("query", &self.query)
            .field("spawn", &self.spawn)
            .field("spawn_chunk", &self.spawn_chunk)
            .finish()
    }
}
