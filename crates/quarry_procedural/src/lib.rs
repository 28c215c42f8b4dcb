//! # QUARRY Procedural Generation
//!
//! Deterministic voxel terrain for a shared multiplayer world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same terrain shape
//! 2. **Chunked**: World is generated in fixed-size chunks, on demand
//! 3. **Shared**: Each chunk is generated once and handed to every caller
//!
//! ## Core Components
//!
//! - `NoiseField`: seeded lattice value noise and fBm, 2D and 3D
//! - `Biome`: terrain category from low-frequency noise
//! - `TerrainComposer`: produces chunks from noise
//! - `ChunkStore`: at-most-once chunk cache, safe for concurrent callers
//! - `World`: block lookup, spawn search and pre-warming over the cache
//!
//! ## Example
//!
//! ```rust,ignore
//! use quarry_procedural::World;
//! use quarry_shared::WorldConfig;
//!
//! let world = World::new(&WorldConfig::default())?;
//! world.prewarm_spawn();
//!
//! let spawn = world.find_safe_starting_position();
//! assert!(spawn.y >= 1.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod chunk;
pub mod chunk_store;
pub mod noise;
pub mod terrain;
pub mod world;

pub use biome::{Biome, TerrainPalette};
pub use chunk::{Chunk, ChunkKey};
pub use chunk_store::{ChunkSource, ChunkStore};
pub use noise::{NoiseField, WorldSeed};
pub use terrain::{ColumnProfile, TerrainComposer};
pub use world::{SpawnLocator, SpawnPoint, World, WorldQuery};
