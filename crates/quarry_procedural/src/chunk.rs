//! # Chunk System
//!
//! World data is organized into fixed-size chunks:
//! - The unit of generation, caching and transfer
//! - Generated once, never mutated afterwards
//!
//! ## Chunk Format
//!
//! Chunks are `size x size x height` blocks (width x depth x height), with
//! size and height taken from the world configuration. Blocks live in one
//! flat buffer indexed `(x * size + z) * height + y`, so a column is a
//! contiguous slice and the whole chunk can be sent as raw bytes.

use quarry_shared::BlockId;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkKey {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts world block coordinates to the chunk containing them.
    ///
    /// Floors toward negative infinity, so block -1 is in chunk -1.
    #[inline]
    #[must_use]
    pub const fn from_block_pos(block_x: i32, block_z: i32, chunk_size: i32) -> Self {
        Self {
            x: block_x.div_euclid(chunk_size),
            z: block_z.div_euclid(chunk_size),
        }
    }

    /// Returns the world X coordinate of the chunk's origin (corner).
    #[inline]
    #[must_use]
    pub const fn world_x(self, chunk_size: i32) -> i32 {
        self.x.wrapping_mul(chunk_size)
    }

    /// Returns the world Z coordinate of the chunk's origin.
    #[inline]
    #[must_use]
    pub const fn world_z(self, chunk_size: i32) -> i32 {
        self.z.wrapping_mul(chunk_size)
    }

    /// Iterates the `(2r + 1)²` keys centered on this one, row by row.
    ///
    /// Coordinates wrap at the `i32` edges, like chunk origins do. A radius
    /// past `i32::MAX` is clamped to it.
    pub fn neighborhood(self, radius: u32) -> impl Iterator<Item = Self> {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        (-r..=r).flat_map(move |dx| {
            (-r..=r).map(move |dz| Self::new(self.x.wrapping_add(dx), self.z.wrapping_add(dz)))
        })
    }
}

impl std::fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.x, self.z)
    }
}

/// A chunk of world data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk position in the world.
    key: ChunkKey,
    /// Width and depth in blocks.
    size: usize,
    /// Height in blocks.
    height: usize,
    /// Block data, indexed `(x * size + z) * height + y`.
    blocks: Box<[BlockId]>,
}

impl Chunk {
    /// Creates a chunk with every cell set to `fill`.
    #[must_use]
    pub fn filled(key: ChunkKey, size: usize, height: usize, fill: BlockId) -> Self {
        Self {
            key,
            size,
            height,
            blocks: vec![fill; size * size * height].into_boxed_slice(),
        }
    }

    /// Creates an all-air chunk.
    #[must_use]
    pub fn empty(key: ChunkKey, size: usize, height: usize) -> Self {
        Self::filled(key, size, height, BlockId::AIR)
    }

    /// Chunk position in the world.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> ChunkKey {
        self.key
    }

    /// Width and depth in blocks.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Height in blocks.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[inline]
    const fn column_start(&self, x: usize, z: usize) -> usize {
        (x * self.size + z) * self.height
    }

    #[inline]
    const fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.size && z < self.size && y < self.height
    }

    /// Gets a block at local coordinates.
    ///
    /// Anything outside the chunk reads as air.
    #[inline]
    #[must_use]
    pub fn get_block(&self, x: usize, y: usize, z: usize) -> BlockId {
        if self.contains(x, y, z) {
            self.blocks[self.column_start(x, z) + y]
        } else {
            BlockId::AIR
        }
    }

    /// Sets a block at local coordinates. Out-of-range writes are dropped.
    #[cfg(test)]
    pub(crate) fn set_block(&mut self, x: usize, y: usize, z: usize, block: BlockId) {
        if self.contains(x, y, z) {
            let index = self.column_start(x, z) + y;
            self.blocks[index] = block;
        }
    }

    /// One full column, bottom to top. Empty if `(x, z)` is outside the chunk.
    #[must_use]
    pub fn column(&self, x: usize, z: usize) -> &[BlockId] {
        if x < self.size && z < self.size {
            let start = self.column_start(x, z);
            &self.blocks[start..start + self.height]
        } else {
            &[]
        }
    }

    pub(crate) fn column_mut(&mut self, x: usize, z: usize) -> &mut [BlockId] {
        let start = self.column_start(x, z);
        let height = self.height;
        &mut self.blocks[start..start + height]
    }

    /// The flat block buffer.
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// The flat block buffer as bytes, one byte per block.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks[..])
    }

    /// Counts cells holding `block`.
    #[must_use]
    pub fn count(&self, block: BlockId) -> usize {
        self.blocks.iter().filter(|&&b| b == block).count()
    }
}
