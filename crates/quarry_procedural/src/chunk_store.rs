//! Chunk cache.
//!
//! Generates each chunk at most once and shares it with every caller.
//! Thread-safe: any number of threads may request chunks concurrently,
//! and concurrent requests for the same missing key wait on a single
//! generation instead of racing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use parking_lot::RwLock;

use crate::chunk::{Chunk, ChunkKey};
use crate::terrain::TerrainComposer;

/// Number of independently locked map shards.
const SHARD_COUNT: usize = 16;

/// Pre-allocated entries per shard.
const SHARD_CAPACITY: usize = 64;

/// Produces chunk contents from chunk coordinates.
pub trait ChunkSource: Send + Sync {
    /// Generates the chunk at `key`. Called at most once per key per store.
    fn generate(&self, key: ChunkKey) -> Chunk;
}

type Slot = Arc<OnceLock<Arc<Chunk>>>;
type Shard = RwLock<HashMap<ChunkKey, Slot>>;

/// Lazily populated, never evicted chunk cache.
pub struct ChunkStore<S = TerrainComposer> {
    source: S,
    shards: Box<[Shard]>,
    generated: AtomicUsize,
}

impl<S: ChunkSource> ChunkStore<S> {
    /// Creates an empty store backed by `source`.
    #[must_use]
    pub fn new(source: S) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::with_capacity(SHARD_CAPACITY)))
            .collect();

        Self {
            source,
            shards,
            generated: AtomicUsize::new(0),
        }
    }

    /// The chunk source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Returns the chunk at `key`, generating it on first request.
    ///
    /// Every call for the same key returns the same shared chunk.
    pub fn get_chunk(&self, key: ChunkKey) -> Arc<Chunk> {
        let slot = self.slot(key);
        let chunk = slot.get_or_init(|| {
            let started = Instant::now();
            let chunk = Arc::new(self.source.generate(key));
            self.generated.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                chunk = %key,
                elapsed_us = started.elapsed().as_micros() as u64,
                "Generated chunk"
            );
            chunk
        });
        Arc::clone(chunk)
    }

    /// Returns the chunk at `key` only if it was already generated.
    #[must_use]
    pub fn get_cached(&self, key: ChunkKey) -> Option<Arc<Chunk>> {
        self.shard(key)
            .read()
            .get(&key)
            .and_then(|slot| slot.get().cloned())
    }

    /// Returns true if the chunk at `key` has been generated.
    #[must_use]
    pub fn contains(&self, key: ChunkKey) -> bool {
        self.get_cached(key).is_some()
    }

    /// Number of generated chunks held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().values().filter(|slot| slot.get().is_some()).count())
            .sum()
    }

    /// Returns true if no chunk has been generated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total calls made to the source.
    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }

    /// Keys of all generated chunks, sorted.
    #[must_use]
    pub fn cached_keys(&self) -> Vec<ChunkKey> {
        let mut keys: Vec<_> = self
            .shards
            .iter()
            .flat_map(|shard| {
                shard
                    .read()
                    .iter()
                    .filter(|(_, slot)| slot.get().is_some())
                    .map(|(key, _)| *key)
                    .collect::<Vec<_>>()
            })
            .collect();
        keys.sort_unstable();
        keys
    }

    fn shard(&self, key: ChunkKey) -> &Shard {
        let hash = (key.x as u32).wrapping_mul(0x9E37_79B1) ^ (key.z as u32).wrapping_mul(0x85EB_CA77);
        &self.shards[(hash >> 16) as usize % SHARD_COUNT]
    }

    /// The slot for `key`, inserting an empty one if absent.
    fn slot(&self, key: ChunkKey) -> Slot {
        let shard = self.shard(key);
        if let Some(slot) = shard.read().get(&key) {
            return Arc::clone(slot);
        }
        Arc::clone(shard.write().entry(key).or_default())
    }
}

impl<S> std::fmt::Debug for ChunkStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("shards", &self.shards.len())
            .field("generated", &self.generated.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_shared::BlockId;

    /// Stone-filled chunks, counting every generation.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl ChunkSource for CountingSource {
        fn generate(&self, key: ChunkKey) -> Chunk {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Chunk::filled(key, 4, 8, BlockId::STONE)
        }
    }

    #[test]
    fn test_generates_once() {
        let store = ChunkStore::new(CountingSource::default());
        assert!(store.is_empty());

        let a = store.get_chunk(ChunkKey::new(1, 2));
        let b = store.get_chunk(ChunkKey::new(1, 2));

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.source().calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.generated_count(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_contains_and_keys() {
        let store = ChunkStore::new(CountingSource::default());
        assert!(!store.contains(ChunkKey::new(0, 0)));
        assert!(store.get_cached(ChunkKey::new(0, 0)).is_none());

        for key in [ChunkKey::new(3, -1), ChunkKey::new(-5, 0), ChunkKey::new(0, 0)] {
            let _ = store.get_chunk(key);
        }

        assert!(store.contains(ChunkKey::new(-5, 0)));
        assert_eq!(
            store.cached_keys(),
            vec![ChunkKey::new(-5, 0), ChunkKey::new(0, 0), ChunkKey::new(3, -1)]
        );
    }

    #[test]
    fn test_concurrent_requests_share_one_generation() {
        let store = ChunkStore::new(CountingSource::default());

        let chunks: Vec<Arc<Chunk>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.get_chunk(ChunkKey::new(7, 7))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(store.source().calls.load(Ordering::SeqCst), 1);
        assert!(chunks.iter().all(|c| Arc::ptr_eq(c, &chunks[0])));
    }

    #[test]
    fn test_concurrent_distinct_keys() {
        let store = ChunkStore::new(CountingSource::default());

        std::thread::scope(|scope| {
            for t in 0..4 {
                let store = &store;
                scope.spawn(move || {
                    for x in 0..10 {
                        for z in 0..10 {
                            let chunk = store.get_chunk(ChunkKey::new(x, z - t));
                            assert_eq!(chunk.key(), ChunkKey::new(x, z - t));
                        }
                    }
                });
            }
        });

        // z spans -3..10 across threads
        assert_eq!(store.len(), 10 * 13);
        assert_eq!(store.generated_count(), 10 * 13);
    }
}
