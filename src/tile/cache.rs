//! Two-tier tile cache.
//!
//! This module provides LRU caches for tile payloads keyed by the composed
//! `(file_id, encoded address)` integer, so tiles of several open images can
//! share one map without colliding.
//!
//! # Tiers
//!
//! - **GPU**: decoded tiles resident in tile textures. Small; its capacity is
//!   rounded to whole textures.
//! - **System**: compressed tiles held in system memory, so a tile evicted
//!   from the GPU tier can be rebuilt without a network round trip.
//!
//! Both tiers bound the number of entries rather than bytes: every tile has
//! the same dimensions, so entry count is what the texture budget limits.
//! Payloads are opaque to the cache.

use std::num::NonZeroUsize;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::debug;

use super::coordinate::{add_file_id, get_file_id, remove_file_id, TileCoordinate};

/// Edge length of a tile texture in pixels.
pub const TEXTURE_SIZE: usize = 4096;

/// Edge length of a tile in pixels.
pub const TILE_SIZE: usize = 256;

/// Maximum number of tile textures the GPU tier may allocate.
pub const MAX_TEXTURES: usize = 8;

/// Number of tiles that fit in one texture.
pub const TILES_PER_TEXTURE: usize = (TEXTURE_SIZE * TEXTURE_SIZE) / (TILE_SIZE * TILE_SIZE);

/// Default GPU tier capacity in tiles.
pub const DEFAULT_GPU_TILE_CACHE: usize = 1024;

/// Default system memory tier capacity in tiles.
pub const DEFAULT_SYSTEM_TILE_CACHE: usize = 4096;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for tiles: an encoded tile address tagged with its file id.
///
/// The key is the same integer the renderer and network layer use, so it can
/// be passed across without translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCacheKey(i64);

impl TileCacheKey {
    /// Create a key from a file id and an encoded tile address.
    pub fn new(file_id: i32, encoded: i64) -> Self {
        Self(add_file_id(encoded, file_id))
    }

    /// Create a key for a coordinate, or `None` if it cannot be encoded.
    pub fn for_coordinate(file_id: i32, coordinate: &TileCoordinate) -> Option<Self> {
        coordinate
            .try_encode()
            .map(|encoded| Self::new(file_id, i64::from(encoded)))
    }

    /// Wrap an already composed key.
    pub const fn from_raw(combined: i64) -> Self {
        Self(combined)
    }

    /// The composed integer.
    pub const fn raw(&self) -> i64 {
        self.0
    }

    pub fn file_id(&self) -> i64 {
        get_file_id(self.0)
    }

    /// The encoded tile address without the file id.
    pub fn encoded(&self) -> i64 {
        remove_file_id(self.0)
    }
}

// =============================================================================
// Tiers
// =============================================================================

/// Which tier of the cache an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    /// Decoded tiles resident on the GPU
    Gpu,

    /// Compressed tiles in system memory
    System,
}

/// Round a requested GPU capacity up to whole textures.
///
/// At least one texture and at most [`MAX_TEXTURES`] are allocated.
pub fn rounded_gpu_capacity(requested: usize) -> usize {
    let textures = requested.div_ceil(TILES_PER_TEXTURE).clamp(1, MAX_TEXTURES);
    textures * TILES_PER_TEXTURE
}

fn new_tier(capacity: usize) -> RwLock<LruCache<TileCacheKey, Bytes>> {
    let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
    RwLock::new(LruCache::new(capacity))
}

// =============================================================================
// Tile Cache
// =============================================================================

/// LRU cache for tile payloads with independent GPU and system tiers.
///
/// # Thread Safety
///
/// The cache is thread-safe and can be shared across async tasks via `Arc`.
///
/// # Example
///
/// ```
/// use tile_pyramid::tile::{CacheTier, TileCache, TileCacheKey};
/// use bytes::Bytes;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = TileCache::new();
///
///     let key = TileCacheKey::new(3, 0);
///     let tile_data = Bytes::from_static(&[1, 2, 3, 4]);
///
///     cache.put(CacheTier::System, key, tile_data.clone()).await;
///
///     let cached = cache.get(CacheTier::System, &key).await;
///     assert_eq!(cached, Some(tile_data));
///     assert!(!cache.contains(CacheTier::Gpu, &key).await);
/// }
/// ```
pub struct TileCache {
    gpu: RwLock<LruCache<TileCacheKey, Bytes>>,
    system: RwLock<LruCache<TileCacheKey, Bytes>>,
    gpu_capacity: usize,
    system_capacity: usize,
}

impl TileCache {
    /// Create a tile cache with default capacities.
    pub fn new() -> Self {
        Self::with_capacities(DEFAULT_GPU_TILE_CACHE, DEFAULT_SYSTEM_TILE_CACHE)
    }

    /// Create a tile cache with the given capacities in tiles.
    ///
    /// The GPU capacity is rounded with [`rounded_gpu_capacity`]; a zero
    /// system capacity is raised to one entry.
    pub fn with_capacities(gpu_capacity: usize, system_capacity: usize) -> Self {
        let gpu_capacity = rounded_gpu_capacity(gpu_capacity);
        let system_capacity = system_capacity.max(1);
        debug!(
            gpu_capacity,
            textures = gpu_capacity / TILES_PER_TEXTURE,
            system_capacity,
            "Creating tile cache"
        );

        Self {
            gpu: new_tier(gpu_capacity),
            system: new_tier(system_capacity),
            gpu_capacity,
            system_capacity,
        }
    }

    fn tier(&self, tier: CacheTier) -> &RwLock<LruCache<TileCacheKey, Bytes>> {
        match tier {
            CacheTier::Gpu => &self.gpu,
            CacheTier::System => &self.system,
        }
    }

    /// Get a tile, marking it as recently used.
    pub async fn get(&self, tier: CacheTier, key: &TileCacheKey) -> Option<Bytes> {
        let mut cache = self.tier(tier).write().await;
        cache.get(key).cloned()
    }

    /// Get a tile without updating LRU order.
    pub async fn peek(&self, tier: CacheTier, key: &TileCacheKey) -> Option<Bytes> {
        let cache = self.tier(tier).read().await;
        cache.peek(key).cloned()
    }

    /// Check if a tile is cached without updating LRU order.
    pub async fn contains(&self, tier: CacheTier, key: &TileCacheKey) -> bool {
        let cache = self.tier(tier).read().await;
        cache.contains(key)
    }

    /// Store a tile.
    ///
    /// Returns the key evicted to make room, if any. Replacing an existing
    /// entry evicts nothing.
    pub async fn put(&self, tier: CacheTier, key: TileCacheKey, data: Bytes) -> Option<TileCacheKey> {
        let mut cache = self.tier(tier).write().await;
        match cache.push(key, data) {
            Some((evicted, _)) if evicted != key => {
                debug!(
                    ?tier,
                    file_id = evicted.file_id(),
                    encoded = evicted.encoded(),
                    "Evicted tile"
                );
                Some(evicted)
            }
            _ => None,
        }
    }

    /// Remove a tile, returning its payload if it was cached.
    pub async fn remove(&self, tier: CacheTier, key: &TileCacheKey) -> Option<Bytes> {
        let mut cache = self.tier(tier).write().await;
        cache.pop(key)
    }

    /// Drop every tile of `file_id` from both tiers.
    ///
    /// Tiles of other files keep their relative LRU order. Returns the number
    /// of tiles removed.
    pub async fn clear_file(&self, file_id: i32) -> usize {
        let mut removed = 0;
        for tier in [CacheTier::Gpu, CacheTier::System] {
            let mut cache = self.tier(tier).write().await;
            let stale: Vec<TileCacheKey> = cache
                .iter()
                .filter(|(key, _)| key.file_id() == i64::from(file_id))
                .map(|(key, _)| *key)
                .collect();
            for key in &stale {
                cache.pop(key);
            }
            removed += stale.len();
        }

        debug!(file_id, removed, "Cleared cached tiles for file");
        removed
    }

    /// Clear both tiers.
    pub async fn clear(&self) {
        self.gpu.write().await.clear();
        self.system.write().await.clear();
    }

    /// Number of tiles cached in a tier.
    pub async fn len(&self, tier: CacheTier) -> usize {
        let cache = self.tier(tier).read().await;
        cache.len()
    }

    /// Check if a tier is empty.
    pub async fn is_empty(&self, tier: CacheTier) -> bool {
        let cache = self.tier(tier).read().await;
        cache.is_empty()
    }

    /// Capacity of a tier in tiles.
    pub fn capacity(&self, tier: CacheTier) -> usize {
        match tier {
            CacheTier::Gpu => self.gpu_capacity,
            CacheTier::System => self.system_capacity,
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
