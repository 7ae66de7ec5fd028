//! Tile request planning.
//!
//! The planner sits between view resolution and the network layer. Given
//! the tiles a view needs, it works out which ones still have to be fetched:
//!
//! ```text
//! required tiles ─┬─ not encodable ───────────▶ skipped
//!                 ├─ already requested ───────▶ pending
//!                 ├─ in GPU tier ─────────────▶ cached
//!                 ├─ in system tier ──────────▶ from_system_cache (decode locally)
//!                 └─ otherwise ─▶ mark pending ▶ AddRequiredTiles (nearest first)
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::view::{sort_by_focus, Point2D};

use super::cache::{CacheTier, TileCache, TileCacheKey};
use super::coordinate::TileCoordinate;

/// Default compression quality for image tiles.
pub const DEFAULT_COMPRESSION_QUALITY: u8 = 11;

/// Minimum allowed compression quality.
pub const MIN_COMPRESSION_QUALITY: u8 = 4;

/// Maximum allowed compression quality.
pub const MAX_COMPRESSION_QUALITY: u8 = 32;

/// Validate a compression quality parameter.
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_COMPRESSION_QUALITY..=MAX_COMPRESSION_QUALITY).contains(&quality)
}

/// Clamp a compression quality to the valid range.
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_COMPRESSION_QUALITY, MAX_COMPRESSION_QUALITY)
}

// =============================================================================
// Wire Types
// =============================================================================

/// Compression applied by the renderer to streamed tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompressionType {
    None,
    #[default]
    Zfp,
    Sz,
}

/// Request sent to the renderer for tiles of one image.
///
/// `tiles` holds encoded tile addresses, nearest to the view centre first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequiredTiles {
    pub file_id: i32,
    pub compression_type: CompressionType,
    pub compression_quality: u8,
    pub tiles: Vec<i64>,
}

/// Outcome of planning a tile set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TilePlan {
    /// Tiles already resident in the GPU tier
    pub cached: usize,

    /// Tiles already requested and not yet received
    pub pending: usize,

    /// Tiles outside the encodable pyramid
    pub skipped: usize,

    /// Encoded tiles to rebuild from the system tier instead of fetching
    pub from_system_cache: Vec<i64>,

    /// Request for the remaining tiles, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AddRequiredTiles>,
}

// =============================================================================
// Planner
// =============================================================================

/// Tracks outstanding tile requests per file and plans new ones against a
/// shared [`TileCache`].
pub struct TileRequestPlanner {
    cache: Arc<TileCache>,
    pending: RwLock<HashMap<i32, HashSet<i64>>>,
    compression_type: CompressionType,
}

impl TileRequestPlanner {
    /// Create a planner that requests ZFP-compressed tiles.
    pub fn new(cache: Arc<TileCache>) -> Self {
        Self::with_compression(cache, CompressionType::default())
    }

    pub fn with_compression(cache: Arc<TileCache>, compression_type: CompressionType) -> Self {
        Self {
            cache,
            pending: RwLock::new(HashMap::new()),
            compression_type,
        }
    }

    /// The cache this planner consults.
    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Plan the fetches needed to display `tiles` of `file_id`.
    ///
    /// Tiles added to the request are marked pending until [`receive`] is
    /// called for them, so repeated plans for the same view do not request
    /// them twice.
    ///
    /// [`receive`]: Self::receive
    pub async fn plan(
        &self,
        file_id: i32,
        tiles: &[TileCoordinate],
        focus: Point2D,
        quality: u8,
    ) -> TilePlan {
        let mut plan = TilePlan::default();
        let mut new_requests = Vec::new();

        let mut pending = self.pending.write().await;
        let file_pending = pending.entry(file_id).or_default();

        for tile in tiles {
            let Some(encoded) = tile.try_encode() else {
                plan.skipped += 1;
                continue;
            };
            let encoded = i64::from(encoded);

            if file_pending.contains(&encoded) {
                plan.pending += 1;
                continue;
            }

            let key = TileCacheKey::new(file_id, encoded);
            if self.cache.contains(CacheTier::Gpu, &key).await {
                plan.cached += 1;
            } else if self.cache.contains(CacheTier::System, &key).await {
                plan.from_system_cache.push(encoded);
            } else {
                file_pending.insert(encoded);
                new_requests.push(*tile);
            }
        }
        drop(pending);

        if !new_requests.is_empty() {
            sort_by_focus(&mut new_requests, focus);
            plan.request = Some(AddRequiredTiles {
                file_id,
                compression_type: self.compression_type,
                compression_quality: clamp_quality(quality),
                tiles: new_requests.iter().map(TileCoordinate::encode).collect(),
            });
        }

        debug!(
            file_id,
            requested = new_requests.len(),
            from_system_cache = plan.from_system_cache.len(),
            cached = plan.cached,
            pending = plan.pending,
            skipped = plan.skipped,
            "Planned tile requests"
        );

        plan
    }

    /// Record a compressed tile arriving from the renderer.
    ///
    /// The tile is stored in the system tier. Returns whether it was pending.
    pub async fn receive(&self, file_id: i32, encoded: i64, payload: Bytes) -> bool {
        let was_pending = {
            let mut pending = self.pending.write().await;
            pending
                .get_mut(&file_id)
                .map(|set| set.remove(&encoded))
                .unwrap_or(false)
        };

        self.cache
            .put(CacheTier::System, TileCacheKey::new(file_id, encoded), payload)
            .await;
        was_pending
    }

    /// Store a decoded tile in the GPU tier.
    pub async fn promote(&self, file_id: i32, encoded: i64, payload: Bytes) {
        self.cache
            .put(CacheTier::Gpu, TileCacheKey::new(file_id, encoded), payload)
            .await;
    }

    /// Look a tile up, GPU tier first.
    pub async fn get_tile(&self, file_id: i32, encoded: i64) -> Option<(CacheTier, Bytes)> {
        let key = TileCacheKey::new(file_id, encoded);
        for tier in [CacheTier::Gpu, CacheTier::System] {
            if let Some(data) = self.cache.get(tier, &key).await {
                return Some((tier, data));
            }
        }
        None
    }

    /// Forget outstanding requests for one file, or for all files.
    pub async fn clear_requests(&self, file_id: Option<i32>) {
        let mut pending = self.pending.write().await;
        match file_id {
            Some(file_id) => {
                pending.remove(&file_id);
            }
            None => pending.clear(),
        }
    }

    /// Number of tiles requested and not yet received, across all files.
    pub async fn remaining(&self) -> usize {
        let pending = self.pending.read().await;
        pending.values().map(HashSet::len).sum()
    }

    /// Drop all state held for a closed file.
    pub async fn close_file(&self, file_id: i32) {
        self.clear_requests(Some(file_id)).await;
        let removed = self.cache.clear_file(file_id).await;
        debug!(file_id, removed, "Closed file");
    }
}

// =============================================================================
// Tests
// =============================================================================
