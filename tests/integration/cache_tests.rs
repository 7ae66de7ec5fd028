//! Cache and planner tests across realistic viewing sequences.
//!
//! Tests verify:
//! - Eviction order and capacity of each tier
//! - Per-file clearing leaves other files intact
//! - Pan and zoom sequences only request tiles not seen before
//! - Concurrent planning never requests a tile twice

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;

use tile_pyramid::tile::{
    rounded_gpu_capacity, CacheTier, TileCache, TileCacheKey, TileCoordinate, TileRequestPlanner,
    MAX_TEXTURES, TILES_PER_TEXTURE,
};
use tile_pyramid::view::{focus_point, required_tiles, FrameView, Point2D};

const TILE: Point2D = Point2D::square(256.0);
const IMAGE: Point2D = Point2D::square(8192.0);

fn payload(n: u8) -> Bytes {
    Bytes::from(vec![n; 4])
}

// =============================================================================
// Cache Tiers
// =============================================================================

#[tokio::test]
async fn test_system_tier_evicts_least_recently_used() {
    let cache = TileCache::with_capacities(TILES_PER_TEXTURE, 3);
    let keys: Vec<_> = (0..4).map(|i| TileCacheKey::new(1, i)).collect();

    for (i, key) in keys[..3].iter().enumerate() {
        assert!(cache.put(CacheTier::System, *key, payload(i as u8)).await.is_none());
    }

    // Touch the oldest so the second becomes the eviction candidate
    assert!(cache.get(CacheTier::System, &keys[0]).await.is_some());

    let evicted = cache.put(CacheTier::System, keys[3], payload(3)).await;
    assert_eq!(evicted, Some(keys[1]));
    assert_eq!(cache.len(CacheTier::System).await, 3);
    assert!(cache.contains(CacheTier::System, &keys[0]).await);
    assert!(!cache.contains(CacheTier::System, &keys[1]).await);
}

#[tokio::test]
async fn test_gpu_tier_is_rounded_to_textures() {
    let cache = TileCache::with_capacities(1000, 1024);
    assert_eq!(cache.capacity(CacheTier::Gpu), 4 * TILES_PER_TEXTURE);
    assert_eq!(cache.capacity(CacheTier::System), 1024);

    assert_eq!(rounded_gpu_capacity(0), TILES_PER_TEXTURE);
    assert_eq!(
        rounded_gpu_capacity(usize::MAX / 2),
        MAX_TEXTURES * TILES_PER_TEXTURE
    );
}

#[tokio::test]
async fn test_tiers_are_independent() {
    let cache = TileCache::new();
    let key = TileCacheKey::new(2, 0);

    cache.put(CacheTier::Gpu, key, payload(1)).await;
    assert!(cache.contains(CacheTier::Gpu, &key).await);
    assert!(!cache.contains(CacheTier::System, &key).await);

    cache.remove(CacheTier::Gpu, &key).await;
    assert!(cache.is_empty(CacheTier::Gpu).await);
}

#[tokio::test]
async fn test_clear_file_keeps_other_files() {
    let cache = TileCache::new();

    for file_id in [1, 2, -3] {
        for encoded in 0..5 {
            let key = TileCacheKey::new(file_id, encoded);
            cache.put(CacheTier::System, key, payload(encoded as u8)).await;
            cache.put(CacheTier::Gpu, key, payload(encoded as u8)).await;
        }
    }

    assert_eq!(cache.clear_file(2).await, 10);
    assert_eq!(cache.len(CacheTier::System).await, 10);
    assert_eq!(cache.len(CacheTier::Gpu).await, 10);

    for encoded in 0..5 {
        assert!(!cache.contains(CacheTier::System, &TileCacheKey::new(2, encoded)).await);
        assert!(cache.contains(CacheTier::System, &TileCacheKey::new(1, encoded)).await);
        assert!(cache.contains(CacheTier::System, &TileCacheKey::new(-3, encoded)).await);
    }

    assert_eq!(cache.clear_file(-3).await, 10);
    cache.clear().await;
    assert!(cache.is_empty(CacheTier::System).await);
}

#[tokio::test]
async fn test_cache_key_composition() {
    let tile = TileCoordinate::new(3, 1, 2);
    let key = TileCacheKey::for_coordinate(9, &tile).unwrap();

    assert_eq!(key.file_id(), 9);
    assert_eq!(key.encoded(), tile.encode());
    assert_eq!(TileCacheKey::from_raw(key.raw()), key);

    assert!(TileCacheKey::for_coordinate(9, &TileCoordinate::new(4, 0, 2)).is_none());
}

// =============================================================================
// Planner Sequences
// =============================================================================

async fn deliver_all(planner: &TileRequestPlanner, file_id: i32, tiles: &[i64]) {
    for &encoded in tiles {
        planner.receive(file_id, encoded, payload(0)).await;
    }
}

#[tokio::test]
async fn test_pan_requests_only_new_tiles() {
    let planner = TileRequestPlanner::new(Arc::new(TileCache::new()));

    let first = FrameView::new(0.0, 1024.0, 0.0, 1024.0, 1.0);
    let tiles = required_tiles(&first, IMAGE, TILE);
    let plan = planner.plan(0, &tiles, focus_point(&first, TILE), 11).await;
    let requested = plan.request.unwrap().tiles;
    assert_eq!(requested.len(), 16);
    deliver_all(&planner, 0, &requested).await;

    // Pan right by one tile: one new column
    let panned = FrameView::new(256.0, 1280.0, 0.0, 1024.0, 1.0);
    let tiles = required_tiles(&panned, IMAGE, TILE);
    let plan = planner.plan(0, &tiles, focus_point(&panned, TILE), 11).await;

    assert_eq!(plan.from_system_cache.len(), 12);
    let new_tiles: HashSet<i64> = plan.request.unwrap().tiles.into_iter().collect();
    let expected: HashSet<i64> = (0..4).map(|y| TileCoordinate::new(4, y, 5).encode()).collect();
    assert_eq!(new_tiles, expected);
    assert_eq!(planner.remaining().await, 4);
}

#[tokio::test]
async fn test_zoom_in_requests_deeper_layer() {
    let planner = TileRequestPlanner::new(Arc::new(TileCache::new()));

    let overview = FrameView::new(0.0, 8192.0, 0.0, 8192.0, 32.0);
    let tiles = required_tiles(&overview, IMAGE, TILE);
    assert_eq!(tiles, vec![TileCoordinate::root()]);

    let plan = planner.plan(0, &tiles, focus_point(&overview, TILE), 11).await;
    assert_eq!(plan.request.unwrap().tiles, vec![0]);

    let zoomed = FrameView::new(0.0, 8192.0, 0.0, 8192.0, 16.0);
    let tiles = required_tiles(&zoomed, IMAGE, TILE);
    let plan = planner.plan(0, &tiles, focus_point(&zoomed, TILE), 11).await;

    let request = plan.request.unwrap();
    assert_eq!(request.tiles.len(), 4);
    assert!(request
        .tiles
        .iter()
        .all(|&encoded| tile_pyramid::tile::get_layer(encoded) == 1));
    assert_eq!(planner.remaining().await, 5);
}

#[tokio::test]
async fn test_concurrent_plans_request_each_tile_once() {
    let planner = Arc::new(TileRequestPlanner::new(Arc::new(TileCache::new())));
    let view = FrameView::new(0.0, 4096.0, 0.0, 4096.0, 1.0);
    let tiles = Arc::new(required_tiles(&view, IMAGE, TILE));
    assert_eq!(tiles.len(), 256);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let planner = Arc::clone(&planner);
        let tiles = Arc::clone(&tiles);
        handles.push(tokio::spawn(async move {
            planner
                .plan(0, &tiles, focus_point(&view, TILE), 11)
                .await
                .request
                .map(|r| r.tiles)
                .unwrap_or_default()
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }

    let unique: HashSet<_> = all.iter().collect();
    assert_eq!(all.len(), 256);
    assert_eq!(unique.len(), 256);
    assert_eq!(planner.remaining().await, 256);
}

#[tokio::test]
async fn test_small_system_tier_forces_refetch() {
    let cache = Arc::new(TileCache::with_capacities(TILES_PER_TEXTURE, 2));
    let planner = TileRequestPlanner::new(cache);
    let view = FrameView::new(0.0, 768.0, 0.0, 256.0, 1.0);

    let tiles = required_tiles(&view, IMAGE, TILE);
    assert_eq!(tiles.len(), 3);

    let plan = planner.plan(0, &tiles, Point2D::default(), 11).await;
    deliver_all(&planner, 0, &plan.request.unwrap().tiles).await;

    // Only two of three survived in the system tier
    let plan = planner.plan(0, &tiles, Point2D::default(), 11).await;
    assert_eq!(plan.from_system_cache.len(), 2);
    assert_eq!(plan.request.unwrap().tiles.len(), 1);
}
