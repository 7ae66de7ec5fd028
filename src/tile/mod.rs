//! Tile addressing, caching and request planning.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           TileRequestPlanner            │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  pending     │  │  TileCache      │  │
//! │  │  requests    │  │  GPU │ system   │  │
//! │  │  (per file)  │  │  tier│ tier     │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │   TileCoordinate  ⇄  encoded address    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileCoordinate`]: A tile's column, row and pyramid layer
//! - [`coordinate`]: Packing coordinates (and file ids) into integers
//! - [`TileCache`]: Two-tier LRU cache keyed by file id and tile address
//! - [`TileRequestPlanner`]: Decides which tiles of a view still need fetching
//!
//! # Example
//!
//! ```
//! use tile_pyramid::tile::{decode, encode, TileCoordinate};
//!
//! let encoded = encode(3, 5, 2);
//! assert_eq!(decode(encoded), Some(TileCoordinate::new(3, 5, 2)));
//! ```

mod cache;
pub mod coordinate;
mod request;

pub use cache::{
    rounded_gpu_capacity, CacheTier, TileCache, TileCacheKey, DEFAULT_GPU_TILE_CACHE,
    DEFAULT_SYSTEM_TILE_CACHE, MAX_TEXTURES, TEXTURE_SIZE, TILES_PER_TEXTURE, TILE_SIZE,
};
pub use coordinate::{
    add_file_id, decode, encode, encode_checked, get_file_id, get_layer, remove_file_id,
    try_decode, try_encode, TileCoordinate, AXIS_BITS, FILE_ID_OFFSET, INVALID_ENCODING,
    LAYER_BITS, MAX_LAYER,
};
pub use request::{
    clamp_quality, is_valid_quality, AddRequiredTiles, CompressionType, TilePlan,
    TileRequestPlanner, DEFAULT_COMPRESSION_QUALITY, MAX_COMPRESSION_QUALITY,
    MIN_COMPRESSION_QUALITY,
};
