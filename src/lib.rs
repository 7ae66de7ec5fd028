//! # Tile Pyramid
//!
//! Addressing, view resolution and caching for tiled image pyramids.
//!
//! A large 2D image is stored as a pyramid of fixed-size tiles. Layer 0 fits
//! the whole image into a single tile; each deeper layer doubles resolution
//! along both axes. This crate answers three questions for a viewer:
//!
//! - which tiles cover what is on screen right now,
//! - how to name a tile with one compact integer (and back),
//! - which of those tiles still need to be fetched.
//!
//! ## Architecture
//!
//! - [`view`] - Continuous view → pyramid layer → covering tile set
//! - [`tile`] - Tile address encoding, two-tier cache, request planning
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```
//! use tile_pyramid::view::{required_tiles, FrameView, Point2D};
//!
//! let view = FrameView::new(0.0, 512.0, 0.0, 512.0, 1.0);
//! let tiles = required_tiles(&view, Point2D::square(1024.0), Point2D::square(256.0));
//!
//! assert_eq!(tiles.len(), 4);
//! assert!(tiles.iter().all(|tile| tile.layer == 2));
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod tile;
pub mod view;

// Re-export commonly used types
pub use config::{Cli, Command, DecodeConfig, ResolveConfig, ServeConfig};
pub use error::{TileError, ViewError};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use tile::{
    decode, encode, AddRequiredTiles, CacheTier, TileCache, TileCacheKey, TileCoordinate,
    TilePlan, TileRequestPlanner,
};
pub use view::{
    focus_point, layer_to_mip, mip_to_layer, required_tiles, resolve_view, sort_by_focus,
    FrameView, Point2D,
};
