//! View resolution layer.
//!
//! Turns what the viewer is looking at into the discrete tiles it needs.
//!
//! ```text
//! FrameView (continuous rect + mip)
//!        │
//!        ▼  mip_to_layer
//! pyramid layer
//!        │
//!        ▼  required_tiles
//! Vec<TileCoordinate>  ──▶  sort_by_focus  ──▶  fetch order
//! ```
//!
//! Everything here is pure: no state, no I/O, safe to call from any thread
//! on every frame.

mod frame;
mod ordering;
mod resolver;

pub use frame::{FrameView, Point2D};
pub use ordering::{focus_distance, focus_point, sort_by_focus, tile_sort, tile_sort_encoded};
pub use resolver::{
    layer_to_mip, mip_to_layer, required_tiles, resolve_view, total_layers, validate_view,
};
