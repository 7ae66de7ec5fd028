//! Orderings over tile sets.
//!
//! The resolver emits tiles column by column. Fetch scheduling wants the
//! tiles nearest the centre of the view first, and comparisons in tests want
//! a canonical order; both live here.

use std::cmp::Ordering;

use crate::tile::TileCoordinate;

use super::frame::{FrameView, Point2D};

/// Order by layer, then column, then row.
pub fn tile_sort(a: &TileCoordinate, b: &TileCoordinate) -> Ordering {
    a.layer
        .cmp(&b.layer)
        .then(a.x.cmp(&b.x))
        .then(a.y.cmp(&b.y))
}

/// Order by encoded address: layer, then row, then column.
pub fn tile_sort_encoded(a: &TileCoordinate, b: &TileCoordinate) -> Ordering {
    a.encode().cmp(&b.encode())
}

/// Centre of `view` in tile units at the view's mip.
///
/// Tile `(x, y)` has its centre at `(x + 0.5, y + 0.5)` in these units, so the
/// returned point is shifted by half a tile to compare directly with indices.
pub fn focus_point(view: &FrameView, tile_size: Point2D) -> Point2D {
    let center = view.center();
    let footprint_x = view.mip * tile_size.x;
    let footprint_y = view.mip * tile_size.y;
    Point2D::new(
        center.x / footprint_x - 0.5,
        center.y / footprint_y - 0.5,
    )
}

/// Squared distance from a tile index to `focus`.
pub fn focus_distance(tile: &TileCoordinate, focus: Point2D) -> f64 {
    let dx = focus.x - f64::from(tile.x);
    let dy = focus.y - f64::from(tile.y);
    dx * dx + dy * dy
}

/// Stable sort so the tiles closest to `focus` come first.
pub fn sort_by_focus(tiles: &mut [TileCoordinate], focus: Point2D) {
    tiles.sort_by(|a, b| focus_distance(a, focus).total_cmp(&focus_distance(b, focus)));
}
