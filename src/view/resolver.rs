//! View resolution: continuous view → discrete layer → covering tile set.
//!
//! # Layer Numbering
//!
//! The pyramid depth is fixed by how many tiles the full-resolution image
//! needs along its longer axis:
//!
//! ```text
//! total_layers = ceil(log2(max(ceil(w / tw), ceil(h / th))))
//! layer        = total_layers - ceil(log2(mip))
//! mip          = 2^(total_layers - layer)
//! ```
//!
//! Layer `total_layers` is full resolution; layer 0 fits the image in one
//! tile. Because mip is continuous and layers are discrete, mapping a mip to
//! a layer and back yields the smallest power of two that is `>= mip`.
//! Power-of-two mips round-trip exactly; other mips land on the next coarser
//! layer, and tiles are cut at that layer's footprint.
//!
//! Layers stop at `MAX_LAYER`. Images that need more tiles per axis, and mips
//! below 1 that would reach past it, are degenerate views.

use crate::error::ViewError;
use crate::tile::{TileCoordinate, MAX_LAYER};

use super::frame::{FrameView, Point2D};

/// Depth of the pyramid for an image.
///
/// Returns `None` for invalid sizes, and for images that need more than
/// `2^MAX_LAYER` tiles along an axis, which tile addresses cannot express.
pub fn total_layers(image_size: Point2D, tile_size: Point2D) -> Option<i32> {
    if !image_size.is_positive_size() || !tile_size.is_positive_size() {
        return None;
    }

    let tiles_x = (image_size.x / tile_size.x).ceil();
    let tiles_y = (image_size.y / tile_size.y).ceil();
    let layers = tiles_x.max(tiles_y).log2().ceil();
    if layers > f64::from(MAX_LAYER) {
        return None;
    }
    Some(layers as i32)
}

/// Pyramid layer that serves a view at `mip`.
///
/// The result is negative when the mip is coarser than layer 0; callers that
/// fetch tiles should clamp to the root tile. Returns `None` for a mip that
/// is not finite and positive, or invalid image/tile sizes.
pub fn mip_to_layer(mip: f64, image_size: Point2D, tile_size: Point2D) -> Option<i32> {
    if !mip.is_finite() || mip <= 0.0 {
        return None;
    }

    let total = total_layers(image_size, tile_size)?;
    total.checked_sub(mip.log2().ceil() as i32)
}

/// Mip at which `layer` is displayed at one tile pixel per screen pixel.
pub fn layer_to_mip(layer: i32, image_size: Point2D, tile_size: Point2D) -> Option<f64> {
    let total = total_layers(image_size, tile_size)?;
    Some(2f64.powi(total.saturating_sub(layer)))
}

/// Check that a view can be resolved against an image.
pub fn validate_view(
    view: &FrameView,
    image_size: Point2D,
    tile_size: Point2D,
) -> Result<(), ViewError> {
    if !view.is_finite() {
        return Err(ViewError::DegenerateView {
            reason: "view bounds and mip must be finite",
        });
    }

    if view.x_min >= view.x_max || view.y_min >= view.y_max {
        return Err(ViewError::DegenerateView {
            reason: "view bounds are empty or inverted",
        });
    }

    if view.mip <= 0.0 {
        return Err(ViewError::DegenerateView {
            reason: "mip must be positive",
        });
    }

    if !image_size.is_positive_size() {
        return Err(ViewError::DegenerateView {
            reason: "image size must be finite and positive",
        });
    }

    if !tile_size.is_positive_size() {
        return Err(ViewError::DegenerateView {
            reason: "tile size must be finite and positive",
        });
    }

    if total_layers(image_size, tile_size).is_none() {
        return Err(ViewError::DegenerateView {
            reason: "image needs more tiles per axis than addresses can hold",
        });
    }

    if view.x_max <= 0.0
        || view.x_min >= image_size.x
        || view.y_max <= 0.0
        || view.y_min >= image_size.y
    {
        return Err(ViewError::ViewOutOfBounds);
    }

    Ok(())
}

/// Resolve a view into the tiles covering it, reporting why a view was
/// rejected.
///
/// Tiles are emitted with x as the outer loop and y as the inner loop.
pub fn resolve_view(
    view: &FrameView,
    image_size: Point2D,
    tile_size: Point2D,
) -> Result<Vec<TileCoordinate>, ViewError> {
    validate_view(view, image_size, tile_size)?;

    let layer = mip_to_layer(view.mip, image_size, tile_size).ok_or(
        ViewError::DegenerateView {
            reason: "mip must be positive",
        },
    )?;

    if layer < 0 {
        return Ok(vec![TileCoordinate::root()]);
    }
    if layer > MAX_LAYER as i32 {
        return Err(ViewError::DegenerateView {
            reason: "mip is finer than the deepest addressable layer",
        });
    }

    // Source pixels covered by one tile of the chosen layer. This equals
    // mip * tile for power-of-two mips; other mips round up to the layer's.
    let layer_mip = layer_to_mip(layer, image_size, tile_size).ok_or(
        ViewError::DegenerateView {
            reason: "image size must be finite and positive",
        },
    )?;
    let adjusted_x = layer_mip * tile_size.x;
    let adjusted_y = layer_mip * tile_size.y;

    let layer = layer as u32;
    let width = 1u32 << layer;
    let bounded = view.cropped(image_size);

    let x_start = (bounded.x_min / adjusted_x).floor() as u32;
    let x_end = ((bounded.x_max / adjusted_x).ceil() as u32).min(width);
    let y_start = (bounded.y_min / adjusted_y).floor() as u32;
    let y_end = ((bounded.y_max / adjusted_y).ceil() as u32).min(width);

    let count = u64::from(x_end.saturating_sub(x_start)) * u64::from(y_end.saturating_sub(y_start));
    let mut tiles = Vec::with_capacity(count.min(1 << 20) as usize);
    for x in x_start..x_end {
        for y in y_start..y_end {
            tiles.push(TileCoordinate::new(x, y, layer));
        }
    }

    Ok(tiles)
}

/// Tiles required to draw `view`, or an empty set if the view cannot be
/// resolved.
pub fn required_tiles(
    view: &FrameView,
    image_size: Point2D,
    tile_size: Point2D,
) -> Vec<TileCoordinate> {
    resolve_view(view, image_size, tile_size).unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
