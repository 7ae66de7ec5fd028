//! Tile address encoding.
//!
//! A tile in the pyramid is addressed by `(x, y, layer)`. Layer 0 holds a
//! single tile covering the whole image; each deeper layer doubles the
//! resolution along both axes, so layer `L` spans `2^L × 2^L` tiles.
//!
//! # Wire Format
//!
//! Addresses are packed into fixed bit fields of a single integer:
//!
//! ```text
//! | unused (1) | layer (7) | y (12) | x (12) |
//!  31          30       24 23    12 11     0
//! ```
//!
//! This gives per-axis indices `0..=4095` and layers `0..=12`. The value is
//! shared with the remote renderer, so `AXIS_BITS` and `FILE_ID_OFFSET` must
//! never change without a protocol version bump.
//!
//! Keys that must be unique across several open images carry the image's
//! file id above bit 31: `combined = encoded + file_id * 2^32`.
//!
//! # Error Signalling
//!
//! Encoding and decoding sit on the per-frame rendering path. Invalid input
//! yields [`INVALID_ENCODING`] or `None` instead of an error value so that a
//! stale view during a resize is skipped without allocation.

use serde::{Deserialize, Serialize};

use crate::error::TileError;

/// Bits per axis index.
pub const AXIS_BITS: u32 = 12;

/// Bits reserved for the layer field.
pub const LAYER_BITS: u32 = 7;

/// Deepest layer whose indices fit in [`AXIS_BITS`].
pub const MAX_LAYER: u32 = 12;

/// Sentinel returned by [`encode`] for coordinates outside the pyramid.
pub const INVALID_ENCODING: i64 = -1;

/// Multiplier that moves a file id above the 32 tile-address bits.
pub const FILE_ID_OFFSET: i64 = 1 << 32;

const AXIS_MASK: i64 = (1 << AXIS_BITS) - 1;
const LAYER_MASK: i64 = (1 << LAYER_BITS) - 1;
const LAYER_SHIFT: u32 = 2 * AXIS_BITS;
const ADDRESS_BITS: u32 = LAYER_SHIFT + LAYER_BITS;

/// A discrete tile address in the image pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoordinate {
    /// Column index (0-indexed from the left)
    pub x: u32,

    /// Row index (0-indexed from the bottom of the image)
    pub y: u32,

    /// Pyramid layer (0 = coarsest, single tile)
    pub layer: u32,
}

impl TileCoordinate {
    pub const fn new(x: u32, y: u32, layer: u32) -> Self {
        Self { x, y, layer }
    }

    /// The single tile at the top of the pyramid.
    pub const fn root() -> Self {
        Self::new(0, 0, 0)
    }

    /// Encode this coordinate, returning [`INVALID_ENCODING`] if it lies
    /// outside the pyramid.
    #[inline]
    pub fn encode(&self) -> i64 {
        encode(i64::from(self.x), i64::from(self.y), i64::from(self.layer))
    }

    /// Encode this coordinate, or `None` if it lies outside the pyramid.
    #[inline]
    pub fn try_encode(&self) -> Option<u32> {
        try_encode(i64::from(self.x), i64::from(self.y), i64::from(self.layer))
    }

    /// Decode an encoded (optionally file-id tagged) address.
    #[inline]
    pub fn decode(encoded: i64) -> Option<Self> {
        decode(encoded)
    }

    /// Whether `x` and `y` fit within `layer` and the layer fits the bit budget.
    pub fn is_valid(&self) -> bool {
        self.try_encode().is_some()
    }
}

/// Pack `(x, y, layer)` into a tile address.
///
/// Returns `None` when any component is negative, `layer > MAX_LAYER`, or
/// `x`/`y` fall outside `[0, 2^layer)`.
#[inline]
pub fn try_encode(x: i64, y: i64, layer: i64) -> Option<u32> {
    if x < 0 || y < 0 || layer < 0 || layer > i64::from(MAX_LAYER) {
        return None;
    }

    let width = 1i64 << layer;
    if x >= width || y >= width {
        return None;
    }

    Some(((layer << LAYER_SHIFT) | (y << AXIS_BITS) | x) as u32)
}

/// Pack `(x, y, layer)` into a tile address, or [`INVALID_ENCODING`].
#[inline]
pub fn encode(x: i64, y: i64, layer: i64) -> i64 {
    try_encode(x, y, layer).map_or(INVALID_ENCODING, i64::from)
}

/// Unpack a tile address.
///
/// Bits above the 32-bit address (a composed file id) are ignored, so a
/// cache key decodes to its tile directly. Negative values and values whose
/// fields do not describe a tile inside the pyramid yield `None`.
#[inline]
pub fn decode(encoded: i64) -> Option<TileCoordinate> {
    if encoded < 0 {
        return None;
    }

    let address = encoded & (FILE_ID_OFFSET - 1);
    if address >> ADDRESS_BITS != 0 {
        return None;
    }

    let layer = (address >> LAYER_SHIFT) & LAYER_MASK;
    if layer > i64::from(MAX_LAYER) {
        return None;
    }

    let x = address & AXIS_MASK;
    let y = (address >> AXIS_BITS) & AXIS_MASK;
    let width = 1i64 << layer;
    if x >= width || y >= width {
        return None;
    }

    Some(TileCoordinate::new(x as u32, y as u32, layer as u32))
}

/// Like [`decode`], with a typed error for reporting at API boundaries.
pub fn try_decode(encoded: i64) -> Result<TileCoordinate, TileError> {
    decode(encoded).ok_or(TileError::UndecodableAddress { encoded })
}

/// Like [`encode`], with a typed error for reporting at API boundaries.
pub fn encode_checked(x: i64, y: i64, layer: i64) -> Result<u32, TileError> {
    try_encode(x, y, layer).ok_or(TileError::InvalidTileCoordinate { x, y, layer })
}

/// Extract only the layer field, without validating x or y.
#[inline]
pub fn get_layer(encoded: i64) -> u32 {
    ((encoded >> LAYER_SHIFT) & LAYER_MASK) as u32
}

/// Tag an encoded address with the id of the image it belongs to.
#[inline]
pub fn add_file_id(encoded: i64, file_id: i32) -> i64 {
    encoded.wrapping_add(i64::from(file_id) * FILE_ID_OFFSET)
}

/// Recover the file id from a tagged address.
#[inline]
pub fn get_file_id(combined: i64) -> i64 {
    combined.div_euclid(FILE_ID_OFFSET)
}

/// Strip the file id from a tagged address.
#[inline]
pub fn remove_file_id(combined: i64) -> i64 {
    combined.rem_euclid(FILE_ID_OFFSET)
}

// =============================================================================
// Tests
// =============================================================================
