use thiserror::Error;

/// Reasons a view cannot be resolved into a tile set.
///
/// The resolver itself never surfaces these on the hot path; it returns an
/// empty tile set instead. They exist for callers that want to report why.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    /// Non-finite or inverted view bounds, non-positive mip, or non-positive
    /// image/tile dimensions
    #[error("Degenerate view: {reason}")]
    DegenerateView { reason: &'static str },

    /// The view rectangle does not intersect the image
    #[error("View lies entirely outside the image")]
    ViewOutOfBounds,
}

/// Errors related to tile addressing and cached tile lookups
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileError {
    /// A coordinate outside the pyramid was passed to the encoder
    #[error("Invalid tile coordinate ({x}, {y}) at layer {layer}")]
    InvalidTileCoordinate { x: i64, y: i64, layer: i64 },

    /// An integer that does not correspond to any tile address
    #[error("Undecodable tile address: {encoded}")]
    UndecodableAddress { encoded: i64 },

    /// The requested tile is not present in any cache tier
    #[error("Tile {encoded} of file {file_id} is not cached")]
    NotCached { file_id: i32, encoded: i64 },

    /// The view attached to a request could not be resolved
    #[error("Invalid view: {0}")]
    InvalidView(#[from] ViewError),
}
