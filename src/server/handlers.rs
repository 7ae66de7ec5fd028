//! HTTP request handlers for the tile API.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check endpoint
//! - `GET /tiles/required` - Tiles covering a view
//! - `GET /tiles/decode/{encoded}` - Explain an encoded tile address
//! - `POST /files/{file_id}/requests` - Plan fetches for a view of a file
//! - `PUT /files/{file_id}/tiles/{encoded}` - Deliver a compressed tile
//! - `GET /files/{file_id}/tiles/{encoded}` - Read a cached tile
//! - `DELETE /files/{file_id}` - Drop all state for a file

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{TileError, ViewError};
use crate::tile::{
    get_file_id, remove_file_id, try_decode, CacheTier, TilePlan, TileRequestPlanner,
    DEFAULT_COMPRESSION_QUALITY, FILE_ID_OFFSET,
};
use crate::view::{focus_point, mip_to_layer, resolve_view, FrameView, Point2D};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Planner holding pending requests and the tile cache
    pub planner: Arc<TileRequestPlanner>,

    /// Tile edge lengths in pixels
    pub tile_size: Point2D,

    /// Compression quality used when a request does not name one
    pub default_quality: u8,
}

impl AppState {
    /// Create a new application state with square tiles of `tile_size` pixels.
    pub fn new(planner: TileRequestPlanner, tile_size: u32) -> Self {
        Self {
            planner: Arc::new(planner),
            tile_size: Point2D::square(f64::from(tile_size)),
            default_quality: DEFAULT_COMPRESSION_QUALITY,
        }
    }

    /// Override the default compression quality.
    pub fn with_default_quality(mut self, quality: u8) -> Self {
        self.default_quality = quality;
        self
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for `GET /tiles/required`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredTilesQuery {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,

    /// Downsampling factor (defaults to 1, full resolution)
    #[serde(default = "default_mip")]
    pub mip: f64,

    /// Image width in pixels
    pub width: f64,

    /// Image height in pixels
    pub height: f64,
}

fn default_mip() -> f64 {
    1.0
}

impl RequiredTilesQuery {
    pub fn view(&self) -> FrameView {
        FrameView::new(self.x_min, self.x_max, self.y_min, self.y_max, self.mip)
    }

    pub fn image_size(&self) -> Point2D {
        Point2D::new(self.width, self.height)
    }
}

/// Body of `POST /files/{file_id}/requests`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    /// What the viewer is looking at
    pub view: FrameView,

    /// Full-resolution image size in pixels
    pub image_size: Point2D,

    /// Compression quality (clamped to 4-32, defaults to the server setting)
    #[serde(default)]
    pub quality: Option<u8>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_cached", "invalid_view")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// One tile of a resolved view.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TileEntry {
    pub x: u32,
    pub y: u32,
    pub layer: u32,
    pub encoded: i64,
}

/// Response from `GET /tiles/required`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequiredTilesResponse {
    /// Layer the tiles belong to
    pub layer: u32,

    /// Mip the view was resolved at
    pub mip: f64,

    /// Covering tiles, column by column
    pub tiles: Vec<TileEntry>,
}

/// Response from `GET /tiles/decode/{encoded}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAddressResponse {
    pub encoded: i64,
    pub file_id: i64,
    pub x: u32,
    pub y: u32,
    pub layer: u32,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// All tile errors are client errors: cache misses are logged at DEBUG
/// (common and expected), everything else at WARN.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileError::InvalidTileCoordinate { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_tile_coordinate")
            }
            TileError::UndecodableAddress { .. } => {
                (StatusCode::BAD_REQUEST, "undecodable_address")
            }
            TileError::InvalidView(ViewError::ViewOutOfBounds) => {
                (StatusCode::BAD_REQUEST, "view_out_of_bounds")
            }
            TileError::InvalidView(ViewError::DegenerateView { .. }) => {
                (StatusCode::BAD_REQUEST, "degenerate_view")
            }
            TileError::NotCached { .. } => (StatusCode::NOT_FOUND, "not_cached"),
        };
        let message = self.to_string();

        if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Tile not cached: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Wrapper for handler errors to implement IntoResponse.
pub struct HandlerError(pub TileError);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<TileError> for HandlerError {
    fn from(err: TileError) -> Self {
        HandlerError(err)
    }
}

impl From<ViewError> for HandlerError {
    fn from(err: ViewError) -> Self {
        HandlerError(TileError::InvalidView(err))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Resolve a view into the tiles covering it.
///
/// # Endpoint
///
/// `GET /tiles/required?xMin=&xMax=&yMin=&yMax=&mip=&width=&height=`
///
/// # Response
///
/// - `200 OK`: layer, mip and the covering tiles with their encoded addresses
/// - `400 Bad Request`: degenerate view or view outside the image
pub async fn required_tiles_handler(
    State(state): State<AppState>,
    Query(query): Query<RequiredTilesQuery>,
) -> Result<Json<RequiredTilesResponse>, HandlerError> {
    let view = query.view();
    let image_size = query.image_size();

    let tiles = resolve_view(&view, image_size, state.tile_size)?;
    let layer = mip_to_layer(view.mip, image_size, state.tile_size)
        .map(|layer| layer.max(0) as u32)
        .unwrap_or(0);

    debug!(layer, count = tiles.len(), "Resolved view");

    Ok(Json(RequiredTilesResponse {
        layer,
        mip: view.mip,
        tiles: tiles
            .iter()
            .map(|tile| TileEntry {
                x: tile.x,
                y: tile.y,
                layer: tile.layer,
                encoded: tile.encode(),
            })
            .collect(),
    }))
}

/// Decode an encoded tile address, optionally combined with a file id.
///
/// # Endpoint
///
/// `GET /tiles/decode/{encoded}`
///
/// # Response
///
/// - `200 OK`: file id and tile coordinate
/// - `400 Bad Request`: the address does not correspond to a tile
pub async fn decode_handler(
    Path(encoded): Path<i64>,
) -> Result<Json<DecodedAddressResponse>, HandlerError> {
    let tile = try_decode(remove_file_id(encoded)).map_err(|_| TileError::UndecodableAddress {
        encoded,
    })?;

    Ok(Json(DecodedAddressResponse {
        encoded,
        file_id: get_file_id(encoded),
        x: tile.x,
        y: tile.y,
        layer: tile.layer,
    }))
}

/// Plan tile fetches for a view of one file.
///
/// # Endpoint
///
/// `POST /files/{file_id}/requests`
///
/// # Response
///
/// - `200 OK`: a [`TilePlan`]; its `request` lists the tiles to fetch,
///   nearest the view centre first
/// - `400 Bad Request`: degenerate view or view outside the image
pub async fn plan_handler(
    State(state): State<AppState>,
    Path(file_id): Path<i32>,
    Json(body): Json<PlanRequest>,
) -> Result<Json<TilePlan>, HandlerError> {
    let tiles = resolve_view(&body.view, body.image_size, state.tile_size)?;
    let focus = focus_point(&body.view, state.tile_size);
    let quality = body.quality.unwrap_or(state.default_quality);

    let plan = state.planner.plan(file_id, &tiles, focus, quality).await;
    Ok(Json(plan))
}

/// Check a bare tile address taken from a per-file route.
///
/// The file id comes from the path, so keys that already carry file-id bits
/// are refused rather than stored under a second file.
fn tile_address(encoded: i64) -> Result<i64, TileError> {
    if !(0..FILE_ID_OFFSET).contains(&encoded) {
        return Err(TileError::UndecodableAddress { encoded });
    }
    try_decode(encoded)?;
    Ok(encoded)
}

/// Accept a compressed tile from the renderer.
///
/// # Endpoint
///
/// `PUT /files/{file_id}/tiles/{encoded}`
///
/// # Response
///
/// - `204 No Content`: tile stored in the system tier
/// - `400 Bad Request`: the address does not correspond to a tile
pub async fn put_tile_handler(
    State(state): State<AppState>,
    Path((file_id, encoded)): Path<(i32, i64)>,
    body: Bytes,
) -> Result<StatusCode, HandlerError> {
    let encoded = tile_address(encoded)?;

    let was_pending = state.planner.receive(file_id, encoded, body).await;
    if !was_pending {
        debug!(file_id, encoded, "Received tile that was not pending");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Read a cached tile.
///
/// # Endpoint
///
/// `GET /files/{file_id}/tiles/{encoded}`
///
/// # Response
///
/// - `200 OK`: tile payload as `application/octet-stream`, with the serving
///   tier in `X-Tile-Cache-Tier`
/// - `400 Bad Request`: the address does not correspond to a tile
/// - `404 Not Found`: tile is in neither tier
pub async fn get_tile_handler(
    State(state): State<AppState>,
    Path((file_id, encoded)): Path<(i32, i64)>,
) -> Result<Response, HandlerError> {
    let encoded = tile_address(encoded)?;
    let (tier, data) = state
        .planner
        .get_tile(file_id, encoded)
        .await
        .ok_or(TileError::NotCached { file_id, encoded })?;

    let tier = match tier {
        CacheTier::Gpu => "gpu",
        CacheTier::System => "system",
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::HeaderName::from_static("x-tile-cache-tier"), tier),
        ],
        Body::from(data),
    )
        .into_response())
}

/// Close a file, dropping its pending requests and cached tiles.
///
/// # Endpoint
///
/// `DELETE /files/{file_id}`
pub async fn close_file_handler(
    State(state): State<AppState>,
    Path(file_id): Path<i32>,
) -> StatusCode {
    state.planner.close_file(file_id).await;
    StatusCode::NO_CONTENT
}

// =============================================================================
// Tests
// =============================================================================
