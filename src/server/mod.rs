//! HTTP server layer.
//!
//! Exposes view resolution, address decoding and the request planner over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   /tiles/required   /tiles/decode/{encoded}   /files/{id}/...   │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (view → tiles → plan)    │  │  (router config, CORS)      │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    close_file_handler, decode_handler, get_tile_handler, health_handler, plan_handler,
    put_tile_handler, required_tiles_handler, AppState, DecodedAddressResponse, ErrorResponse,
    HandlerError, HealthResponse, PlanRequest, RequiredTilesQuery, RequiredTilesResponse,
    TileEntry,
};
pub use routes::{create_router, RouterConfig};
