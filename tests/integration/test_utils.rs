//! Shared helpers for integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tile_pyramid::tile::{TileCache, TileRequestPlanner};
use tile_pyramid::{create_router, AppState, RouterConfig};

/// Tile edge length used by the test router.
pub const TEST_TILE_SIZE: u32 = 256;

/// Application state with a default-sized cache and 256px tiles.
pub fn test_state() -> AppState {
    let planner = TileRequestPlanner::new(Arc::new(TileCache::new()));
    AppState::new(planner, TEST_TILE_SIZE)
}

/// Router over `state` without request tracing.
pub fn test_router(state: AppState) -> Router {
    create_router(state, RouterConfig::new().with_tracing(false))
}

/// Send one request through a clone of `router`.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub async fn post_json(router: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub async fn put_bytes(router: &Router, uri: &str, body: &'static [u8]) -> Response<Body> {
    let request = Request::builder()
        .method("PUT")
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    send(router, request).await
}

pub async fn delete(router: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

/// Collect a response body as bytes.
pub async fn body_bytes(response: Response<Body>) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = body_bytes(response).await;
    serde_json::from_slice(&body).unwrap()
}

/// JSON body for a plan request covering `[0, size] × [0, size]` of a
/// square image at `mip`.
pub fn plan_body(view_size: f64, image_size: f64, mip: f64) -> serde_json::Value {
    serde_json::json!({
        "view": {"xMin": 0.0, "xMax": view_size, "yMin": 0.0, "yMax": view_size, "mip": mip},
        "imageSize": {"x": image_size, "y": image_size}
    })
}
