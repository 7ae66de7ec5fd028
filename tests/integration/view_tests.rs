//! View resolution tests through the public crate API.
//!
//! Tests verify:
//! - Coverage of the image by the resolved tile set at every layer
//! - Agreement between resolved tiles and the address codec
//! - Mip selection and the mip/layer round trip

use std::collections::HashSet;

use tile_pyramid::tile::{decode, TileCoordinate, MAX_LAYER};
use tile_pyramid::view::{
    focus_point, layer_to_mip, mip_to_layer, required_tiles, sort_by_focus, total_layers,
    FrameView, Point2D,
};

const TILE: Point2D = Point2D::square(256.0);

#[test]
fn test_full_view_covers_every_tile_of_layer() {
    let image = Point2D::new(3000.0, 2000.0);
    let total = total_layers(image, TILE).unwrap();
    assert_eq!(total, 4);

    for layer in 0..=total {
        let mip = layer_to_mip(layer, image, TILE).unwrap();
        let view = FrameView::new(0.0, image.x, 0.0, image.y, mip);
        let tiles = required_tiles(&view, image, TILE);

        let footprint = mip * TILE.x;
        let expected_x = (image.x / footprint).ceil() as usize;
        let expected_y = (image.y / footprint).ceil() as usize;
        assert_eq!(tiles.len(), expected_x * expected_y, "layer {}", layer);

        let unique: HashSet<_> = tiles.iter().collect();
        assert_eq!(unique.len(), tiles.len());
        assert!(tiles.iter().all(|t| t.layer == layer as u32));
    }
}

#[test]
fn test_resolved_tiles_round_trip_through_codec() {
    let image = Point2D::square(65536.0);
    let view = FrameView::new(10_000.0, 14_000.0, 30_000.0, 33_000.0, 1.0);

    let tiles = required_tiles(&view, image, TILE);
    assert!(!tiles.is_empty());

    for tile in &tiles {
        assert!(tile.layer <= MAX_LAYER);
        let encoded = tile.encode();
        assert!(encoded >= 0);
        assert_eq!(decode(encoded), Some(*tile));
    }
}

#[test]
fn test_deepest_layer_of_largest_image() {
    // 4096 tiles per axis is the limit of the address space
    let image = Point2D::square(4096.0 * 256.0);
    assert_eq!(total_layers(image, TILE), Some(MAX_LAYER as i32));

    let view = FrameView::new(image.x - 256.0, image.x, image.y - 256.0, image.y, 1.0);
    let tiles = required_tiles(&view, image, TILE);
    assert_eq!(tiles, vec![TileCoordinate::new(4095, 4095, MAX_LAYER)]);
    assert_eq!(decode(tiles[0].encode()), Some(tiles[0]));
}

#[test]
fn test_unit_mip_round_trip() {
    let image = Point2D::square(1000.0);
    let tile = Point2D::square(100.0);

    let layer = mip_to_layer(1.0, image, tile).unwrap();
    assert_eq!(layer, 4);

    let mip = layer_to_mip(layer, image, tile).unwrap();
    assert!(mip <= 1.0);
    assert!(mip * tile.x >= 1.0);
}

#[test]
fn test_rounded_mip_feeds_resolver() {
    let image = Point2D::square(8192.0);

    // Zoomed out to a third: rounds to mip 4, two layers above full resolution
    let mip = FrameView::rounded_mip(1.0 / 3.0, false);
    assert_eq!(mip, 4.0);
    assert_eq!(mip_to_layer(mip, image, TILE), Some(3));

    // Low bandwidth halves the resolution again
    let mip = FrameView::rounded_mip(1.0 / 3.0, true);
    assert_eq!(mip, 8.0);
    assert_eq!(mip_to_layer(mip, image, TILE), Some(2));
}

#[test]
fn test_focus_ordering_of_resolved_view() {
    let image = Point2D::square(2048.0);
    let view = FrameView::new(512.0, 1536.0, 512.0, 1536.0, 1.0);

    let mut tiles = required_tiles(&view, image, TILE);
    assert_eq!(tiles.len(), 16);

    let focus = focus_point(&view, TILE);
    assert_eq!(focus, Point2D::new(3.5, 3.5));

    sort_by_focus(&mut tiles, focus);
    let nearest: HashSet<_> = tiles[..4].iter().map(|t| (t.x, t.y)).collect();
    assert_eq!(nearest, HashSet::from([(3, 3), (3, 4), (4, 3), (4, 4)]));
}

#[test]
fn test_degenerate_views_resolve_to_nothing() {
    let image = Point2D::square(1024.0);

    let views = [
        FrameView::new(f64::NAN, 512.0, 0.0, 512.0, 1.0),
        FrameView::new(0.0, f64::INFINITY, 0.0, 512.0, 1.0),
        FrameView::new(0.0, 512.0, 0.0, 512.0, 0.0),
        FrameView::new(512.0, 0.0, 0.0, 512.0, 1.0),
        FrameView::new(-600.0, -100.0, 0.0, 512.0, 1.0),
        FrameView::new(1024.0, 2048.0, 0.0, 512.0, 1.0),
    ];

    for view in views {
        assert!(required_tiles(&view, image, TILE).is_empty(), "{:?}", view);
    }

    let view = FrameView::new(0.0, 512.0, 0.0, 512.0, 1.0);
    assert!(required_tiles(&view, Point2D::new(0.0, 1024.0), TILE).is_empty());
    assert!(required_tiles(&view, image, Point2D::square(-1.0)).is_empty());
}
