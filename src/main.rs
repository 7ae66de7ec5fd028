//! Tile Pyramid - view resolution and tile caching service.
//!
//! This binary starts the HTTP server or runs one-shot resolve/decode commands.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_pyramid::{
    config::{Cli, Command, DecodeConfig, ResolveConfig, ServeConfig},
    server::{create_router, AppState, RouterConfig},
    tile::{
        add_file_id, decode, get_file_id, remove_file_id, rounded_gpu_capacity, TileCache,
        TileRequestPlanner,
    },
    view::{focus_point, mip_to_layer, resolve_view, sort_by_focus, FrameView, Point2D},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Resolve(config) => run_resolve(config),
        Command::Decode(config) => run_decode(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let gpu_capacity = rounded_gpu_capacity(config.gpu_tile_cache);

    info!("Tile Pyramid v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Tile size: {}px", config.tile_size);
    info!(
        "  Cache: {} GPU tiles ({} requested), {} system tiles",
        gpu_capacity, config.gpu_tile_cache, config.system_tile_cache
    );
    info!("  Compression quality: {}", config.compression_quality);

    let cache = TileCache::with_capacities(gpu_capacity, config.system_tile_cache);
    let planner = TileRequestPlanner::new(Arc::new(cache));
    let state = AppState::new(planner, config.tile_size)
        .with_default_quality(config.compression_quality);

    let router = create_router(state, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl 'http://{}/tiles/required?xMin=0&xMax=1024&yMin=0&yMax=1024&mip=1&width=4096&height=4096'",
        addr
    );
    info!("    curl http://{}/tiles/decode/16777216", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_pyramid=debug,tower_http=debug"
    } else {
        "tile_pyramid=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new();

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Resolve Command
// =============================================================================

fn run_resolve(config: ResolveConfig) -> ExitCode {
    if config.tile_size == 0 {
        eprintln!("Error: tile size must be greater than 0");
        return ExitCode::FAILURE;
    }

    let view = FrameView::new(
        config.x_min,
        config.x_max,
        config.y_min,
        config.y_max,
        config.mip,
    );
    let image_size = Point2D::new(config.width, config.height);
    let tile_size = Point2D::square(f64::from(config.tile_size));

    let mut tiles = match resolve_view(&view, image_size, tile_size) {
        Ok(tiles) => tiles,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.by_focus {
        sort_by_focus(&mut tiles, focus_point(&view, tile_size));
    }

    let layer = mip_to_layer(view.mip, image_size, tile_size).map(|layer| layer.max(0));

    let entries: Vec<_> = tiles
        .iter()
        .map(|tile| {
            let encoded = tile.encode();
            serde_json::json!({
                "x": tile.x,
                "y": tile.y,
                "layer": tile.layer,
                "encoded": encoded,
                "key": config.file_id.map(|file_id| add_file_id(encoded, file_id)),
            })
        })
        .collect();

    let json = serde_json::json!({
        "layer": layer,
        "mip": view.mip,
        "count": entries.len(),
        "tiles": entries,
    });

    print_json(&json)
}

// =============================================================================
// Decode Command
// =============================================================================

fn run_decode(config: DecodeConfig) -> ExitCode {
    let mut failed = false;

    for &address in &config.addresses {
        match decode(remove_file_id(address)) {
            Some(tile) => println!(
                "{}: file {} tile ({}, {}) layer {}",
                address,
                get_file_id(address),
                tile.x,
                tile.y,
                tile.layer
            ),
            None => {
                println!("{}: not a tile address", address);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_json(value: &serde_json::Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
