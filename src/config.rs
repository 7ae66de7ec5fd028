//! Configuration management for the tile pyramid service.
//!
//! This module provides the command-line interface:
//! - `serve` runs the HTTP tile service
//! - `resolve` prints the tiles a single view requires
//! - `decode` explains encoded tile addresses
//!
//! # Environment Variables
//!
//! Server options can be set via environment variables with the `TILES_` prefix:
//!
//! - `TILES_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILES_PORT` - Server port (default: 3000)
//! - `TILES_TILE_SIZE` - Tile edge length in pixels (default: 256)
//! - `TILES_GPU_TILE_CACHE` - GPU tier capacity in tiles (default: 1024)
//! - `TILES_SYSTEM_TILE_CACHE` - System tier capacity in tiles (default: 4096)
//! - `TILES_COMPRESSION_QUALITY` - Default compression quality (default: 11)
//! - `TILES_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use clap::{Args, Parser, Subcommand};

use crate::tile::{
    DEFAULT_COMPRESSION_QUALITY, DEFAULT_GPU_TILE_CACHE, DEFAULT_SYSTEM_TILE_CACHE,
    MAX_COMPRESSION_QUALITY, MIN_COMPRESSION_QUALITY, TILE_SIZE,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = TILE_SIZE as u32;

/// Bounds for the GPU tile cache setting: (min, max, step).
pub const GPU_TILE_CACHE_BOUNDS: (usize, usize, usize) = (512, 4096, 512);

/// Bounds for the system tile cache setting: (min, max, step).
pub const SYSTEM_TILE_CACHE_BOUNDS: (usize, usize, usize) = (1024, 16384, 1024);

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile pyramid service: view resolution, tile addressing and caching.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-pyramid")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP tile service.
    Serve(ServeConfig),

    /// Print the tiles required to display one view.
    Resolve(ResolveConfig),

    /// Decode one or more encoded tile addresses.
    Decode(DecodeConfig),
}

/// Options for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILES_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILES_PORT")]
    pub port: u16,

    // =========================================================================
    // Tile Configuration
    // =========================================================================
    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILES_TILE_SIZE")]
    pub tile_size: u32,

    /// Default compression quality for requested tiles (4-32).
    #[arg(long, default_value_t = DEFAULT_COMPRESSION_QUALITY, env = "TILES_COMPRESSION_QUALITY")]
    pub compression_quality: u8,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Tiles kept decoded in the GPU tier (512-4096, multiples of 512).
    #[arg(long, default_value_t = DEFAULT_GPU_TILE_CACHE, env = "TILES_GPU_TILE_CACHE")]
    pub gpu_tile_cache: usize,

    /// Compressed tiles kept in the system tier (1024-16384, multiples of 1024).
    #[arg(long, default_value_t = DEFAULT_SYSTEM_TILE_CACHE, env = "TILES_SYSTEM_TILE_CACHE")]
    pub system_tile_cache: usize,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "TILES_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }

        check_stepped("gpu_tile_cache", self.gpu_tile_cache, GPU_TILE_CACHE_BOUNDS)?;
        check_stepped(
            "system_tile_cache",
            self.system_tile_cache,
            SYSTEM_TILE_CACHE_BOUNDS,
        )?;

        if !crate::tile::is_valid_quality(self.compression_quality) {
            return Err(format!(
                "compression_quality must be between {} and {}",
                MIN_COMPRESSION_QUALITY, MAX_COMPRESSION_QUALITY
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn check_stepped(
    name: &str,
    value: usize,
    (min, max, step): (usize, usize, usize),
) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("{} must be between {} and {}", name, min, max));
    }
    if value % step != 0 {
        return Err(format!("{} must be a multiple of {}", name, step));
    }
    Ok(())
}

/// Options for `resolve`.
#[derive(Args, Debug, Clone)]
pub struct ResolveConfig {
    /// Left edge of the view in image pixels.
    #[arg(long, allow_hyphen_values = true)]
    pub x_min: f64,

    /// Right edge of the view in image pixels.
    #[arg(long, allow_hyphen_values = true)]
    pub x_max: f64,

    /// Top edge of the view in image pixels.
    #[arg(long, allow_hyphen_values = true)]
    pub y_min: f64,

    /// Bottom edge of the view in image pixels.
    #[arg(long, allow_hyphen_values = true)]
    pub y_max: f64,

    /// Downsampling factor of the view.
    #[arg(long, default_value_t = 1.0)]
    pub mip: f64,

    /// Image width in pixels.
    #[arg(long)]
    pub width: f64,

    /// Image height in pixels.
    #[arg(long)]
    pub height: f64,

    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,

    /// Also print addresses combined with this file id.
    #[arg(long, allow_hyphen_values = true)]
    pub file_id: Option<i32>,

    /// Sort tiles nearest the view centre first.
    #[arg(long, default_value_t = false)]
    pub by_focus: bool,
}

/// Options for `decode`.
#[derive(Args, Debug, Clone)]
pub struct DecodeConfig {
    /// Encoded tile addresses, optionally combined with a file id.
    #[arg(required = true, allow_hyphen_values = true)]
    pub addresses: Vec<i64>,
}

// =============================================================================
// Tests
// =============================================================================
