//! Configuration management for the mosaic server.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `MOSAIC_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `MOSAIC_HOST` - Server bind address (default: 0.0.0.0)
//! - `MOSAIC_PORT` - Server port (default: 8080)
//! - `MOSAIC_TILES_DIR` - Directory of tile images (default: tiles)
//! - `MOSAIC_JPEG_QUALITY` - Default JPEG quality (default: 80)
//! - `MOSAIC_CACHE_PATCHES` - Max rendered patches to cache (default: 1024)
//! - `MOSAIC_MAX_UPLOAD_BYTES` - Upload size limit (default: 10 MiB)
//! - `MOSAIC_MAX_TILE_SIZE` - Largest accepted tile size (default: 512)
//! - `MOSAIC_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use clap::{Args, Parser, Subcommand};

use crate::codec::{is_valid_quality, DEFAULT_JPEG_QUALITY};
use crate::mosaic::{DEFAULT_MAX_TILE_SIZE, DEFAULT_PATCH_CACHE_CAPACITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default tile corpus directory.
pub const DEFAULT_TILES_DIR: &str = "tiles";

/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Photo mosaic - rebuild pictures out of tile images.
#[derive(Parser, Debug, Clone)]
#[command(name = "photo-mosaic")]
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
    /// Run the mosaic web server.
    Serve(ServeConfig),

    /// Build the tile index once and report on it.
    Index(IndexConfig),
}

// =============================================================================
// Serve
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "MOSAIC_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "MOSAIC_PORT")]
    pub port: u16,

    /// Directory containing the tile images.
    #[arg(long, default_value = DEFAULT_TILES_DIR, env = "MOSAIC_TILES_DIR")]
    pub tiles_dir: String,

    /// Default JPEG quality for mosaic encoding (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "MOSAIC_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Maximum number of rendered tile patches to keep in memory.
    #[arg(long, default_value_t = DEFAULT_PATCH_CACHE_CAPACITY, env = "MOSAIC_CACHE_PATCHES")]
    pub cache_patches: usize,

    /// Maximum accepted upload size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "MOSAIC_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Largest tile size a request may ask for.
    #[arg(long, default_value_t = DEFAULT_MAX_TILE_SIZE, env = "MOSAIC_MAX_TILE_SIZE")]
    pub max_tile_size: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, or if `*` is listed, allows any origin.
    #[arg(long, env = "MOSAIC_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

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
        if self.tiles_dir.is_empty() {
            return Err("Tile directory is required. Set --tiles-dir or MOSAIC_TILES_DIR".to_string());
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.cache_patches == 0 {
            return Err("cache_patches must be greater than 0".to_string());
        }

        if self.max_upload_bytes < 1024 {
            return Err("max_upload_bytes must be at least 1KB".to_string());
        }

        if self.max_tile_size == 0 {
            return Err("max_tile_size must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Index
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct IndexConfig {
    /// Directory containing the tile images.
    #[arg(long, default_value = DEFAULT_TILES_DIR, env = "MOSAIC_TILES_DIR")]
    pub tiles_dir: String,

    /// Print every indexed tile with its average color.
    #[arg(long, default_value_t = false)]
    pub list: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tiles_dir.is_empty() {
            return Err("Tile directory is required. Set --tiles-dir or MOSAIC_TILES_DIR".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
