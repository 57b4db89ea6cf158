//! # Photo Mosaic
//!
//! Rebuilds an uploaded picture out of a corpus of small tile images.
//!
//! The source image is cut into square blocks. Each block is replaced by the
//! tile whose average color is closest to the color at the block's corner,
//! shrunk to the block size by nearest-neighbour subsampling. The four
//! quadrants of the image are composed in parallel and merged into a single
//! canvas which is returned as JPEG.
//!
//! ## Features
//!
//! - **Color index**: Average color of every tile, computed once at startup
//!   and rebuildable at runtime without disturbing in-flight requests
//! - **Parallel composition**: One worker per quadrant, merged into disjoint
//!   regions of the output canvas as each finishes
//! - **Patch caching**: Rendered tiles are reused across blocks and requests
//! - **Web front end**: Upload page showing original and mosaic side by side
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`color`] - Color signatures and the distance metric
//! - [`codec`] - Image decoding and JPEG encoding
//! - [`index`] - Tile corpus access, color index and the shared database
//! - [`mosaic`] - Rendering, compositing, quadrant pipeline and service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use photo_mosaic::{create_router, DirectoryTileSource, MosaicService, RouterConfig, TileDatabase};
//!
//! #[tokio::main]
//! async fn main() {
//!     let database = TileDatabase::load(DirectoryTileSource::new("tiles"))
//!         .await
//!         .expect("index tiles");
//!     let service = MosaicService::new(database);
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod index;
pub mod mosaic;
pub mod server;

// Re-export commonly used types
pub use codec::{
    clamp_quality, is_valid_quality, ImageCodec, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY,
    MIN_JPEG_QUALITY,
};
pub use color::{distance, ColorSignature};
pub use config::{Cli, Command, IndexConfig, ServeConfig};
pub use error::{CodecError, IoError, MosaicError, RenderError};
pub use index::{DirectoryTileSource, TileDatabase, TileIndex, TileRecord, TileSource};
pub use mosaic::{
    partition, subsample, BlockCompositor, ComposedMosaic, CompositeStats, MosaicRequest,
    MosaicResponse, MosaicService, PatchCache, PatchCacheKey, Quadrant, QuadrantPipeline, Region,
    RegionCanvas, TileRenderer, DEFAULT_MAX_TILE_SIZE, DEFAULT_PATCH_CACHE_CAPACITY,
};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
