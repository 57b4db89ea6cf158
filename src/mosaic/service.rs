//! Mosaic Service for orchestrating mosaic generation.
//!
//! The MosaicService is the main entry point for mosaic requests. It
//! orchestrates:
//! - Request validation
//! - Source image decoding
//! - Index snapshotting
//! - Quadrant composition
//! - JPEG encoding
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        MosaicService                            │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                      generate()                         │    │
//! │  │  1. Validate params   4. Compose quadrants              │    │
//! │  │  2. Decode source     5. Encode JPEG                    │    │
//! │  │  3. Take snapshot                                       │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌─────────────┐    ┌────────────────┐    ┌──────────────┐    │
//! │    │TileDatabase │    │QuadrantPipeline│    │  ImageCodec  │    │
//! │    └─────────────┘    └────────────────┘    └──────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use image::RgbaImage;
use tracing::info;

use crate::codec::{is_valid_quality, ImageCodec, DEFAULT_JPEG_QUALITY};
use crate::error::MosaicError;
use crate::index::{TileDatabase, TileSource};

use super::cache::{PatchCache, DEFAULT_PATCH_CACHE_CAPACITY};
use super::compositor::CompositeStats;
use super::pipeline::{ComposedMosaic, QuadrantPipeline};
use super::render::TileRenderer;

/// Default upper bound for the tile size of a request.
pub const DEFAULT_MAX_TILE_SIZE: u32 = 512;

// =============================================================================
// Mosaic Request
// =============================================================================

/// A request to turn an uploaded image into a mosaic.
#[derive(Debug, Clone)]
pub struct MosaicRequest {
    /// Encoded source image (JPEG or PNG)
    pub image: Bytes,

    /// Side length of each block in pixels
    pub tile_size: u32,

    /// JPEG quality of the result (1-100, defaults to 80)
    pub quality: u8,
}

impl MosaicRequest {
    /// Create a request with default quality.
    pub fn new(image: impl Into<Bytes>, tile_size: u32) -> Self {
        Self {
            image: image.into(),
            tile_size,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Create a request with specified quality.
    pub fn with_quality(image: impl Into<Bytes>, tile_size: u32, quality: u8) -> Self {
        Self {
            image: image.into(),
            tile_size,
            quality,
        }
    }
}

// =============================================================================
// Mosaic Response
// =============================================================================

/// Response from the mosaic service.
#[derive(Debug, Clone)]
pub struct MosaicResponse {
    /// The encoded JPEG mosaic
    pub data: Bytes,

    pub width: u32,
    pub height: u32,
    pub tile_size: u32,

    /// The JPEG quality used for encoding
    pub quality: u8,

    pub stats: CompositeStats,

    /// Wall time from receiving the request to the encoded result
    pub elapsed: Duration,
}

// =============================================================================
// Mosaic Service
// =============================================================================

/// Service for generating mosaics against a shared tile database.
///
/// # Example
///
/// ```ignore
/// use photo_mosaic::index::{DirectoryTileSource, TileDatabase};
/// use photo_mosaic::mosaic::{MosaicRequest, MosaicService};
///
/// let database = TileDatabase::load(DirectoryTileSource::new("tiles")).await?;
/// let service = MosaicService::new(database);
///
/// let response = service.generate(MosaicRequest::new(upload, 16)).await?;
/// println!("{} blocks in {:?}", response.stats.blocks, response.elapsed);
/// ```
pub struct MosaicService<S: TileSource> {
    database: Arc<TileDatabase<S>>,
    pipeline: QuadrantPipeline<S>,
    patch_cache: Arc<PatchCache>,
    codec: ImageCodec,
    max_tile_size: u32,
}

impl<S: TileSource + 'static> MosaicService<S> {
    /// Create a new service with default cache and limits.
    pub fn new(database: TileDatabase<S>) -> Self {
        Self::with_options(database, DEFAULT_PATCH_CACHE_CAPACITY, DEFAULT_MAX_TILE_SIZE)
    }

    /// Create a new service with custom patch cache capacity and tile size limit.
    pub fn with_options(database: TileDatabase<S>, cache_patches: usize, max_tile_size: u32) -> Self {
        Self::with_shared_database(Arc::new(database), cache_patches, max_tile_size)
    }

    /// Create a new service around a database shared with other components.
    pub fn with_shared_database(
        database: Arc<TileDatabase<S>>,
        cache_patches: usize,
        max_tile_size: u32,
    ) -> Self {
        let patch_cache = Arc::new(PatchCache::with_capacity(cache_patches));
        let renderer = TileRenderer::with_cache(
            Arc::clone(database.source()),
            Arc::clone(&patch_cache),
        );

        Self {
            database,
            pipeline: QuadrantPipeline::new(Arc::new(renderer)),
            patch_cache,
            codec: ImageCodec::new(),
            max_tile_size,
        }
    }

    /// Generate a mosaic from an encoded upload.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The quality or tile size is invalid
    /// - The source image cannot be decoded or is empty
    /// - The tile index is empty
    /// - The result cannot be encoded
    pub async fn generate(&self, request: MosaicRequest) -> Result<MosaicResponse, MosaicError> {
        let started = Instant::now();

        if !is_valid_quality(request.quality) {
            return Err(MosaicError::InvalidQuality {
                quality: request.quality,
            });
        }
        self.validate_tile_size(request.tile_size)?;

        let codec = self.codec.clone();
        let upload = request.image.clone();
        let source = run_blocking(move || codec.decode_rgba(&upload))
            .await?
            .map_err(MosaicError::SourceDecode)?;

        let ComposedMosaic { image, stats } = self.compose_image(source, request.tile_size).await?;
        let (width, height) = image.dimensions();

        let codec = self.codec.clone();
        let quality = request.quality;
        let data = run_blocking(move || codec.encode_jpeg(&image, quality))
            .await?
            .map_err(MosaicError::Encode)?;

        let elapsed = started.elapsed();
        info!(
            width = width,
            height = height,
            tile_size = request.tile_size,
            blocks = stats.blocks,
            skipped = stats.blocks_skipped,
            elapsed_ms = elapsed.as_millis() as u64,
            "Mosaic generated"
        );

        Ok(MosaicResponse {
            data,
            width,
            height,
            tile_size: request.tile_size,
            quality,
            stats,
            elapsed,
        })
    }

    /// Compose an already decoded image against the current index.
    pub async fn compose_image(
        &self,
        source: RgbaImage,
        tile_size: u32,
    ) -> Result<ComposedMosaic, MosaicError> {
        self.validate_tile_size(tile_size)?;

        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(MosaicError::EmptySource { width, height });
        }

        let snapshot = self.database.snapshot().await;
        if snapshot.is_empty() {
            return Err(MosaicError::NoTilesAvailable);
        }

        self.pipeline
            .compose(Arc::new(source), snapshot, tile_size)
            .await
    }

    fn validate_tile_size(&self, tile_size: u32) -> Result<(), MosaicError> {
        if tile_size == 0 {
            return Err(MosaicError::InvalidTileSize {
                tile_size,
                reason: "must be positive".to_string(),
            });
        }
        if tile_size > self.max_tile_size {
            return Err(MosaicError::InvalidTileSize {
                tile_size,
                reason: format!("exceeds maximum of {}", self.max_tile_size),
            });
        }
        Ok(())
    }

    /// Get a reference to the underlying tile database.
    pub fn database(&self) -> &Arc<TileDatabase<S>> {
        &self.database
    }

    /// Get patch cache statistics.
    ///
    /// Returns `(entries, capacity, hits, misses)`.
    pub fn cache_stats(&self) -> (usize, usize, u64, u64) {
        let (hits, misses) = self.patch_cache.stats();
        (
            self.patch_cache.len(),
            self.patch_cache.capacity(),
            hits,
            misses,
        )
    }

    /// Clear the patch cache.
    ///
    /// Called after a corpus rebuild, since a tile file may have changed on
    /// disk under the same identifier.
    pub fn clear_cache(&self) {
        self.patch_cache.clear();
    }

    /// Rebuild the tile index and drop cached patches.
    pub async fn reload_tiles(&self) -> Result<usize, MosaicError> {
        let count = self.database.rebuild().await?;
        self.clear_cache();
        Ok(count)
    }

    pub fn max_tile_size(&self) -> u32 {
        self.max_tile_size
    }
}

/// Run CPU-bound work off the async executor.
async fn run_blocking<T, F>(work: F) -> Result<T, MosaicError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| MosaicError::TaskFailed {
            message: e.to_string(),
        })
}

// =============================================================================
// Tests
// =============================================================================
