//! Block compositor.
//!
//! Fills one rectangular region of the mosaic. The region is walked in
//! block-sized steps, row-major from its top-left corner. For each block the
//! source pixel at the block's corner stands in for the whole block's color;
//! the nearest tile is looked up, rendered to a patch and painted into the
//! region's own canvas, clipped at the region edge.
//!
//! A block whose tile cannot be read or decoded is left transparent black and
//! the walk continues. An empty index, or a block wider than the matched
//! tile, aborts the region.

use std::sync::Arc;

use image::{imageops, RgbaImage};
use tracing::{debug, warn};

use crate::color::ColorSignature;
use crate::error::{MosaicError, RenderError};
use crate::index::{TileIndex, TileSource};

use super::geometry::Region;
use super::render::TileRenderer;

// =============================================================================
// Results
// =============================================================================

/// Block counters for one region (or, summed, for a whole mosaic).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    /// Blocks visited
    pub blocks: usize,

    /// Blocks left unfilled because their tile failed to render
    pub blocks_skipped: usize,
}

impl CompositeStats {
    pub fn blocks_filled(&self) -> usize {
        self.blocks - self.blocks_skipped
    }
}

impl std::ops::AddAssign for CompositeStats {
    fn add_assign(&mut self, other: Self) {
        self.blocks += other.blocks;
        self.blocks_skipped += other.blocks_skipped;
    }
}

/// Composed pixels for one region, in region-local coordinates.
#[derive(Debug, Clone)]
pub struct RegionCanvas {
    /// Where this canvas belongs on the full mosaic
    pub region: Region,

    /// `region.width × region.height` pixels
    pub image: RgbaImage,

    pub stats: CompositeStats,
}

// =============================================================================
// BlockCompositor
// =============================================================================

/// Composites regions of one source image against one index snapshot.
pub struct BlockCompositor<'a, S: TileSource> {
    source: &'a RgbaImage,
    index: &'a TileIndex,
    renderer: &'a TileRenderer<S>,
    block_size: u32,
}

impl<'a, S: TileSource> BlockCompositor<'a, S> {
    pub fn new(
        source: &'a RgbaImage,
        index: &'a TileIndex,
        renderer: &'a TileRenderer<S>,
        block_size: u32,
    ) -> Self {
        Self {
            source,
            index,
            renderer,
            block_size,
        }
    }

    /// Compose `region` into a fresh canvas of the region's size.
    ///
    /// # Errors
    ///
    /// - [`MosaicError::InvalidTileSize`] for a zero block size
    /// - [`MosaicError::NoTilesAvailable`] if the index is empty and the
    ///   region has at least one block
    /// - [`MosaicError::InvalidTileSize`] if a matched tile is narrower than
    ///   the block
    pub fn composite(&self, region: Region) -> Result<RegionCanvas, MosaicError> {
        if self.block_size == 0 {
            return Err(MosaicError::InvalidTileSize {
                tile_size: 0,
                reason: "must be positive".to_string(),
            });
        }

        let mut canvas = RgbaImage::new(region.width, region.height);
        let mut stats = CompositeStats::default();

        for (x, y) in region.block_origins(self.block_size) {
            stats.blocks += 1;

            let target = ColorSignature::from_pixel(self.source.get_pixel(x, y));
            let tile_id = self.index.nearest(target)?;

            match self.renderer.render(&tile_id, self.block_size) {
                Ok(patch) => {
                    let local_x = (x - region.x) as i64;
                    let local_y = (y - region.y) as i64;
                    imageops::replace(&mut canvas, &*patch, local_x, local_y);
                }
                Err(RenderError::BlockTooLarge {
                    block_size,
                    tile_width,
                }) => {
                    return Err(MosaicError::InvalidTileSize {
                        tile_size: block_size,
                        reason: format!(
                            "larger than tile {} ({}px wide)",
                            tile_id, tile_width
                        ),
                    });
                }
                Err(RenderError::InvalidBlockSize(block_size)) => {
                    return Err(MosaicError::InvalidTileSize {
                        tile_size: block_size,
                        reason: "must be positive".to_string(),
                    });
                }
                Err(e @ (RenderError::Io(_) | RenderError::Codec(_))) => {
                    stats.blocks_skipped += 1;
                    warn!(
                        tile_id = %tile_id,
                        x = x,
                        y = y,
                        error = %e,
                        "Failed to render tile, leaving block empty"
                    );
                }
            }
        }

        debug!(
            region = %region,
            blocks = stats.blocks,
            skipped = stats.blocks_skipped,
            "Region composed"
        );

        Ok(RegionCanvas {
            region,
            image: canvas,
            stats,
        })
    }
}

/// Owned-argument form of [`BlockCompositor::composite`] for worker threads.
pub fn composite_region<S: TileSource>(
    source: Arc<RgbaImage>,
    index: Arc<TileIndex>,
    renderer: Arc<TileRenderer<S>>,
    block_size: u32,
    region: Region,
) -> Result<RegionCanvas, MosaicError> {
    BlockCompositor::new(&source, &index, &renderer, block_size).composite(region)
}

// =============================================================================
// Tests
// =============================================================================
