//! Quadrant pipeline.
//!
//! Composes a full mosaic by splitting the canvas into four quadrants and
//! running one [`BlockCompositor`](super::compositor::BlockCompositor) per
//! quadrant in parallel.
//!
//! # Flow
//!
//! ```text
//!                  ┌──────────────┐
//!                  │   partition  │
//!                  └──────┬───────┘
//!        ┌───────────┬────┴──────┬───────────┐
//!        ▼           ▼           ▼           ▼
//!   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐
//!   │ top     │ │ top     │ │ bottom  │ │ bottom  │   spawn_blocking
//!   │ left    │ │ right   │ │ left    │ │ right   │   (JoinSet)
//!   └────┬────┘ └────┬────┘ └────┬────┘ └────┬────┘
//!        └───────────┴─────┬─────┴───────────┘
//!                          ▼  any arrival order
//!                  ┌──────────────┐
//!                  │    merger    │  one scoped draw per arrival,
//!                  │              │  scope end = completion barrier
//!                  └──────────────┘
//! ```
//!
//! The four draws write disjoint row slices of the same canvas, so they need
//! no lock; the merger only hands the canvas back once every draw has joined.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use image::RgbaImage;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::MosaicError;
use crate::index::{TileIndex, TileSource};

use super::compositor::{composite_region, CompositeStats, RegionCanvas};
use super::geometry::{partition, Quadrant};
use super::render::TileRenderer;

/// Bytes per RGBA8 pixel.
const BYTES_PER_PIXEL: usize = 4;

/// A fully composed mosaic.
#[derive(Debug, Clone)]
pub struct ComposedMosaic {
    pub image: RgbaImage,
    pub stats: CompositeStats,
}

// =============================================================================
// QuadrantPipeline
// =============================================================================

/// Four-way parallel mosaic compositor.
pub struct QuadrantPipeline<S: TileSource> {
    renderer: Arc<TileRenderer<S>>,
}

impl<S: TileSource + 'static> QuadrantPipeline<S> {
    pub fn new(renderer: Arc<TileRenderer<S>>) -> Self {
        Self { renderer }
    }

    /// Compose `source` out of tiles from `snapshot`.
    ///
    /// The output has the same dimensions as the source.
    ///
    /// # Errors
    ///
    /// - [`MosaicError::InvalidTileSize`] if `block_size` is zero
    /// - [`MosaicError::EmptySource`] if the source has no pixels
    /// - [`MosaicError::NoTilesAvailable`] if the snapshot is empty
    /// - [`MosaicError::InvalidTileSize`] if a matched tile is narrower than
    ///   `block_size`
    /// - [`MosaicError::TaskFailed`] if a worker panics
    pub async fn compose(
        &self,
        source: Arc<RgbaImage>,
        snapshot: Arc<TileIndex>,
        block_size: u32,
    ) -> Result<ComposedMosaic, MosaicError> {
        if block_size == 0 {
            return Err(MosaicError::InvalidTileSize {
                tile_size: block_size,
                reason: "must be positive".to_string(),
            });
        }

        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(MosaicError::EmptySource { width, height });
        }

        // Dispatch one compositor per quadrant
        let mut quadrants = JoinSet::new();
        for (quadrant, region) in partition(width, height) {
            let source = Arc::clone(&source);
            let snapshot = Arc::clone(&snapshot);
            let renderer = Arc::clone(&self.renderer);

            quadrants.spawn_blocking(move || {
                let result = composite_region(source, snapshot, renderer, block_size, region);
                (quadrant, result)
            });
        }

        // The merger draws each quadrant as soon as it arrives
        let (arrivals, inbox) = mpsc::channel();
        let merger = tokio::task::spawn_blocking(move || merge_quadrants(width, height, inbox));

        let mut stats = CompositeStats::default();
        while let Some(joined) = quadrants.join_next().await {
            let (quadrant, result) = joined.map_err(|e| MosaicError::TaskFailed {
                message: e.to_string(),
            })?;
            let canvas = result?;

            debug!(
                quadrant = %quadrant,
                region = %canvas.region,
                blocks = canvas.stats.blocks,
                "Quadrant finished"
            );
            stats += canvas.stats;

            if arrivals.send((quadrant, canvas)).is_err() {
                return Err(MosaicError::TaskFailed {
                    message: "merger stopped before all quadrants arrived".to_string(),
                });
            }
        }
        drop(arrivals);

        let image = merger.await.map_err(|e| MosaicError::TaskFailed {
            message: e.to_string(),
        })?;

        Ok(ComposedMosaic { image, stats })
    }
}

// =============================================================================
// Merge
// =============================================================================

/// Row slices of the final canvas belonging to one quadrant.
#[derive(Default)]
struct QuadrantRows<'a> {
    rows: Vec<&'a mut [u8]>,
}

impl QuadrantRows<'_> {
    /// Copy a quadrant canvas row by row into its slices.
    fn draw(self, patch: &RgbaImage) {
        let patch_stride = patch.width() as usize * BYTES_PER_PIXEL;
        if patch_stride == 0 {
            return;
        }

        for (dst, src) in self.rows.into_iter().zip(patch.chunks_exact(patch_stride)) {
            let n = dst.len().min(src.len());
            dst[..n].copy_from_slice(&src[..n]);
        }
    }
}

/// Split the canvas buffer into four disjoint sets of row slices, indexed
/// like [`Quadrant::ALL`].
fn split_canvas(canvas: &mut RgbaImage, mid_x: u32, mid_y: u32) -> [QuadrantRows<'_>; 4] {
    let stride = canvas.width() as usize * BYTES_PER_PIXEL;
    let split = mid_x as usize * BYTES_PER_PIXEL;
    let mut parts: [QuadrantRows<'_>; 4] = Default::default();
    if stride == 0 {
        return parts;
    }

    for (y, row) in canvas.chunks_exact_mut(stride).enumerate() {
        let (left, right) = row.split_at_mut(split);
        let (left_quadrant, right_quadrant) = if (y as u32) < mid_y {
            (Quadrant::TopLeft, Quadrant::TopRight)
        } else {
            (Quadrant::BottomLeft, Quadrant::BottomRight)
        };
        parts[left_quadrant.index()].rows.push(left);
        parts[right_quadrant.index()].rows.push(right);
    }

    parts
}

/// Receive quadrant canvases in any order and draw them into one canvas.
///
/// Each arrival is drawn on its own scoped thread immediately. The scope
/// joins every draw before the canvas is returned.
fn merge_quadrants(
    width: u32,
    height: u32,
    inbox: Receiver<(Quadrant, RegionCanvas)>,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);

    {
        let mut targets = split_canvas(&mut canvas, width / 2, height / 2).map(Some);

        thread::scope(|scope| {
            for (quadrant, arrival) in inbox.iter() {
                if let Some(target) = targets[quadrant.index()].take() {
                    scope.spawn(move || target.draw(&arrival.image));
                }
            }
        });
    }

    canvas
}

// =============================================================================
// Tests
// =============================================================================
