//! Tile renderer.
//!
//! Turns a matched tile identifier into a `block_size × block_size` patch by
//! loading the tile, decoding it and subsampling it with a nearest-neighbour
//! stride: output pixel `(i, j)` is source pixel `(i * ratio, j * ratio)`
//! with `ratio = tile_width / block_size` (integer division). No filtering
//! is applied.

use std::sync::Arc;

use image::RgbaImage;

use crate::codec::ImageCodec;
use crate::error::RenderError;
use crate::index::TileSource;

use super::cache::{PatchCache, PatchCacheKey};

/// Renders tiles into block-sized patches, optionally through a [`PatchCache`].
pub struct TileRenderer<S: TileSource> {
    source: Arc<S>,
    codec: ImageCodec,
    cache: Option<Arc<PatchCache>>,
}

impl<S: TileSource> TileRenderer<S> {
    /// Create a renderer without caching.
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            codec: ImageCodec::new(),
            cache: None,
        }
    }

    /// Create a renderer that keeps finished patches in `cache`.
    pub fn with_cache(source: Arc<S>, cache: Arc<PatchCache>) -> Self {
        Self {
            source,
            codec: ImageCodec::new(),
            cache: Some(cache),
        }
    }

    /// Render `tile_id` as a `block_size × block_size` patch.
    ///
    /// # Errors
    ///
    /// - [`RenderError::Io`] if the tile cannot be read
    /// - [`RenderError::Codec`] if the tile cannot be decoded
    /// - [`RenderError::BlockTooLarge`] if the tile is narrower than the block
    /// - [`RenderError::InvalidBlockSize`] if `block_size` is zero
    pub fn render(&self, tile_id: &Arc<str>, block_size: u32) -> Result<Arc<RgbaImage>, RenderError> {
        if block_size == 0 {
            return Err(RenderError::InvalidBlockSize(block_size));
        }

        let key = PatchCacheKey::new(Arc::clone(tile_id), block_size);
        if let Some(cache) = &self.cache {
            if let Some(patch) = cache.get(&key) {
                return Ok(patch);
            }
        }

        let data = self.source.read_tile(tile_id)?;
        let tile = self.codec.decode_rgba(&data)?;
        let patch = Arc::new(subsample(&tile, block_size)?);

        if let Some(cache) = &self.cache {
            cache.put(key, Arc::clone(&patch));
        }

        Ok(patch)
    }

    /// The patch cache, if one is attached.
    pub fn cache(&self) -> Option<&Arc<PatchCache>> {
        self.cache.as_ref()
    }
}

/// Nearest-neighbour subsample of `tile` into a square `block_size` patch.
///
/// The stride is `tile.width() / block_size`. Rows beyond the bottom of a
/// tile that is shorter than it is wide are clamped to the last source row,
/// and likewise for columns, so the patch always has the requested size.
pub fn subsample(tile: &RgbaImage, block_size: u32) -> Result<RgbaImage, RenderError> {
    if block_size == 0 {
        return Err(RenderError::InvalidBlockSize(block_size));
    }

    let (width, height) = tile.dimensions();
    let ratio = width / block_size;
    if ratio == 0 || height == 0 {
        return Err(RenderError::BlockTooLarge {
            block_size,
            tile_width: width,
        });
    }

    Ok(RgbaImage::from_fn(block_size, block_size, |i, j| {
        let x = (i * ratio).min(width - 1);
        let y = (j * ratio).min(height - 1);
        *tile.get_pixel(x, y)
    }))
}

// =============================================================================
// Tests
// =============================================================================
