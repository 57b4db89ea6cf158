//! Mosaic composition.
//!
//! This module turns a decoded source image and a tile index snapshot into a
//! mosaic of the same size.
//!
//! # Components
//!
//! - [`MosaicService`]: Main entry point, validates, decodes, composes, encodes
//! - [`QuadrantPipeline`]: Runs four compositors in parallel and merges them
//! - [`BlockCompositor`]: Fills one region block by block
//! - [`TileRenderer`]: Loads a tile and subsamples it into a block-sized patch
//! - [`PatchCache`]: LRU cache of rendered patches
//! - [`Region`], [`Quadrant`], [`partition`]: Canvas geometry

mod cache;
mod compositor;
mod geometry;
mod pipeline;
mod render;
mod service;

pub use cache::{PatchCache, PatchCacheKey, DEFAULT_PATCH_CACHE_CAPACITY};
pub use compositor::{composite_region, BlockCompositor, CompositeStats, RegionCanvas};
pub use geometry::{partition, Quadrant, Region};
pub use pipeline::{ComposedMosaic, QuadrantPipeline};
pub use render::{subsample, TileRenderer};
pub use service::{MosaicRequest, MosaicResponse, MosaicService, DEFAULT_MAX_TILE_SIZE};
