//! Average-color index over the tile corpus.
//!
//! The index maps each tile identifier to the tile's average color. It is
//! built once from a [`TileSource`] and then only read: every mosaic request
//! matches against a frozen snapshot, never against a structure that another
//! task could be modifying.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::codec::ImageCodec;
use crate::color::ColorSignature;
use crate::error::{CodecError, MosaicError, RenderError};

use super::source::TileSource;

// =============================================================================
// TileRecord
// =============================================================================

/// One indexed tile: its identifier and average color.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRecord {
    pub id: Arc<str>,
    pub signature: ColorSignature,
}

impl TileRecord {
    pub fn new(id: impl Into<Arc<str>>, signature: ColorSignature) -> Self {
        Self {
            id: id.into(),
            signature,
        }
    }
}

// =============================================================================
// TileIndex
// =============================================================================

/// Mapping from tile identifier to average color.
///
/// Entries are kept ordered by identifier, which makes iteration, and with it
/// tie resolution in [`nearest`](Self::nearest), reproducible across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileIndex {
    records: BTreeMap<Arc<str>, ColorSignature>,
}

impl TileIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index from pre-computed records. Later duplicates win.
    pub fn from_records(records: impl IntoIterator<Item = TileRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert(record);
        }
        index
    }

    /// Build the index by decoding every tile the source lists.
    ///
    /// Tiles that cannot be read, decoded, or that have no pixels are logged
    /// and skipped. A listing failure yields an empty index.
    pub fn build<S: TileSource + ?Sized>(source: &S, codec: &ImageCodec) -> Self {
        info!("Start populating tile index");

        let tile_ids = match source.list_tiles() {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Cannot enumerate tile corpus, index will be empty");
                return Self::new();
            }
        };

        let mut index = Self::new();
        for tile_id in tile_ids {
            match average_color(source, codec, &tile_id) {
                Ok(signature) => {
                    debug!(tile_id = %tile_id, r = signature.r, g = signature.g, b = signature.b, "Indexed tile");
                    index.insert(TileRecord::new(tile_id.as_str(), signature));
                }
                Err(e) => {
                    warn!(tile_id = %tile_id, error = %e, "Skipping tile while populating index");
                }
            }
        }

        info!(tiles = index.len(), "Finished populating tile index");
        index
    }

    /// Independent copy for use by a single request.
    ///
    /// Identifiers are reference counted, so this copies the map structure and
    /// the signature values but not the identifier strings.
    pub fn snapshot(&self) -> TileIndex {
        self.clone()
    }

    /// Add or replace a record.
    pub fn insert(&mut self, record: TileRecord) {
        self.records.insert(record.id, record.signature);
    }

    /// Average color of a tile, if indexed.
    pub fn get(&self, tile_id: &str) -> Option<ColorSignature> {
        self.records.get(tile_id).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = TileRecord> + '_ {
        self.records
            .iter()
            .map(|(id, signature)| TileRecord::new(Arc::clone(id), *signature))
    }

    /// Find the tile whose average color is closest to `target`.
    ///
    /// Linear scan over every record. Uses a strict `<` comparison, so among
    /// equidistant tiles the first in identifier order wins.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::NoTilesAvailable`] if the index is empty.
    pub fn nearest(&self, target: ColorSignature) -> Result<Arc<str>, MosaicError> {
        let mut best: Option<(&Arc<str>, f64)> = None;

        for (id, signature) in &self.records {
            let d = target.distance(signature);
            match best {
                Some((_, smallest)) if d >= smallest => {}
                _ => best = Some((id, d)),
            }
        }

        best.map(|(id, _)| Arc::clone(id))
            .ok_or(MosaicError::NoTilesAvailable)
    }
}

/// Load, decode, and average one tile.
fn average_color<S: TileSource + ?Sized>(
    source: &S,
    codec: &ImageCodec,
    tile_id: &str,
) -> Result<ColorSignature, RenderError> {
    let data = source.read_tile(tile_id)?;
    let image = codec.decode_rgba(&data)?;

    ColorSignature::average_of(&image).ok_or_else(|| {
        RenderError::Codec(CodecError::Decode {
            message: "image has no pixels".to_string(),
        })
    })
}

// =============================================================================
// Tests
// =============================================================================
