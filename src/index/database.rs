//! Process-wide tile database.
//!
//! The [`TileDatabase`] owns the current [`TileIndex`] for the lifetime of the
//! server. Requests never touch it directly: they take a snapshot, which is a
//! shared handle to an immutable index. A rebuild constructs a brand new index
//! and swaps it in, so snapshots already handed out stay valid and unchanged.
//!
//! # Example
//!
//! ```ignore
//! use photo_mosaic::index::{DirectoryTileSource, TileDatabase};
//!
//! let database = TileDatabase::load(DirectoryTileSource::new("tiles")).await?;
//!
//! // Per request
//! let snapshot = database.snapshot().await;
//! let tile = snapshot.nearest(color)?;
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::codec::ImageCodec;
use crate::error::MosaicError;

use super::source::TileSource;
use super::tile_index::TileIndex;

/// Shared, rebuildable holder of the tile index.
pub struct TileDatabase<S: TileSource> {
    /// Corpus the index is built from
    source: Arc<S>,

    /// Current index. Replaced wholesale, never mutated in place.
    index: RwLock<Arc<TileIndex>>,

    /// Serialises rebuilds so two scans never race to swap
    rebuild_lock: Mutex<()>,

    codec: ImageCodec,
}

impl<S: TileSource + 'static> TileDatabase<S> {
    /// Create a database with an empty index. Call [`rebuild`](Self::rebuild)
    /// to populate it.
    pub fn new(source: S) -> Self {
        Self::with_index(source, TileIndex::new())
    }

    /// Create a database around an already built index.
    pub fn with_index(source: S, index: TileIndex) -> Self {
        Self {
            source: Arc::new(source),
            index: RwLock::new(Arc::new(index)),
            rebuild_lock: Mutex::new(()),
            codec: ImageCodec::new(),
        }
    }

    /// Create a database and populate it from the source.
    pub async fn load(source: S) -> Result<Self, MosaicError> {
        let database = Self::new(source);
        database.rebuild().await?;
        Ok(database)
    }

    /// Frozen view of the current index for one request.
    pub async fn snapshot(&self) -> Arc<TileIndex> {
        Arc::clone(&*self.index.read().await)
    }

    /// Re-scan the corpus and replace the current index.
    ///
    /// Decoding runs on a blocking thread. Returns the number of indexed tiles.
    pub async fn rebuild(&self) -> Result<usize, MosaicError> {
        let _guard = self.rebuild_lock.lock().await;

        let source = Arc::clone(&self.source);
        let codec = self.codec.clone();
        let index = tokio::task::spawn_blocking(move || TileIndex::build(source.as_ref(), &codec))
            .await
            .map_err(|e| MosaicError::TaskFailed {
                message: e.to_string(),
            })?;

        let count = index.len();
        *self.index.write().await = Arc::new(index);

        info!(tiles = count, "Tile index replaced");
        Ok(count)
    }

    /// Number of tiles in the current index.
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    /// The corpus backing this database.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }
}
