//! Tile corpus access.
//!
//! A [`TileSource`] enumerates the tile corpus and reads the raw bytes of a
//! single tile. The index builder and the tile renderer both go through this
//! trait, so tests can substitute an in-memory corpus.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::IoError;

/// Trait for enumerating and reading tile images.
///
/// Implementations are called from blocking worker threads, so they may
/// perform synchronous I/O.
pub trait TileSource: Send + Sync {
    /// List the identifiers of every tile in the corpus.
    fn list_tiles(&self) -> Result<Vec<String>, IoError>;

    /// Read the encoded bytes of one tile.
    fn read_tile(&self, tile_id: &str) -> Result<Bytes, IoError>;
}

// =============================================================================
// DirectoryTileSource
// =============================================================================

/// Tile source backed by a flat directory of image files.
///
/// Tile identifiers are the file paths (directory joined with file name), so
/// they can be opened directly by [`read_tile`](TileSource::read_tile).
#[derive(Debug, Clone)]
pub struct DirectoryTileSource {
    root: PathBuf,
}

impl DirectoryTileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this source reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TileSource for DirectoryTileSource {
    fn list_tiles(&self) -> Result<Vec<String>, IoError> {
        let list_failed = |e: std::io::Error| IoError::ListFailed {
            path: self.root.display().to_string(),
            message: e.to_string(),
        };

        let mut tiles = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(list_failed)? {
            let entry = entry.map_err(list_failed)?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file {
                tiles.push(entry.path().display().to_string());
            }
        }

        tiles.sort();
        Ok(tiles)
    }

    fn read_tile(&self, tile_id: &str) -> Result<Bytes, IoError> {
        match fs::read(tile_id) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(IoError::NotFound(tile_id.to_string()))
            }
            Err(e) => Err(IoError::Read {
                path: tile_id.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
