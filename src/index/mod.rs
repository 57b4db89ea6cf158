//! Tile corpus and color index.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             TileDatabase                │
//! │  (process-wide, hands out snapshots)    │
//! └────────────────────┬────────────────────┘
//!                      │ rebuild()
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              TileIndex                  │
//! │  (tile id → average color, nearest())   │
//! └────────────────────┬────────────────────┘
//!                      │ build()
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           TileSource Trait              │
//! │  (list + read tiles, e.g. a directory)  │
//! └─────────────────────────────────────────┘
//! ```

mod database;
mod source;
mod tile_index;

pub use database::TileDatabase;
pub use source::{DirectoryTileSource, TileSource};
pub use tile_index::{TileIndex, TileRecord};
