//! HTTP server layer for the mosaic service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │              GET /   POST /mosaic   GET /tiles                  │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    pages    │  │        routes           │  │
//! │  │ (requests)  │  │   (HTML)    │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod pages;
pub mod routes;

pub use handlers::{
    health_handler, mosaic_handler, reload_handler, tiles_handler, upload_page_handler, AppState,
    ErrorResponse, HandlerError, HealthResponse, ReloadResponse, TileEntry, TilesResponse,
    BLOCKS_HEADER, BLOCKS_SKIPPED_HEADER, DURATION_HEADER, TILE_SIZE_HEADER,
};
pub use pages::upload_page_html;
pub use routes::{create_router, RouterConfig};
