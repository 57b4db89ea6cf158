//! Router configuration for the mosaic server.
//!
//! This module defines the HTTP routes and applies middleware for CORS,
//! request tracing and the upload size limit.
//!
//! # Route Structure
//!
//! ```text
//! /                 - Upload page
//! /mosaic           - Generate a mosaic (POST, multipart)
//! /health           - Health check
//! /tiles            - List indexed tiles
//! /tiles/reload     - Rebuild the tile index (POST)
//! ```
//!
//! # Cross-Origin Access
//!
//! The upload page is served from `/` and needs no CORS. Other front ends may
//! post to `/mosaic` from their own origin. The CORS layer answers their
//! preflights and exposes the `x-mosaic-*` headers, so a script can read the
//! timing and block counts of a cross-origin response.
//!
//! # Example
//!
//! ```ignore
//! use photo_mosaic::index::{DirectoryTileSource, TileDatabase};
//! use photo_mosaic::mosaic::MosaicService;
//! use photo_mosaic::server::{create_router, RouterConfig};
//!
//! let database = TileDatabase::load(DirectoryTileSource::new("tiles")).await?;
//! let service = MosaicService::new(database);
//!
//! let config = RouterConfig::new().with_allowed_origins(["https://gallery.example"]);
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{
    health_handler, mosaic_handler, reload_handler, tiles_handler, upload_page_handler, AppState,
    BLOCKS_HEADER, BLOCKS_SKIPPED_HEADER, DURATION_HEADER, TILE_SIZE_HEADER,
};
use crate::codec::DEFAULT_JPEG_QUALITY;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::index::TileSource;
use crate::mosaic::MosaicService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Origins allowed to call the API cross-origin. `None` allows any.
    pub allowed_origins: Option<Vec<String>>,

    /// JPEG quality for requests that do not specify one
    pub default_quality: u8,

    /// Maximum request body size for uploads
    pub max_upload_bytes: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - Any origin may call the API
    /// - Default quality is 80
    /// - Uploads are limited to 10 MiB
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            allowed_origins: None,
            default_quality: DEFAULT_JPEG_QUALITY,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            enable_tracing: true,
        }
    }

    /// Restrict cross-origin access to `origins`.
    ///
    /// An empty list refuses every cross-origin caller. A `*` entry allows
    /// any origin.
    pub fn with_allowed_origins<I, T>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.allowed_origins = Some(origins.into_iter().map(Into::into).collect());
        self
    }

    /// Set the JPEG quality used when a request does not name one.
    pub fn with_default_quality(mut self, quality: u8) -> Self {
        self.default_quality = quality;
        self
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Upload page and mosaic endpoint
/// - Corpus inspection and reload endpoints
/// - Health check
/// - CORS configuration and upload body limit
/// - Request tracing (optional)
pub fn create_router<S>(mosaic_service: MosaicService<S>, config: RouterConfig) -> Router
where
    S: TileSource + 'static,
{
    let app_state = AppState::with_default_quality(mosaic_service, config.default_quality);
    let cors = mosaic_cors_layer(&config);

    let router = Router::new()
        .route("/", get(upload_page_handler::<S>))
        .route("/mosaic", post(mosaic_handler::<S>))
        .route("/health", get(health_handler::<S>))
        .route("/tiles", get(tiles_handler::<S>))
        .route("/tiles/reload", post(reload_handler::<S>))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Response headers a cross-origin script is allowed to read.
fn exposed_mosaic_headers() -> [HeaderName; 4] {
    [
        HeaderName::from_static(DURATION_HEADER),
        HeaderName::from_static(BLOCKS_HEADER),
        HeaderName::from_static(BLOCKS_SKIPPED_HEADER),
        HeaderName::from_static(TILE_SIZE_HEADER),
    ]
}

/// CORS for browser clients of `/mosaic` and the corpus endpoints.
///
/// Preflights are answered for `GET` and `POST` with `Content-Type`.
fn mosaic_cors_layer(config: &RouterConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin_policy(config.allowed_origins.as_deref()))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .expose_headers(exposed_mosaic_headers())
        .max_age(PREFLIGHT_MAX_AGE)
}

fn origin_policy(allowed: Option<&[String]>) -> AllowOrigin {
    match allowed {
        None => AllowOrigin::any(),
        Some(origins) if origins.iter().any(|o| o.trim() == "*") => AllowOrigin::any(),
        Some(origins) => AllowOrigin::list(parse_origins(origins)),
    }
}

/// Parse origins into header values, dropping (and logging) malformed ones.
fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin.escape_debug(), "Ignoring malformed CORS origin");
                None
            }
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
