//! HTTP request handlers for the mosaic API.
//!
//! This module contains the Axum handlers for mosaic generation, corpus
//! inspection and health checks.
//!
//! # Endpoints
//!
//! - `GET /` - Upload page
//! - `POST /mosaic` - Generate a mosaic from a multipart upload
//! - `GET /health` - Health check endpoint
//! - `GET /tiles` - List indexed tiles
//! - `POST /tiles/reload` - Rebuild the tile index

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::codec::DEFAULT_JPEG_QUALITY;
use crate::error::MosaicError;
use crate::index::TileSource;
use crate::mosaic::{MosaicRequest, MosaicService};

use super::pages::upload_page_html;

/// Response header carrying the generation time in milliseconds.
pub const DURATION_HEADER: &str = "x-mosaic-duration-ms";

/// Response header carrying the number of blocks visited.
pub const BLOCKS_HEADER: &str = "x-mosaic-blocks";

/// Response header carrying the number of blocks left unfilled.
pub const BLOCKS_SKIPPED_HEADER: &str = "x-mosaic-blocks-skipped";

/// Response header echoing the tile size used.
pub const TILE_SIZE_HEADER: &str = "x-mosaic-tile-size";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the mosaic service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: TileSource> {
    /// The mosaic service for processing uploads
    pub mosaic_service: Arc<MosaicService<S>>,

    /// JPEG quality used when a request does not name one
    pub default_quality: u8,
}

impl<S: TileSource> AppState<S> {
    /// Create a new application state with the given mosaic service.
    pub fn new(mosaic_service: MosaicService<S>) -> Self {
        Self::with_default_quality(mosaic_service, DEFAULT_JPEG_QUALITY)
    }

    /// Create a new application state with a custom default quality.
    pub fn with_default_quality(mosaic_service: MosaicService<S>, default_quality: u8) -> Self {
        Self {
            mosaic_service: Arc::new(mosaic_service),
            default_quality,
        }
    }
}

impl<S: TileSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            mosaic_service: Arc::clone(&self.mosaic_service),
            default_quality: self.default_quality,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_tile_size", "no_tiles")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Number of indexed tiles
    pub tiles: usize,
}

/// One indexed tile.
#[derive(Debug, Serialize)]
pub struct TileEntry {
    pub id: String,

    /// Average color as `[r, g, b]` in 0-255 channel space
    pub color: [f64; 3],
}

/// Response from the tiles list endpoint.
#[derive(Debug, Serialize)]
pub struct TilesResponse {
    pub count: usize,
    pub tiles: Vec<TileEntry>,
}

/// Response from the reload endpoint.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// Number of tiles in the rebuilt index
    pub count: usize,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Build a JSON error response, logging by severity.
///
/// 5xx errors are logged at ERROR level, 4xx at WARN.
fn error_response(status: StatusCode, error_type: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status.is_client_error() {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }

    let body = ErrorResponse::with_status(error_type, message, status);
    (status, Json(body)).into_response()
}

/// Convert MosaicError to HTTP response.
impl IntoResponse for MosaicError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            // 400 Bad Request - Invalid parameters
            MosaicError::InvalidTileSize { .. } => (StatusCode::BAD_REQUEST, "invalid_tile_size"),
            MosaicError::InvalidQuality { .. } => (StatusCode::BAD_REQUEST, "invalid_quality"),
            MosaicError::EmptySource { .. } => (StatusCode::BAD_REQUEST, "empty_image"),

            // 415 - upload is not an image we can read
            MosaicError::SourceDecode(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_image")
            }

            // 503 - nothing to build a mosaic from until tiles are added
            MosaicError::NoTilesAvailable => (StatusCode::SERVICE_UNAVAILABLE, "no_tiles"),

            // 500 Internal Server Error
            MosaicError::Encode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "encode_error"),
            MosaicError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            MosaicError::TaskFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        error_response(status, error_type, self.to_string())
    }
}

/// Errors raised by the mosaic handler.
#[derive(Debug)]
pub enum HandlerError {
    /// The multipart form is malformed, incomplete or too large
    Form { status: StatusCode, message: String },

    /// The mosaic service rejected or failed the request
    Mosaic(MosaicError),
}

impl HandlerError {
    fn invalid_form(message: impl Into<String>) -> Self {
        HandlerError::Form {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Form { status, message } => {
                error_response(status, "invalid_form", message)
            }
            HandlerError::Mosaic(err) => err.into_response(),
        }
    }
}

impl From<MosaicError> for HandlerError {
    fn from(err: MosaicError) -> Self {
        HandlerError::Mosaic(err)
    }
}

impl From<MultipartError> for HandlerError {
    fn from(err: MultipartError) -> Self {
        HandlerError::Form {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

// =============================================================================
// Form Parsing
// =============================================================================

/// Fields of the `/mosaic` upload form.
#[derive(Debug)]
struct MosaicForm {
    image: Bytes,
    tile_size: u32,
    quality: u8,
}

impl MosaicForm {
    /// Read the `image`, `tile_size` and optional `quality` fields.
    async fn read(multipart: &mut Multipart, default_quality: u8) -> Result<Self, HandlerError> {
        let mut image = None;
        let mut tile_size = None;
        let mut quality = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => image = Some(field.bytes().await?),
                "tile_size" => tile_size = Some(parse_number("tile_size", &field.text().await?)?),
                "quality" => {
                    let text = field.text().await?;
                    // Browsers send an empty string for a cleared input
                    if !text.trim().is_empty() {
                        quality = Some(parse_number("quality", &text)?);
                    }
                }
                _ => debug!(field = %name, "Ignoring unknown form field"),
            }
        }

        let image = image
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| HandlerError::invalid_form("Missing form field: image"))?;
        let tile_size =
            tile_size.ok_or_else(|| HandlerError::invalid_form("Missing form field: tile_size"))?;

        Ok(Self {
            image,
            tile_size,
            quality: quality.unwrap_or(default_quality),
        })
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, text: &str) -> Result<T, HandlerError> {
    text.trim().parse().map_err(|_| {
        HandlerError::invalid_form(format!(
            "Invalid value for {}: {:?} is not a valid number",
            field,
            text.trim()
        ))
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Serve the upload page.
///
/// # Endpoint
///
/// `GET /`
pub async fn upload_page_handler<S: TileSource + 'static>(
    State(state): State<AppState<S>>,
) -> Html<String> {
    let service = &state.mosaic_service;
    let tile_count = service.database().len().await;

    Html(upload_page_html(
        service.max_tile_size(),
        state.default_quality,
        tile_count,
    ))
}

/// Handle mosaic requests.
///
/// # Endpoint
///
/// `POST /mosaic` with a `multipart/form-data` body
///
/// # Form Fields
///
/// - `image`: JPEG or PNG source image
/// - `tile_size`: Block side length in pixels
/// - `quality`: JPEG quality 1-100 (optional)
///
/// # Response
///
/// - `200 OK`: JPEG mosaic with `Content-Type: image/jpeg`
/// - `400 Bad Request`: Missing or invalid form fields
/// - `413 Payload Too Large`: Upload exceeds the body limit
/// - `415 Unsupported Media Type`: Upload is not a decodable image
/// - `503 Service Unavailable`: No tiles indexed
/// - `500 Internal Server Error`: Processing error
///
/// # Headers
///
/// - `X-Mosaic-Duration-Ms`: Generation time
/// - `X-Mosaic-Blocks`, `X-Mosaic-Blocks-Skipped`: Block counters
/// - `X-Mosaic-Tile-Size`: Tile size used
pub async fn mosaic_handler<S: TileSource + 'static>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> Result<Response, HandlerError> {
    let form = MosaicForm::read(&mut multipart, state.default_quality).await?;
    debug!(
        bytes = form.image.len(),
        tile_size = form.tile_size,
        quality = form.quality,
        "Mosaic upload received"
    );

    let request = MosaicRequest::with_quality(form.image, form.tile_size, form.quality);
    let response = state.mosaic_service.generate(request).await?;

    let mut http_response = Body::from(response.data).into_response();
    let headers = http_response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        HeaderName::from_static(DURATION_HEADER),
        HeaderValue::from(response.elapsed.as_millis() as u64),
    );
    headers.insert(
        HeaderName::from_static(BLOCKS_HEADER),
        HeaderValue::from(response.stats.blocks),
    );
    headers.insert(
        HeaderName::from_static(BLOCKS_SKIPPED_HEADER),
        HeaderValue::from(response.stats.blocks_skipped),
    );
    headers.insert(
        HeaderName::from_static(TILE_SIZE_HEADER),
        HeaderValue::from(response.tile_size),
    );

    Ok(http_response)
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "tiles": 120
/// }
/// ```
pub async fn health_handler<S: TileSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tiles: state.mosaic_service.database().len().await,
    })
}

/// List the indexed tiles with their average colors.
///
/// # Endpoint
///
/// `GET /tiles`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "count": 2,
///   "tiles": [
///     { "id": "tiles/a.jpg", "color": [12.0, 40.5, 200.0] },
///     { "id": "tiles/b.png", "color": [255.0, 255.0, 255.0] }
///   ]
/// }
/// ```
pub async fn tiles_handler<S: TileSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<TilesResponse> {
    let snapshot = state.mosaic_service.database().snapshot().await;

    let tiles: Vec<TileEntry> = snapshot
        .iter()
        .map(|record| TileEntry {
            id: record.id.to_string(),
            color: record.signature.to_array(),
        })
        .collect();

    Json(TilesResponse {
        count: tiles.len(),
        tiles,
    })
}

/// Rebuild the tile index from the corpus.
///
/// # Endpoint
///
/// `POST /tiles/reload`
///
/// # Response
///
/// `200 OK` with JSON body `{ "count": 120 }`
pub async fn reload_handler<S: TileSource + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<ReloadResponse>, MosaicError> {
    let count = state.mosaic_service.reload_tiles().await?;
    Ok(Json(ReloadResponse { count }))
}

// =============================================================================
// Tests
// =============================================================================
