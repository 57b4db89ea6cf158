use thiserror::Error;

/// I/O errors that can occur when reading tiles from the corpus
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Tile file does not exist
    #[error("Tile not found: {0}")]
    NotFound(String),

    /// Tile file exists but could not be read
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    /// Corpus directory could not be enumerated
    #[error("Failed to list {path}: {message}")]
    ListFailed { path: String, message: String },
}

/// Errors from decoding or encoding raster images
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// Bytes are not a decodable image
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Image could not be encoded
    #[error("Encode error: {message}")]
    Encode { message: String },
}

/// Errors that can occur when rendering a tile into a block-sized patch
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// Tile bytes could not be loaded
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Tile bytes could not be decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Tile is narrower than the block, so the subsampling ratio would be zero
    #[error("Block size {block_size} exceeds tile width {tile_width}")]
    BlockTooLarge { block_size: u32, tile_width: u32 },

    /// Block size of zero
    #[error("Invalid block size: {0}")]
    InvalidBlockSize(u32),
}

/// Request-level errors surfaced to the caller of the mosaic pipeline
#[derive(Debug, Clone, Error)]
pub enum MosaicError {
    /// Tile size is not usable for this source image
    #[error("Invalid tile size {tile_size}: {reason}")]
    InvalidTileSize { tile_size: u32, reason: String },

    /// Requested JPEG quality is out of range
    #[error("Invalid quality: {quality} (must be 1-100)")]
    InvalidQuality { quality: u8 },

    /// The tile index has no entries to match against
    #[error("No tiles available")]
    NoTilesAvailable,

    /// Source image has zero width or height
    #[error("Source image is empty ({width}x{height})")]
    EmptySource { width: u32, height: u32 },

    /// Uploaded source image could not be decoded
    #[error("Failed to decode source image: {0}")]
    SourceDecode(CodecError),

    /// Composed mosaic could not be encoded
    #[error("Failed to encode mosaic: {0}")]
    Encode(CodecError),

    /// Corpus access failed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// A pipeline task panicked or was cancelled
    #[error("Mosaic task failed: {message}")]
    TaskFailed { message: String },
}
