//! Photo Mosaic - rebuild pictures out of tile images.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_mosaic::{
    config::{Cli, Command, IndexConfig, ServeConfig},
    index::{DirectoryTileSource, TileDatabase, TileIndex},
    mosaic::MosaicService,
    server::{create_router, RouterConfig},
    ImageCodec,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Index(config) => run_index(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Photo Mosaic v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Tile directory: {}", config.tiles_dir);
    info!(
        "  JPEG quality: {}, max tile size: {}px",
        config.jpeg_quality, config.max_tile_size
    );
    info!(
        "  Cache: {} patches, upload limit {}KB",
        config.cache_patches,
        config.max_upload_bytes / 1024
    );

    if !Path::new(&config.tiles_dir).is_dir() {
        warn!(
            "  Tile directory '{}' does not exist; starting with an empty corpus",
            config.tiles_dir
        );
    }

    let source = DirectoryTileSource::new(&config.tiles_dir);
    let database = match TileDatabase::load(source).await {
        Ok(database) => database,
        Err(e) => {
            error!("Failed to build tile index: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tile_count = database.len().await;
    if tile_count == 0 {
        warn!("  No tiles indexed; mosaic requests will fail until tiles are added and reloaded");
    } else {
        info!("  Indexed {} tile(s)", tile_count);
    }

    let service = MosaicService::with_options(database, config.cache_patches, config.max_tile_size);
    let router = create_router(service, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Open the upload page in your browser:");
    info!("    open http://{}/", addr);
    info!("");
    info!("  Or post an image directly:");
    info!(
        "    curl -F image=@photo.jpg -F tile_size=16 http://{}/mosaic -o mosaic.jpg",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "photo_mosaic=debug,tower_http=debug"
    } else {
        "photo_mosaic=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_default_quality(config.jpeg_quality)
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_allowed_origins(origins);
    }

    router_config
}

// =============================================================================
// Index Command
// =============================================================================

async fn run_index(config: IndexConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        println!("✗ {}", e);
        return ExitCode::FAILURE;
    }

    println!("Photo Mosaic Tile Index");
    println!("═══════════════════════");
    println!();

    if !Path::new(&config.tiles_dir).is_dir() {
        println!("✗ Tile directory: {} (not a directory)", config.tiles_dir);
        return ExitCode::FAILURE;
    }
    println!("✓ Tile directory: {}", config.tiles_dir);

    let source = DirectoryTileSource::new(&config.tiles_dir);
    let index = match tokio::task::spawn_blocking(move || {
        TileIndex::build(&source, &ImageCodec::new())
    })
    .await
    {
        Ok(index) => index,
        Err(e) => {
            println!("✗ Indexing failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.list {
        println!();
        println!("Tiles:");
        println!("──────");
        if index.is_empty() {
            println!("  (no tiles found)");
        }
        for record in index.iter() {
            let s = record.signature;
            println!(
                "  {}  rgb({:.1}, {:.1}, {:.1})",
                record.id, s.r, s.g, s.b
            );
        }
    }

    println!();
    if index.is_empty() {
        println!("✗ No decodable tiles found");
        return ExitCode::FAILURE;
    }
    println!("✓ Indexed {} tile(s)", index.len());

    ExitCode::SUCCESS
}
