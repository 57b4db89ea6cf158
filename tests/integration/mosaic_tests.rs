//! Library-level integration tests for the mosaic pipeline.
//!
//! Tests verify:
//! - Directory-backed corpora (mixed formats, non-image files)
//! - Deterministic output
//! - Patch cache effectiveness and invalidation on reload
//! - Snapshot isolation across index rebuilds
//! - Degraded corpora with a single decodable tile
//! - Rejection of blocks wider than the matched tile

use image::{Rgba, RgbaImage};
use std::fs;
use tempfile::TempDir;

use photo_mosaic::error::MosaicError;
use photo_mosaic::index::{DirectoryTileSource, TileDatabase};
use photo_mosaic::mosaic::{MosaicRequest, MosaicService};

use super::test_utils::{
    assert_near, black_white_source, decode_rgb, is_valid_jpeg, solid_jpeg, solid_png, split_png,
    MockTileSource,
};

fn tile_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("black.png"), solid_png(8, 8, [0, 0, 0])).unwrap();
    fs::write(dir.path().join("white.jpg"), solid_jpeg(8, 8, [255, 255, 255])).unwrap();
    fs::write(dir.path().join("README.txt"), b"tiles go here").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    dir
}

// =============================================================================
// Directory Corpus
// =============================================================================

#[tokio::test]
async fn test_directory_corpus_end_to_end() {
    let dir = tile_dir();
    let database = TileDatabase::load(DirectoryTileSource::new(dir.path()))
        .await
        .unwrap();

    // README.txt is not decodable and nested/ is not a file
    assert_eq!(database.len().await, 2);

    let service = MosaicService::new(database);
    let upload = split_png(16, 8, [15, 15, 15], [240, 240, 240]);

    let response = service
        .generate(MosaicRequest::with_quality(upload, 4, 95))
        .await
        .unwrap();

    assert_eq!((response.width, response.height), (16, 8));
    assert_eq!(response.stats.blocks, 8);
    assert_eq!(response.stats.blocks_skipped, 0);
    assert!(is_valid_jpeg(&response.data));

    let mosaic = decode_rgb(&response.data);
    assert_near(&mosaic, 2, 2, [0, 0, 0]);
    assert_near(&mosaic, 13, 5, [255, 255, 255]);
}

#[tokio::test]
async fn test_directory_tile_ids_are_paths() {
    let dir = tile_dir();
    let database = TileDatabase::load(DirectoryTileSource::new(dir.path()))
        .await
        .unwrap();

    let snapshot = database.snapshot().await;
    let ids: Vec<String> = snapshot.iter().map(|r| r.id.to_string()).collect();

    assert_eq!(ids.len(), 2);
    assert!(ids[0].ends_with("black.png"));
    assert!(ids[1].ends_with("white.jpg"));
    assert!(ids.iter().all(|id| id.starts_with(&*dir.path().to_string_lossy())));
}

#[tokio::test]
async fn test_missing_directory_gives_empty_index() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");

    let database = TileDatabase::load(DirectoryTileSource::new(missing))
        .await
        .unwrap();
    assert!(database.is_empty().await);
}

// =============================================================================
// Determinism
// =============================================================================

#[tokio::test]
async fn test_generation_is_deterministic() {
    let database = TileDatabase::load(black_white_source()).await.unwrap();
    let service = MosaicService::new(database);
    let upload = split_png(24, 18, [30, 30, 30], [220, 220, 220]);

    let first = service
        .generate(MosaicRequest::new(upload.clone(), 3))
        .await
        .unwrap();
    let second = service
        .generate(MosaicRequest::new(upload, 3))
        .await
        .unwrap();

    assert_eq!(first.data, second.data);
    assert_eq!(first.stats, second.stats);
}

#[tokio::test]
async fn test_composition_matches_across_cache_state() {
    let database = TileDatabase::load(black_white_source()).await.unwrap();
    let service = MosaicService::new(database);
    let source = RgbaImage::from_fn(20, 12, |x, y| {
        if (x / 5 + y / 3) % 2 == 0 {
            Rgba([10, 10, 10, 255])
        } else {
            Rgba([245, 245, 245, 255])
        }
    });

    let cold = service.compose_image(source.clone(), 2).await.unwrap();
    let warm = service.compose_image(source, 2).await.unwrap();

    assert_eq!(cold.image, warm.image);
}

// =============================================================================
// Patch Cache
// =============================================================================

#[tokio::test]
async fn test_patch_cache_avoids_rereading_tiles() {
    let source = black_white_source();
    let database = TileDatabase::load(source.clone()).await.unwrap();

    // Indexing reads each tile once
    assert_eq!(source.read_count(), 2);

    let service = MosaicService::new(database);
    let upload = split_png(32, 32, [0, 0, 0], [255, 255, 255]);

    service
        .generate(MosaicRequest::new(upload.clone(), 4))
        .await
        .unwrap();
    let after_first = source.read_count();
    assert!(after_first > 2);

    service
        .generate(MosaicRequest::new(upload, 4))
        .await
        .unwrap();
    assert_eq!(source.read_count(), after_first);

    let (entries, _, hits, _) = service.cache_stats();
    assert_eq!(entries, 2);
    assert!(hits > 0);
}

#[tokio::test]
async fn test_reload_invalidates_patch_cache() {
    let source = black_white_source();
    let database = TileDatabase::load(source.clone()).await.unwrap();
    let service = MosaicService::new(database);
    let upload = solid_png(8, 8, [0, 0, 0]);

    service
        .generate(MosaicRequest::new(upload.clone(), 4))
        .await
        .unwrap();
    assert!(service.cache_stats().0 > 0);

    // Same identifier, new content
    source.add_tile("black.png", solid_png(8, 8, [40, 0, 0]));
    assert_eq!(service.reload_tiles().await.unwrap(), 2);
    assert_eq!(service.cache_stats().0, 0);

    let mosaic = service
        .compose_image(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])), 4)
        .await
        .unwrap();
    assert_eq!(*mosaic.image.get_pixel(0, 0), Rgba([40, 0, 0, 255]));
}

// =============================================================================
// Snapshot Isolation
// =============================================================================

#[tokio::test]
async fn test_snapshot_survives_rebuild() {
    let source = black_white_source();
    let database = TileDatabase::load(source.clone()).await.unwrap();

    let before = database.snapshot().await;
    source.add_tile("red.png", solid_png(8, 8, [255, 0, 0]));
    assert_eq!(database.rebuild().await.unwrap(), 3);

    assert_eq!(before.len(), 2);
    assert!(before.get("red.png").is_none());
    assert_eq!(database.snapshot().await.len(), 3);
}

// =============================================================================
// Corpus Degradation
// =============================================================================

#[tokio::test]
async fn test_single_decodable_tile_fills_every_block() {
    let source = MockTileSource::new()
        .with_solid_tile("only.png", [10, 200, 30], 8)
        .with_tile("broken.png", b"not an image at all".to_vec())
        .with_missing_tile("vanished.png");
    let database = TileDatabase::load(source).await.unwrap();
    assert_eq!(database.len().await, 1);

    let service = MosaicService::new(database);
    let image = RgbaImage::from_fn(24, 20, |x, y| {
        Rgba([(x * 10) as u8, (y * 12) as u8, ((x + y) * 5) as u8, 255])
    });

    let mosaic = service.compose_image(image, 4).await.unwrap();

    assert_eq!(mosaic.image.dimensions(), (24, 20));
    assert!(mosaic.stats.blocks > 0);
    assert_eq!(mosaic.stats.blocks_skipped, 0);
    assert!(mosaic
        .image
        .pixels()
        .all(|p| *p == Rgba([10, 200, 30, 255])));
}

// =============================================================================
// Undersized Tiles
// =============================================================================

#[tokio::test]
async fn test_tile_smaller_than_block_fails_request() {
    let source = MockTileSource::new().with_solid_tile("small.png", [255, 255, 255], 8);
    let database = TileDatabase::load(source).await.unwrap();
    let service = MosaicService::new(database);
    let upload = solid_png(64, 64, [250, 250, 250]);

    let result = service.generate(MosaicRequest::new(upload, 16)).await;

    match result {
        Err(MosaicError::InvalidTileSize { tile_size, reason }) => {
            assert_eq!(tile_size, 16);
            assert!(reason.contains("small.png"));
        }
        other => panic!("Expected InvalidTileSize, got {:?}", other.map(|r| r.stats)),
    }
}

#[tokio::test]
async fn test_any_undersized_match_fails_request() {
    let source = MockTileSource::new()
        .with_solid_tile("big-black.png", [0, 0, 0], 8)
        .with_solid_tile("tiny-white.png", [255, 255, 255], 2);
    let database = TileDatabase::load(source).await.unwrap();
    let service = MosaicService::new(database);

    // Left half matches the 8px tile, right half the 2px one
    let image = RgbaImage::from_fn(8, 8, |x, _| {
        if x < 4 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });

    let result = service.compose_image(image, 4).await;
    assert!(matches!(
        result,
        Err(MosaicError::InvalidTileSize { tile_size: 4, .. })
    ));
}

#[tokio::test]
async fn test_block_equal_to_tile_width_succeeds() {
    let source = MockTileSource::new().with_solid_tile("exact.png", [90, 90, 90], 8);
    let database = TileDatabase::load(source).await.unwrap();
    let service = MosaicService::new(database);

    let mosaic = service
        .compose_image(RgbaImage::from_pixel(16, 16, Rgba([1, 1, 1, 255])), 8)
        .await
        .unwrap();

    assert_eq!(mosaic.stats.blocks_skipped, 0);
    assert_eq!(*mosaic.image.get_pixel(15, 15), Rgba([90, 90, 90, 255]));
}
