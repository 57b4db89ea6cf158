//! Cache for rendered tile patches.
//!
//! Rendering a patch means reading, decoding and subsampling a tile image,
//! which dominates mosaic runtime. Popular tiles are matched many times per
//! request and across requests, so finished patches are kept in an LRU cache.
//!
//! # Cache Key
//!
//! Patches are cached by:
//! - Tile identifier
//! - Block size (side length of the square patch)
//!
//! # Thread Safety
//!
//! The cache is read and written from the blocking quadrant threads, so it is
//! guarded by a [`std::sync::Mutex`] rather than an async lock.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbaImage;
use lru::LruCache;

/// Default number of patches to keep.
pub const DEFAULT_PATCH_CACHE_CAPACITY: usize = 1024;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for rendered patches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchCacheKey {
    /// Tile identifier from the index
    pub tile_id: Arc<str>,

    /// Side length of the rendered patch in pixels
    pub block_size: u32,
}

impl PatchCacheKey {
    pub fn new(tile_id: impl Into<Arc<str>>, block_size: u32) -> Self {
        Self {
            tile_id: tile_id.into(),
            block_size,
        }
    }
}

// =============================================================================
// Patch Cache
// =============================================================================

/// Entry-bounded LRU cache of rendered patches.
pub struct PatchCache {
    cache: Mutex<LruCache<PatchCacheKey, Arc<RgbaImage>>>,
    capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PatchCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PATCH_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` patches (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<PatchCacheKey, Arc<RgbaImage>>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get a patch, marking it as recently used.
    pub fn get(&self, key: &PatchCacheKey) -> Option<Arc<RgbaImage>> {
        let found = self.lock().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Check for a patch without updating LRU order or counters.
    pub fn contains(&self, key: &PatchCacheKey) -> bool {
        self.lock().contains(key)
    }

    /// Store a patch, evicting the least recently used one if full.
    pub fn put(&self, key: PatchCacheKey, patch: Arc<RgbaImage>) {
        self.lock().put(key, patch);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Returns `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl Default for PatchCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
