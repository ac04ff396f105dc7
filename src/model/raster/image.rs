//! Lazy tiled images. A tile is computed on first request and cached;
//! computing a tile may recursively pull tiles from upstream images.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, RwLock};

use lru::LruCache;
use once_cell::sync::Lazy;

use crate::error::OperatorError;
use crate::model::raster::{Dimension, Raster, Rect};

const DEFAULT_TILE_CACHE_SIZE: usize = 256;

static DEFAULT_TILE_SIZE: Lazy<RwLock<Dimension>> =
    Lazy::new(|| RwLock::new(Dimension::new(64, 64)));

/// Process-wide default tile size used by the scheduler and by images
/// that do not override it.
pub fn default_tile_size() -> Dimension {
    *DEFAULT_TILE_SIZE.read().unwrap()
}

pub fn set_default_tile_size(size: Dimension) {
    *DEFAULT_TILE_SIZE.write().unwrap() = size;
}

/// Produces the raster for one tile of an image.
pub trait TileComputer: Send + Sync {
    fn compute(&self, tile_x: usize, tile_y: usize, rect: Rect) -> Result<Raster, OperatorError>;
}

/// A lazily computed, tiled single-channel image.
pub struct TileImage {
    width: usize,
    height: usize,
    tile_size: Dimension,
    computer: Arc<dyn TileComputer>,
    cache: Mutex<LruCache<(usize, usize), Arc<Raster>>>,
}

impl TileImage {
    pub fn new(width: usize, height: usize, computer: Arc<dyn TileComputer>) -> Self {
        Self::with_tile_size(width, height, default_tile_size(), computer)
    }

    pub fn with_tile_size(
        width: usize,
        height: usize,
        tile_size: Dimension,
        computer: Arc<dyn TileComputer>,
    ) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_TILE_CACHE_SIZE)
            .expect("DEFAULT_TILE_CACHE_SIZE must be > 0");
        Self {
            width,
            height,
            tile_size,
            computer,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> Dimension {
        self.tile_size
    }

    pub fn num_x_tiles(&self) -> usize {
        self.width.div_ceil(self.tile_size.width)
    }

    pub fn num_y_tiles(&self) -> usize {
        self.height.div_ceil(self.tile_size.height)
    }

    /// Scene rectangle covered by tile `(tile_x, tile_y)`, clipped to the
    /// image bounds at the right and bottom edges.
    pub fn tile_rect(&self, tile_x: usize, tile_y: usize) -> Result<Rect, OperatorError> {
        let grid = Rect::new(
            tile_x * self.tile_size.width,
            tile_y * self.tile_size.height,
            self.tile_size.width,
            self.tile_size.height,
        );
        Rect::of_size(self.width, self.height)
            .intersection(&grid)
            .ok_or(OperatorError::TileOutOfBounds { tile_x, tile_y })
    }

    /// Fetch a tile, computing it on a cache miss.
    pub fn tile(&self, tile_x: usize, tile_y: usize) -> Result<Arc<Raster>, OperatorError> {
        if let Some(cached) = self.cache.lock().unwrap().get(&(tile_x, tile_y)) {
            return Ok(Arc::clone(cached));
        }
        let rect = self.tile_rect(tile_x, tile_y)?;
        let raster = Arc::new(self.computer.compute(tile_x, tile_y, rect)?);
        self.cache
            .lock()
            .unwrap()
            .put((tile_x, tile_y), Arc::clone(&raster));
        Ok(raster)
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
    }
}
