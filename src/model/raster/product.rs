use std::sync::Arc;

use crate::error::OperatorError;
use crate::model::raster::{Dimension, Raster, Rect, TileImage};

/// A single-channel raster band inside a product.
pub struct Band {
    name: String,
    index: usize,
    image: TileImage,
}

impl Band {
    pub fn new(name: impl Into<String>, index: usize, image: TileImage) -> Self {
        Self {
            name: name.into(),
            index,
            image,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn image(&self) -> &TileImage {
        &self.image
    }

    /// Pull one tile of this band, triggering computation on a cache miss.
    pub fn tile(&self, tile_x: usize, tile_y: usize) -> Result<Arc<Raster>, OperatorError> {
        self.image.tile(tile_x, tile_y)
    }
}

/// A collection of bands sharing one raster frame.
pub struct Product {
    name: String,
    scene_width: usize,
    scene_height: usize,
    bands: Vec<Band>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        scene_width: usize,
        scene_height: usize,
        bands: Vec<Band>,
    ) -> Self {
        Self {
            name: name.into(),
            scene_width,
            scene_height,
            bands,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scene_width(&self) -> usize {
        self.scene_width
    }

    pub fn scene_height(&self) -> usize {
        self.scene_height
    }

    /// Scene bounds, anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::of_size(self.scene_width, self.scene_height)
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band_at(&self, index: usize) -> Option<&Band> {
        self.bands.get(index)
    }

    pub fn band(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|b| b.name() == name)
    }

    /// Drop all cached tiles of every band.
    pub fn dispose(&self) {
        for band in &self.bands {
            band.image().clear_cache();
        }
    }
}

/// Target-product layout returned by `Operator::initialize`. The engine
/// turns this into a `Product` whose band images call back into the
/// operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductLayout {
    pub name: String,
    pub scene_width: usize,
    pub scene_height: usize,
    pub band_names: Vec<String>,
    pub tile_size: Option<Dimension>,
}

impl ProductLayout {
    pub fn new(name: impl Into<String>, scene_width: usize, scene_height: usize) -> Self {
        Self {
            name: name.into(),
            scene_width,
            scene_height,
            band_names: Vec::new(),
            tile_size: None,
        }
    }

    pub fn with_bands(mut self, band_names: Vec<String>) -> Self {
        self.band_names = band_names;
        self
    }

    pub fn with_tile_size(mut self, tile_size: Dimension) -> Self {
        self.tile_size = Some(tile_size);
        self
    }
}
