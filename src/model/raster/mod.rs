//! Raster data model: rectangles, tile payloads, lazy tiled images,
//! bands and products.

mod image;
mod product;
mod raster;
mod rect;

pub use image::{default_tile_size, set_default_tile_size, TileComputer, TileImage};
pub use product::{Band, Product, ProductLayout};
pub use raster::Raster;
pub use rect::{Dimension, Rect};
