//! Built-in operators: a constant source, pointwise filters and a band
//! merge. These cover the common pipeline shapes without external data.

mod constant;
mod gain;
mod merge;
mod passthrough;

pub use constant::{ConstantOperator, ConstantOperatorPlugin};
pub use gain::{GainOperator, GainOperatorPlugin};
pub use merge::{MergeOperator, MergeOperatorPlugin};
pub use passthrough::{PassthroughOperator, PassthroughOperatorPlugin};

use std::sync::Arc;

use crate::error::OperatorError;
use crate::model::raster::{Band, Raster, Rect};

/// Pull the source tile covering `rect`.
///
/// Source and target products share the global tile layout, so the single
/// tile containing the rectangle's origin covers it entirely.
pub(crate) fn pull_source_tile(band: &Band, rect: Rect) -> Result<Arc<Raster>, OperatorError> {
    let tile_size = band.image().tile_size();
    band.tile(rect.x / tile_size.width, rect.y / tile_size.height)
}

/// Compute a tile of `rect` by mapping the corresponding source samples.
pub(crate) fn mapped_tile(
    band: &Band,
    rect: Rect,
    f: impl Fn(f32) -> f32,
) -> Result<Raster, OperatorError> {
    let source = pull_source_tile(band, rect)?;
    let mut out = Raster::new(rect);
    if let Some(overlap) = rect.intersection(&source.rect()) {
        for y in overlap.y..overlap.max_y() {
            for x in overlap.x..overlap.max_x() {
                out.set_sample(x, y, f(source.sample(x, y)));
            }
        }
    }
    Ok(out)
}
