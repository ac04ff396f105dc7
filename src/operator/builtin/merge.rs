use std::sync::Arc;

use crate::error::OperatorError;
use crate::model::graph::ConfigElement;
use crate::model::raster::{Product, ProductLayout, Raster, Rect};
use crate::operator::builtin::mapped_tile;
use crate::operator::registry::OperatorPlugin;
use crate::operator::{Operator, OperatorCapabilities};

/// Concatenates the bands of its sources, in wiring order, into one
/// product. All sources must share the same scene size.
///
/// Declares the compute-all-bands capability: one tile request computes
/// that tile for every output band. Configuration is consumed directly
/// (custom parameter conversion); the only recognized entry is an
/// optional `band_prefix` prepended to every output band name.
pub struct MergeOperator {
    sources: Vec<(String, Arc<Product>)>,
    band_prefix: String,
    // (source index, band index) per output band, fixed at initialize
    band_map: Vec<(usize, usize)>,
}

impl MergeOperator {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            band_prefix: String::new(),
            band_map: Vec::new(),
        }
    }

    fn source_band(&self, band_index: usize) -> Result<(&Arc<Product>, usize), OperatorError> {
        let (source_index, source_band) = *self
            .band_map
            .get(band_index)
            .ok_or_else(|| OperatorError::other(format!("no output band {}", band_index)))?;
        Ok((&self.sources[source_index].1, source_band))
    }
}

impl Default for MergeOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for MergeOperator {
    fn set_source_product(
        &mut self,
        slot: &str,
        product: Arc<Product>,
    ) -> Result<(), OperatorError> {
        self.sources.push((slot.to_string(), product));
        Ok(())
    }

    fn initialize(&mut self) -> Result<ProductLayout, OperatorError> {
        let (_, first) = self
            .sources
            .first()
            .ok_or_else(|| OperatorError::MissingSourceProduct("<any>".to_string()))?;
        let (width, height) = (first.scene_width(), first.scene_height());

        let mut band_names = Vec::new();
        self.band_map.clear();
        for (source_index, (slot, product)) in self.sources.iter().enumerate() {
            if product.scene_width() != width || product.scene_height() != height {
                return Err(OperatorError::other(format!(
                    "source '{}' is {}x{}, expected {}x{}",
                    slot,
                    product.scene_width(),
                    product.scene_height(),
                    width,
                    height
                )));
            }
            for band in product.bands() {
                band_names.push(format!("{}{}", self.band_prefix, band.name()));
                self.band_map.push((source_index, band.index()));
            }
        }
        Ok(ProductLayout::new("merge", width, height).with_bands(band_names))
    }

    fn compute_tile(&self, band_index: usize, rect: Rect) -> Result<Raster, OperatorError> {
        let (product, source_band) = self.source_band(band_index)?;
        let band = product
            .band_at(source_band)
            .ok_or_else(|| OperatorError::other(format!("no source band {}", source_band)))?;
        mapped_tile(band, rect, |s| s)
    }

    fn compute_all_bands(&self, rect: Rect) -> Result<Vec<Raster>, OperatorError> {
        (0..self.band_map.len())
            .map(|band_index| self.compute_tile(band_index, rect))
            .collect()
    }

    fn capabilities(&self) -> OperatorCapabilities {
        OperatorCapabilities {
            computes_all_bands: true,
            custom_parameter_conversion: true,
        }
    }

    fn configure(&mut self, config: &ConfigElement) -> Result<(), OperatorError> {
        if let Some(prefix) = config.child_value("band_prefix") {
            self.band_prefix = prefix.to_string();
        }
        Ok(())
    }
}

pub struct MergeOperatorPlugin;

impl OperatorPlugin for MergeOperatorPlugin {
    fn id(&self) -> &'static str {
        "merge"
    }

    fn name(&self) -> String {
        "Band merge".to_string()
    }

    fn create_operator(&self) -> Box<dyn Operator> {
        Box::new(MergeOperator::new())
    }
}
