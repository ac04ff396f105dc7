use std::sync::Arc;

use crate::error::OperatorError;
use crate::model::raster::{Product, ProductLayout, Raster, Rect};
use crate::operator::builtin::mapped_tile;
use crate::operator::registry::OperatorPlugin;
use crate::operator::Operator;

/// Copies its `input` source bands unchanged.
pub struct PassthroughOperator {
    source: Option<Arc<Product>>,
}

impl PassthroughOperator {
    pub fn new() -> Self {
        Self { source: None }
    }

    fn source(&self) -> Result<&Arc<Product>, OperatorError> {
        self.source
            .as_ref()
            .ok_or_else(|| OperatorError::MissingSourceProduct("input".to_string()))
    }
}

impl Default for PassthroughOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for PassthroughOperator {
    fn set_source_product(
        &mut self,
        slot: &str,
        product: Arc<Product>,
    ) -> Result<(), OperatorError> {
        if slot != "input" {
            return Err(OperatorError::UnknownSourceSlot(slot.to_string()));
        }
        self.source = Some(product);
        Ok(())
    }

    fn initialize(&mut self) -> Result<ProductLayout, OperatorError> {
        let source = self.source()?;
        let band_names = source.bands().iter().map(|b| b.name().to_string()).collect();
        Ok(
            ProductLayout::new("passthrough", source.scene_width(), source.scene_height())
                .with_bands(band_names),
        )
    }

    fn compute_tile(&self, band_index: usize, rect: Rect) -> Result<Raster, OperatorError> {
        let source = self.source()?;
        let band = source
            .band_at(band_index)
            .ok_or_else(|| OperatorError::other(format!("no source band {}", band_index)))?;
        mapped_tile(band, rect, |s| s)
    }
}

pub struct PassthroughOperatorPlugin;

impl OperatorPlugin for PassthroughOperatorPlugin {
    fn id(&self) -> &'static str {
        "passthrough"
    }

    fn name(&self) -> String {
        "Pass-through".to_string()
    }

    fn create_operator(&self) -> Box<dyn Operator> {
        Box::new(PassthroughOperator::new())
    }
}
