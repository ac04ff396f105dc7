use std::sync::Arc;

use crate::error::OperatorError;
use crate::model::raster::{Product, ProductLayout, Raster, Rect};
use crate::operator::builtin::mapped_tile;
use crate::operator::params::{ParamDescriptor, ParamKind, ParamValue};
use crate::operator::registry::OperatorPlugin;
use crate::operator::Operator;

/// Pointwise filter computing `gain * x + offset` over its `input` source.
pub struct GainOperator {
    gain: f64,
    offset: f64,
    source: Option<Arc<Product>>,
}

impl GainOperator {
    pub fn new() -> Self {
        Self {
            gain: 1.0,
            offset: 0.0,
            source: None,
        }
    }

    fn source(&self) -> Result<&Arc<Product>, OperatorError> {
        self.source
            .as_ref()
            .ok_or_else(|| OperatorError::MissingSourceProduct("input".to_string()))
    }
}

impl Default for GainOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for GainOperator {
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
            ProductLayout::new("gain", source.scene_width(), source.scene_height())
                .with_bands(band_names),
        )
    }

    fn compute_tile(&self, band_index: usize, rect: Rect) -> Result<Raster, OperatorError> {
        let source = self.source()?;
        let band = source
            .band_at(band_index)
            .ok_or_else(|| OperatorError::other(format!("no source band {}", band_index)))?;
        let gain = self.gain as f32;
        let offset = self.offset as f32;
        mapped_tile(band, rect, |s| gain * s + offset)
    }

    fn parameters(&self) -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::new(
                "gain",
                "Gain",
                ParamKind::Float {
                    min: f64::MIN,
                    max: f64::MAX,
                },
                ParamValue::Number(1.0),
            ),
            ParamDescriptor::new(
                "offset",
                "Offset",
                ParamKind::Float {
                    min: f64::MIN,
                    max: f64::MAX,
                },
                ParamValue::Number(0.0),
            ),
        ]
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> Result<(), OperatorError> {
        match name {
            "gain" => self.gain = value.as_f64().unwrap_or(1.0),
            "offset" => self.offset = value.as_f64().unwrap_or(0.0),
            _ => return Err(OperatorError::invalid_parameter(name, "not recognized")),
        }
        Ok(())
    }
}

pub struct GainOperatorPlugin;

impl OperatorPlugin for GainOperatorPlugin {
    fn id(&self) -> &'static str {
        "gain"
    }

    fn name(&self) -> String {
        "Gain filter".to_string()
    }

    fn create_operator(&self) -> Box<dyn Operator> {
        Box::new(GainOperator::new())
    }
}
