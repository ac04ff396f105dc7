use crate::error::OperatorError;
use crate::model::raster::{ProductLayout, Raster, Rect};
use crate::operator::params::{ParamDescriptor, ParamKind, ParamValue};
use crate::operator::registry::OperatorPlugin;
use crate::operator::Operator;

/// Source operator producing bands filled with a constant value.
///
/// Band `i` is filled with `value + i`, which keeps bands of the same
/// product distinguishable in tests and demos.
pub struct ConstantOperator {
    width: usize,
    height: usize,
    value: f64,
    bands: usize,
}

impl ConstantOperator {
    pub fn new() -> Self {
        Self {
            width: 512,
            height: 512,
            value: 0.0,
            bands: 1,
        }
    }
}

impl Default for ConstantOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for ConstantOperator {
    fn initialize(&mut self) -> Result<ProductLayout, OperatorError> {
        let band_names = (0..self.bands).map(|i| format!("band_{}", i)).collect();
        Ok(ProductLayout::new("constant", self.width, self.height).with_bands(band_names))
    }

    fn compute_tile(&self, band_index: usize, rect: Rect) -> Result<Raster, OperatorError> {
        Ok(Raster::filled(rect, self.value as f32 + band_index as f32))
    }

    fn parameters(&self) -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::new(
                "width",
                "Scene width",
                ParamKind::Integer {
                    min: 1,
                    max: 1 << 20,
                },
                ParamValue::Integer(512),
            ),
            ParamDescriptor::new(
                "height",
                "Scene height",
                ParamKind::Integer {
                    min: 1,
                    max: 1 << 20,
                },
                ParamValue::Integer(512),
            ),
            ParamDescriptor::new(
                "value",
                "Fill value",
                ParamKind::Float {
                    min: f64::MIN,
                    max: f64::MAX,
                },
                ParamValue::Number(0.0),
            ),
            ParamDescriptor::new(
                "bands",
                "Band count",
                ParamKind::Integer { min: 1, max: 256 },
                ParamValue::Integer(1),
            ),
        ]
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> Result<(), OperatorError> {
        match name {
            "width" => self.width = value.as_i64().unwrap_or(512) as usize,
            "height" => self.height = value.as_i64().unwrap_or(512) as usize,
            "value" => self.value = value.as_f64().unwrap_or(0.0),
            "bands" => self.bands = value.as_i64().unwrap_or(1) as usize,
            _ => return Err(OperatorError::invalid_parameter(name, "not recognized")),
        }
        Ok(())
    }
}

pub struct ConstantOperatorPlugin;

impl OperatorPlugin for ConstantOperatorPlugin {
    fn id(&self) -> &'static str {
        "constant"
    }

    fn name(&self) -> String {
        "Constant source".to_string()
    }

    fn create_operator(&self) -> Box<dyn Operator> {
        Box::new(ConstantOperator::new())
    }
}
