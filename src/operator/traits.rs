//! The operator capability contract consumed by the execution engine.

use std::sync::{Arc, RwLock};

use crate::error::OperatorError;
use crate::model::graph::ConfigElement;
use crate::model::raster::{Product, ProductLayout, Raster, Rect};
use crate::operator::params::{ParamDescriptor, ParamValue};

/// An operator shared between a node context and the band images of its
/// target product. Mutated only before initialization completes.
pub type SharedOperator = Arc<RwLock<Box<dyn Operator>>>;

/// Optional capabilities, declared explicitly rather than probed by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperatorCapabilities {
    /// A single tile request to any band computes that tile for all bands.
    pub computes_all_bands: bool,
    /// The operator consumes its raw configuration element directly
    /// instead of going through the default parameter converter.
    pub custom_parameter_conversion: bool,
}

/// An algorithmic unit turning source products into a target product,
/// one tile at a time.
///
/// Lifecycle: construction (via the registry), `set_parameter`/`configure`,
/// `set_source_product` for each declared slot, one `initialize` call,
/// then read-only tile computation until `dispose`.
pub trait Operator: Send + Sync {
    /// Wire the target product of an upstream node into a named slot.
    /// Called once per declared source, before `initialize`.
    fn set_source_product(
        &mut self,
        slot: &str,
        _product: Arc<Product>,
    ) -> Result<(), OperatorError> {
        Err(OperatorError::UnknownSourceSlot(slot.to_string()))
    }

    /// Called once after parameters and sources are applied; returns the
    /// layout of the target product.
    fn initialize(&mut self) -> Result<ProductLayout, OperatorError>;

    /// Compute one tile of one target band.
    fn compute_tile(&self, band_index: usize, rect: Rect) -> Result<Raster, OperatorError>;

    /// Compute one tile for every target band at once. Only invoked when
    /// `capabilities().computes_all_bands` is set.
    fn compute_all_bands(&self, _rect: Rect) -> Result<Vec<Raster>, OperatorError> {
        Err(OperatorError::other(
            "operator does not compute all bands at once",
        ))
    }

    fn capabilities(&self) -> OperatorCapabilities {
        OperatorCapabilities::default()
    }

    /// Declared parameter schema, used by the default converter.
    fn parameters(&self) -> Vec<ParamDescriptor> {
        Vec::new()
    }

    fn set_parameter(&mut self, name: &str, _value: &ParamValue) -> Result<(), OperatorError> {
        Err(OperatorError::invalid_parameter(name, "not recognized"))
    }

    /// Consume the raw configuration element. Only invoked when
    /// `capabilities().custom_parameter_conversion` is set.
    fn configure(&mut self, _config: &ConfigElement) -> Result<(), OperatorError> {
        Err(OperatorError::other(
            "operator does not consume raw configuration",
        ))
    }

    /// Release held resources. Called exactly once during teardown.
    fn dispose(&mut self) -> Result<(), OperatorError> {
        Ok(())
    }
}
