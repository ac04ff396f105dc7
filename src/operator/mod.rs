//! Operator surface: the capability contract, parameter handling, the
//! operator registry and built-in operators.

pub mod builtin;
pub mod params;
pub mod registry;
mod traits;

pub use params::{inject_parameters, ParamDescriptor, ParamKind, ParamValue};
pub use registry::{OperatorPlugin, OperatorRegistry};
pub use traits::{Operator, OperatorCapabilities, SharedOperator};
