//! Pull-based execution engine for declarative raster processing graphs.
//!
//! A graph names operator instances and wires their source slots to the
//! target products of upstream nodes. The processor validates the graph,
//! initializes node contexts in dependency order and then drives the
//! output products tile by tile: each tile request propagates backwards
//! through lazily computed band images, so intermediate products are
//! never materialized eagerly. Contexts are disposed in reverse
//! initialization order.

pub mod engine;
pub mod error;
pub mod model;
pub mod operator;
pub mod progress;

pub use engine::{GraphContext, GraphObserver, GraphProcessor, NodeContext};
pub use error::{GraphError, OperatorError};
pub use model::graph::{ConfigElement, Graph, Node, NodeSource};
pub use model::raster::{Band, Dimension, Product, Raster, Rect};
pub use operator::{Operator, OperatorCapabilities, OperatorRegistry};
pub use progress::{CancelFlag, CancelableProgress, NullProgress, ProgressMonitor};
