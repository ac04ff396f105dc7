use std::sync::Arc;

use log::warn;

use crate::model::raster::Product;
use crate::operator::{OperatorCapabilities, SharedOperator};

/// Runtime state of one graph node during a single execution.
///
/// Mutated only by the initializer; read-only while tiles are pulled.
/// `initialized` transitions false to true exactly once, after every
/// declared source product has been recorded.
pub struct NodeContext {
    node_index: usize,
    node_id: String,
    operator: Option<SharedOperator>,
    target_product: Option<Arc<Product>>,
    reference_count: usize,
    initialized: bool,
    visiting: bool,
    disposed: bool,
    capabilities: OperatorCapabilities,
    source_products: Vec<(String, Arc<Product>)>,
}

impl NodeContext {
    pub(crate) fn new(node_index: usize, node_id: impl Into<String>) -> Self {
        Self {
            node_index,
            node_id: node_id.into(),
            operator: None,
            target_product: None,
            reference_count: 0,
            initialized: false,
            visiting: false,
            disposed: false,
            capabilities: OperatorCapabilities::default(),
            source_products: Vec::new(),
        }
    }

    pub fn node_index(&self) -> usize {
        self.node_index
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Number of downstream nodes consuming this node's target product.
    pub fn reference_count(&self) -> usize {
        self.reference_count
    }

    /// A node is an output iff nothing references it after dependency
    /// resolution.
    pub fn is_output(&self) -> bool {
        self.reference_count == 0
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn capabilities(&self) -> OperatorCapabilities {
        self.capabilities
    }

    pub fn target_product(&self) -> Option<&Arc<Product>> {
        self.target_product.as_ref()
    }

    pub fn operator(&self) -> Option<&SharedOperator> {
        self.operator.as_ref()
    }

    /// Slot-name to upstream-target-product bindings, in declaration order.
    pub fn source_products(&self) -> &[(String, Arc<Product>)] {
        &self.source_products
    }

    pub(crate) fn increment_reference_count(&mut self) {
        self.reference_count += 1;
    }

    pub(crate) fn is_visiting(&self) -> bool {
        self.visiting
    }

    pub(crate) fn set_visiting(&mut self) {
        self.visiting = true;
    }

    pub(crate) fn add_source_product(&mut self, slot: &str, product: Arc<Product>) {
        self.source_products.push((slot.to_string(), product));
    }

    pub(crate) fn complete_initialization(
        &mut self,
        operator: SharedOperator,
        target_product: Arc<Product>,
        capabilities: OperatorCapabilities,
    ) {
        debug_assert!(!self.initialized);
        self.operator = Some(operator);
        self.target_product = Some(target_product);
        self.capabilities = capabilities;
        self.visiting = false;
        self.initialized = true;
    }

    /// Dispose the operator first, then the target product. Failures are
    /// logged and swallowed; traversal continues.
    pub(crate) fn dispose(&mut self) {
        if self.disposed || !self.initialized {
            return;
        }
        self.disposed = true;
        if let Some(operator) = &self.operator {
            if let Err(e) = operator.write().unwrap().dispose() {
                warn!("Failed to dispose operator of node '{}': {}", self.node_id, e);
            }
        }
        if let Some(product) = &self.target_product {
            product.dispose();
        }
    }
}
