//! The graph processor: validates a graph, initializes node contexts in
//! dependency order, drives tile-by-tile pull computation over the output
//! products and disposes contexts in reverse initialization order.

use std::sync::Arc;

use log::debug;

use crate::engine::init::init_operator_context;
use crate::engine::{GraphContext, GraphObserver, NodeContext};
use crate::error::GraphError;
use crate::model::graph::Graph;
use crate::model::raster::{default_tile_size, Rect};
use crate::operator::OperatorRegistry;
use crate::progress::{ProgressMonitor, SubProgress};

/// Executes processing graphs.
pub struct GraphProcessor {
    registry: Arc<OperatorRegistry>,
    observers: Vec<Arc<dyn GraphObserver>>,
}

impl GraphProcessor {
    pub fn new(registry: Arc<OperatorRegistry>) -> Self {
        Self {
            registry,
            observers: Vec::new(),
        }
    }

    /// Processor backed by a registry holding the built-in operators.
    pub fn with_default_operators() -> Self {
        Self::new(Arc::new(OperatorRegistry::default()))
    }

    pub fn registry(&self) -> &Arc<OperatorRegistry> {
        &self.registry
    }

    /// Register an observer. Observers cannot be added while a graph is
    /// executing; execution borrows the processor immutably.
    pub fn add_observer(&mut self, observer: Arc<dyn GraphObserver>) {
        self.observers.push(observer);
    }

    /// Execute a graph end to end: context construction (10% of the
    /// progress budget), tile iteration (90%), then disposal. Disposal
    /// also runs when tile iteration fails.
    pub fn execute_graph(
        &self,
        graph: Graph,
        pm: &mut dyn ProgressMonitor,
    ) -> Result<(), GraphError> {
        pm.begin_task("Executing processing graph", 100);
        let result = self.execute_graph_inner(graph, pm);
        pm.done();
        result
    }

    fn execute_graph_inner(
        &self,
        graph: Graph,
        pm: &mut dyn ProgressMonitor,
    ) -> Result<(), GraphError> {
        let mut context = {
            let mut sub = SubProgress::new(pm, 10);
            self.create_graph_context(graph, &mut sub)?
        };
        let result = {
            let mut sub = SubProgress::new(pm, 90);
            self.execute_graph_context(&context, &mut sub)
        };
        self.dispose_graph_context(&mut context);
        result
    }

    /// Validate the graph and build a fully initialized context for it.
    ///
    /// On a mid-way failure, contexts initialized so far are disposed
    /// before the error is returned.
    pub fn create_graph_context(
        &self,
        graph: Graph,
        pm: &mut dyn ProgressMonitor,
    ) -> Result<GraphContext, GraphError> {
        if graph.node_count() == 0 {
            return Err(GraphError::EmptyGraph(graph.id));
        }

        pm.begin_task("Creating processing graph context", 100);
        let mut context = GraphContext::new(graph);
        let result = self.build_context(&mut context, pm);
        pm.done();

        match result {
            Ok(()) => Ok(context),
            Err(e) => {
                self.dispose_graph_context(&mut context);
                Err(e)
            }
        }
    }

    fn build_context(
        &self,
        context: &mut GraphContext,
        pm: &mut dyn ProgressMonitor,
    ) -> Result<(), GraphError> {
        self.init_node_dependencies(context)?;
        pm.worked(10);
        let mut sub = SubProgress::new(pm, 90);
        self.init_outputs(context, &mut sub)
    }

    /// Phase 1: resolve every declared source and count references. A
    /// node that nothing references afterwards is an output node.
    fn init_node_dependencies(&self, context: &mut GraphContext) -> Result<(), GraphError> {
        let (graph, contexts, _, _) = context.split_mut();
        for node in graph.nodes() {
            for source in &node.sources {
                let Some(source_index) = graph.node_index(&source.source_node_id) else {
                    return Err(GraphError::missing_source(
                        node.id.as_str(),
                        source.source_node_id.as_str(),
                    ));
                };
                contexts[source_index].increment_reference_count();
            }
        }
        Ok(())
    }

    /// Phase 2: recursively initialize every output node. Nodes not
    /// reachable from an output stay uninitialized.
    fn init_outputs(
        &self,
        context: &mut GraphContext,
        pm: &mut dyn ProgressMonitor,
    ) -> Result<(), GraphError> {
        let output_count = context
            .node_contexts()
            .iter()
            .filter(|c| c.is_output())
            .count();
        pm.begin_task("Creating output products", output_count);
        let result = self.init_outputs_inner(context, pm);
        pm.done();
        result
    }

    fn init_outputs_inner(
        &self,
        context: &mut GraphContext,
        pm: &mut dyn ProgressMonitor,
    ) -> Result<(), GraphError> {
        let (graph, contexts, init_order, outputs) = context.split_mut();
        for node_index in 0..graph.node_count() {
            if contexts[node_index].is_output() {
                self.init_node_context(graph, contexts, init_order, node_index)?;
                if !outputs.contains(&node_index) {
                    outputs.push(node_index);
                }
                pm.worked(1);
            }
        }
        Ok(())
    }

    /// Idempotent recursive initialization of one node context. Sources
    /// are initialized first and their target products recorded against
    /// the declared slot names; then the operator context is built and
    /// the node is appended to the initialization order.
    fn init_node_context(
        &self,
        graph: &Graph,
        contexts: &mut [NodeContext],
        init_order: &mut Vec<usize>,
        node_index: usize,
    ) -> Result<(), GraphError> {
        if contexts[node_index].is_initialized() {
            return Ok(());
        }
        if contexts[node_index].is_visiting() {
            return Err(GraphError::CyclicGraph {
                node_id: contexts[node_index].node_id().to_string(),
            });
        }
        contexts[node_index].set_visiting();

        let node = &graph.nodes()[node_index];
        for source in &node.sources {
            let source_index = graph
                .node_index(&source.source_node_id)
                .expect("sources resolved during dependency resolution");
            self.init_node_context(graph, contexts, init_order, source_index)?;
            let product = Arc::clone(
                contexts[source_index]
                    .target_product()
                    .expect("source initialized above"),
            );
            contexts[node_index].add_source_product(&source.name, product);
        }

        debug!("Initializing node '{}' ({})", node.id, node.operator_name);
        let (operator, product, capabilities) =
            init_operator_context(&self.registry, node, contexts[node_index].source_products())
                .map_err(|e| GraphError::init_failed(node.id.as_str(), e))?;
        contexts[node_index].complete_initialization(operator, product, capabilities);
        init_order.push(node_index);
        Ok(())
    }

    /// Drive every output product tile by tile over the union bounds.
    pub fn execute_graph_context(
        &self,
        context: &GraphContext,
        pm: &mut dyn ProgressMonitor,
    ) -> Result<(), GraphError> {
        self.fire_processing_started(context);
        let result = self.run_tile_loop(context, pm);
        self.fire_processing_stopped(context);
        result
    }

    fn run_tile_loop(
        &self,
        context: &GraphContext,
        pm: &mut dyn ProgressMonitor,
    ) -> Result<(), GraphError> {
        let mut union = Rect::default();
        for node_context in context.output_contexts() {
            let product = node_context
                .target_product()
                .expect("output contexts are initialized");
            union = union.union(&product.bounds());
        }

        let tile_size = default_tile_size();
        let num_x_tiles = union.width.div_ceil(tile_size.width);
        let num_y_tiles = union.height.div_ceil(tile_size.height);

        pm.begin_task("Computing raster data", num_x_tiles * num_y_tiles);
        let mut result = Ok(());
        'tiles: for tile_y in 0..num_y_tiles {
            for tile_x in 0..num_x_tiles {
                if pm.is_canceled() {
                    debug!("Graph execution canceled at tile ({}, {})", tile_x, tile_y);
                    break 'tiles;
                }
                // The grid rectangle is not clipped; products that do not
                // overlap it are skipped below.
                let tile_rect = Rect::new(
                    tile_x * tile_size.width,
                    tile_y * tile_size.height,
                    tile_size.width,
                    tile_size.height,
                );
                self.fire_tile_started(context, tile_rect);
                if let Err(e) = self.compute_outputs_tile(context, tile_x, tile_y, &tile_rect) {
                    result = Err(e);
                    break 'tiles;
                }
                self.fire_tile_stopped(context, tile_rect);
                pm.worked(1);
            }
        }
        pm.done();
        result
    }

    fn compute_outputs_tile(
        &self,
        context: &GraphContext,
        tile_x: usize,
        tile_y: usize,
        tile_rect: &Rect,
    ) -> Result<(), GraphError> {
        for node_context in context.output_contexts() {
            let product = node_context
                .target_product()
                .expect("output contexts are initialized");
            if !product.bounds().intersects(tile_rect) {
                continue;
            }
            if node_context.capabilities().computes_all_bands {
                // One pull on the first band fills the tile for all bands.
                if let Some(band) = product.band_at(0) {
                    band.tile(tile_x, tile_y).map_err(|e| {
                        GraphError::TileComputationFailed {
                            node_id: node_context.node_id().to_string(),
                            band: band.name().to_string(),
                            source: e,
                        }
                    })?;
                }
            } else {
                for band in product.bands() {
                    band.tile(tile_x, tile_y).map_err(|e| {
                        GraphError::TileComputationFailed {
                            node_id: node_context.node_id().to_string(),
                            band: band.name().to_string(),
                            source: e,
                        }
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Dispose contexts in reverse initialization order: an operator is
    /// never disposed while a downstream consumer of its target product
    /// is still alive.
    pub fn dispose_graph_context(&self, context: &mut GraphContext) {
        for node_index in context.take_init_order().into_iter().rev() {
            context.node_context_mut(node_index).dispose();
        }
    }

    fn fire_processing_started(&self, context: &GraphContext) {
        for observer in &self.observers {
            observer.graph_processing_started(context);
        }
    }

    fn fire_processing_stopped(&self, context: &GraphContext) {
        for observer in &self.observers {
            observer.graph_processing_stopped(context);
        }
    }

    fn fire_tile_started(&self, context: &GraphContext, tile_rect: Rect) {
        for observer in &self.observers {
            observer.tile_processing_started(context, tile_rect);
        }
    }

    fn fire_tile_stopped(&self, context: &GraphContext, tile_rect: Rect) {
        for observer in &self.observers {
            observer.tile_processing_stopped(context, tile_rect);
        }
    }
}
