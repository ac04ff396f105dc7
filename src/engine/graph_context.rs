use crate::engine::NodeContext;
use crate::model::graph::Graph;

/// Runtime state of one graph execution: a node context per node, the
/// initialization-order record used for reverse-order disposal, and the
/// detected output nodes.
pub struct GraphContext {
    graph: Graph,
    node_contexts: Vec<NodeContext>,
    /// Indices in initialization-completion order; disposal walks this
    /// back to front so dependents are disposed before dependencies.
    init_order: Vec<usize>,
    /// Output node indices in declaration order.
    output_indices: Vec<usize>,
}

impl GraphContext {
    pub(crate) fn new(graph: Graph) -> Self {
        let node_contexts = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| NodeContext::new(index, &node.id))
            .collect();
        Self {
            graph,
            node_contexts,
            init_order: Vec::new(),
            output_indices: Vec::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node_contexts(&self) -> &[NodeContext] {
        &self.node_contexts
    }

    pub fn node_context(&self, node_id: &str) -> Option<&NodeContext> {
        self.node_contexts.iter().find(|c| c.node_id() == node_id)
    }

    /// Output node contexts in declaration order.
    pub fn output_contexts(&self) -> impl Iterator<Item = &NodeContext> {
        self.output_indices.iter().map(|&i| &self.node_contexts[i])
    }

    pub fn output_count(&self) -> usize {
        self.output_indices.len()
    }

    pub(crate) fn node_context_mut(&mut self, index: usize) -> &mut NodeContext {
        &mut self.node_contexts[index]
    }

    /// Split borrows for the recursive initializer.
    pub(crate) fn split_mut(
        &mut self,
    ) -> (
        &Graph,
        &mut Vec<NodeContext>,
        &mut Vec<usize>,
        &mut Vec<usize>,
    ) {
        (
            &self.graph,
            &mut self.node_contexts,
            &mut self.init_order,
            &mut self.output_indices,
        )
    }

    pub(crate) fn init_order(&self) -> &[usize] {
        &self.init_order
    }

    pub(crate) fn take_init_order(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.init_order)
    }
}
