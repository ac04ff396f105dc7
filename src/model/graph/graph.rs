use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::model::graph::Node;

/// The static declaration of a processing pipeline: a DAG of named
/// operator nodes. Node ids are unique within a graph.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Graph {
    pub id: String,
    pub version: String,
    #[serde(default)]
    nodes: Vec<Node>,
}

impl Graph {
    pub const CURRENT_VERSION: &'static str = "1.0";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: Self::CURRENT_VERSION.to_string(),
            nodes: Vec::new(),
        }
    }

    /// Append a node, rejecting duplicate ids.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Serialize the graph document to JSON.
    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a graph document from JSON, re-validating node-id uniqueness.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let graph: Graph = serde_json::from_str(json)?;
        for (index, node) in graph.nodes.iter().enumerate() {
            if graph.nodes[..index].iter().any(|n| n.id == node.id) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }
        Ok(graph)
    }
}
