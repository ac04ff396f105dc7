use serde::{Deserialize, Serialize};

use crate::model::graph::ConfigElement;

/// A named input slot fed by the target product of another node.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct NodeSource {
    /// Operator slot this source feeds (e.g. `"input"`).
    pub name: String,
    /// Id of the upstream node whose target product is consumed.
    pub source_node_id: String,
}

impl NodeSource {
    pub fn new(name: impl Into<String>, source_node_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_node_id: source_node_id.into(),
        }
    }
}

/// One operator instance within a graph. Immutable during execution.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Node {
    pub id: String,
    pub operator_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<NodeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ConfigElement>,
}

impl Node {
    pub fn new(id: impl Into<String>, operator_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            operator_name: operator_name.into(),
            sources: Vec::new(),
            configuration: None,
        }
    }

    pub fn with_source(mut self, slot: impl Into<String>, source_node_id: impl Into<String>) -> Self {
        self.sources.push(NodeSource::new(slot, source_node_id));
        self
    }

    pub fn with_configuration(mut self, configuration: ConfigElement) -> Self {
        self.configuration = Some(configuration);
        self
    }
}
