//! The declared processing graph: nodes, named source edges and per-node
//! configuration trees.

mod config;
mod graph;
mod node;

pub use config::ConfigElement;
pub use graph::Graph;
pub use node::{Node, NodeSource};
