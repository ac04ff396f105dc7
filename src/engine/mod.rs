//! Execution engine: per-node runtime contexts, the graph context, the
//! processor that initializes, schedules and disposes them, and the
//! observer surface.

mod graph_context;
mod init;
mod node_context;
mod observer;
mod processor;

pub use graph_context::GraphContext;
pub use node_context::NodeContext;
pub use observer::GraphObserver;
pub use processor::GraphProcessor;
