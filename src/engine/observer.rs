use crate::engine::GraphContext;
use crate::model::raster::Rect;

/// Notification surface for processing events.
///
/// Observers are registered on the processor before execution starts and
/// are invoked in registration order, on the executing thread.
/// `graph_processing_started` precedes the first tile event;
/// `graph_processing_stopped` follows the last one, including after
/// cancellation or an aborted execution.
pub trait GraphObserver: Send + Sync {
    fn graph_processing_started(&self, _context: &GraphContext) {}

    fn tile_processing_started(&self, _context: &GraphContext, _tile_rect: Rect) {}

    fn tile_processing_stopped(&self, _context: &GraphContext, _tile_rect: Rect) {}

    fn graph_processing_stopped(&self, _context: &GraphContext) {}
}
