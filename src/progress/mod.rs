//! Progress reporting and cooperative cancellation.
//!
//! The engine reports work through a `ProgressMonitor` and polls its
//! cancellation state once per tile. Cancellation never interrupts an
//! in-progress tile pull.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sink for progress reports of one task.
pub trait ProgressMonitor {
    fn begin_task(&mut self, label: &str, total_work: usize);
    fn worked(&mut self, work: usize);
    fn done(&mut self);

    fn is_canceled(&self) -> bool {
        false
    }
}

/// Discards all progress and never cancels.
pub struct NullProgress;

impl ProgressMonitor for NullProgress {
    fn begin_task(&mut self, _label: &str, _total_work: usize) {}

    fn worked(&mut self, _work: usize) {}

    fn done(&mut self) {}
}

/// Cloneable cancellation signal shared between the caller and the
/// running engine.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress monitor that only carries a cancellation flag.
pub struct CancelableProgress {
    flag: CancelFlag,
}

impl CancelableProgress {
    pub fn new(flag: CancelFlag) -> Self {
        Self { flag }
    }
}

impl ProgressMonitor for CancelableProgress {
    fn begin_task(&mut self, _label: &str, _total_work: usize) {}

    fn worked(&mut self, _work: usize) {}

    fn done(&mut self) {}

    fn is_canceled(&self) -> bool {
        self.flag.is_canceled()
    }
}

/// View of a fixed share of a parent monitor's budget.
///
/// The child announces its own total via `begin_task`; its work is scaled
/// so that completing the child forwards exactly `parent_ticks` to the
/// parent. `done` forwards any remainder.
pub struct SubProgress<'a> {
    parent: &'a mut dyn ProgressMonitor,
    parent_ticks: usize,
    total: usize,
    worked: usize,
    forwarded: usize,
}

impl<'a> SubProgress<'a> {
    pub fn new(parent: &'a mut dyn ProgressMonitor, parent_ticks: usize) -> Self {
        Self {
            parent,
            parent_ticks,
            total: 1,
            worked: 0,
            forwarded: 0,
        }
    }
}

impl ProgressMonitor for SubProgress<'_> {
    fn begin_task(&mut self, _label: &str, total_work: usize) {
        self.total = total_work.max(1);
    }

    fn worked(&mut self, work: usize) {
        self.worked = (self.worked + work).min(self.total);
        let target = self.parent_ticks * self.worked / self.total;
        if target > self.forwarded {
            self.parent.worked(target - self.forwarded);
            self.forwarded = target;
        }
    }

    fn done(&mut self) {
        if self.forwarded < self.parent_ticks {
            self.parent.worked(self.parent_ticks - self.forwarded);
            self.forwarded = self.parent_ticks;
        }
    }

    fn is_canceled(&self) -> bool {
        self.parent.is_canceled()
    }
}
