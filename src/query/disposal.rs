use crate::scoring::LifecycleError;

/// Outcome of closing a context or query.
///
/// Disposal never stops at the first failure: every child is closed and the
/// failures are collected here.
#[derive(Debug, Default)]
pub struct DisposalReport {
    pub contexts_closed: usize,
    pub cursors_closed: usize,
    /// Engine scorer handles destroyed.
    pub handles_released: usize,
    pub failures: Vec<LifecycleError>,
}

impl DisposalReport {
    /// Records one cursor close.
    pub(crate) fn record_cursor(&mut self, outcome: Result<bool, LifecycleError>) {
        self.cursors_closed += 1;
        match outcome {
            Ok(true) => self.handles_released += 1,
            Ok(false) => {}
            Err(e) => self.failures.push(e),
        }
    }

    pub fn merge(&mut self, other: DisposalReport) {
        self.contexts_closed += other.contexts_closed;
        self.cursors_closed += other.cursors_closed;
        self.handles_released += other.handles_released;
        self.failures.extend(other.failures);
    }

    /// `true` when nothing failed.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
