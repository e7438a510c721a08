//! Priority arbitration between generator results.
//!
//! Every generator keeps its own best candidate during its spatial walk and
//! hands it to the arbiter exactly once. Because [`SnapPriority::total_cmp`]
//! is a total order, the winner does not depend on which generator ran first.

use crate::control_point::ControlPoint;

/// `candidate` if it ranks strictly higher than `best`, otherwise `best`.
pub fn prefer(candidate: ControlPoint, best: ControlPoint) -> ControlPoint {
    if candidate.snap_priority.is_higher_than(&best.snap_priority) {
        candidate
    } else {
        best
    }
}

/// Running "best so far" seeded with the unsnapped baseline.
#[derive(Debug, Clone, Copy)]
pub struct SnapArbiter {
    best: ControlPoint,
}

impl SnapArbiter {
    pub fn new(baseline: ControlPoint) -> Self {
        Self { best: baseline }
    }

    pub fn offer(&mut self, candidate: Option<ControlPoint>) {
        if let Some(candidate) = candidate {
            self.best = prefer(candidate, self.best);
        }
    }

    pub fn best(&self) -> &ControlPoint {
        &self.best
    }

    pub fn finish(self) -> ControlPoint {
        self.best
    }
}
