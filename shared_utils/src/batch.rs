//! Batch Counters
//!
//! Per-run accumulator for a directory-tree conversion. Owned and mutated
//! by the single coordinating thread that drains task completions, so it
//! carries no synchronization of its own.

use serde::Serialize;
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub submitted: usize,
    pub skipped: usize,
    pub converted: usize,
    pub errored: usize,
    pub deleted: usize,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&mut self) {
        self.submitted += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_outcome(&mut self, success: bool) {
        if success {
            self.converted += 1;
        } else {
            self.errored += 1;
        }
    }

    pub fn record_deleted(&mut self) {
        self.deleted += 1;
    }

    /// Every discovered candidate is either skipped or submitted.
    pub fn considered(&self) -> usize {
        self.submitted + self.skipped
    }

    /// True once every submitted task has resolved to exactly one outcome.
    pub fn is_settled(&self) -> bool {
        self.converted + self.errored == self.submitted
    }

    pub fn success_rate(&self) -> f64 {
        if self.submitted == 0 {
            100.0
        } else {
            (self.converted as f64 / self.submitted as f64) * 100.0
        }
    }
}

impl AddAssign for RunCounters {
    fn add_assign(&mut self, other: Self) {
        self.submitted += other.submitted;
        self.skipped += other.skipped;
        self.converted += other.converted;
        self.errored += other.errored;
        self.deleted += other.deleted;
    }
}
