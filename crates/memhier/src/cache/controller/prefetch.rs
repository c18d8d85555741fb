//! Delayed prefetch path.
//!
//! Follow-up requests from listeners are held for a fixed number of cycles and then
//! offered to the controller. At that point a prefetch is dropped if the MSHR is at
//! or above the drop level, or if too many prefetches are already outstanding.

use std::collections::VecDeque;

use crate::{
    cache::mshr::MshrTable,
    common::{Cycle, MemEvent},
    config::PrefetchParams,
};

/// Prefetches waiting for their injection cycle.
#[derive(Debug, Clone)]
pub struct PrefetchPath {
    params: PrefetchParams,
    pending: VecDeque<(Cycle, MemEvent)>,
}

impl PrefetchPath {
    /// Creates an empty path.
    pub const fn new(params: PrefetchParams) -> Self {
        Self {
            params,
            pending: VecDeque::new(),
        }
    }

    /// Thresholds and delay.
    pub const fn params(&self) -> PrefetchParams {
        self.params
    }

    /// Schedules `event` for injection `delay` cycles after `now`.
    pub fn schedule(&mut self, event: MemEvent, now: Cycle) {
        self.pending.push_back((now + self.params.delay, event));
    }

    /// Removes the prefetches due at `now`, in issue order.
    pub fn due(&mut self, now: Cycle) -> Vec<MemEvent> {
        let mut ready = Vec::new();
        while self.pending.front().is_some_and(|(at, _)| *at <= now) {
            if let Some((_, event)) = self.pending.pop_front() {
                ready.push(event);
            }
        }
        ready
    }

    /// Number of prefetches waiting for injection.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Decides whether a prefetch may be injected.
    ///
    /// # Arguments
    ///
    /// * `mshr` - Current MSHR state.
    /// * `queued` - Prefetches already injected but not yet admitted to the MSHR.
    pub fn admits(&self, mshr: &MshrTable, queued: usize) -> bool {
        mshr.occupancy() < self.params.drop_level
            && mshr.outstanding_prefetches() + queued < self.params.max_outstanding
    }
}
