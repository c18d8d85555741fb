//! Deadlock watchdog.
//!
//! Every `check_interval` cycles the watchdog looks at the MSHR entry that has
//! been open longest. If it has been outstanding for more than `max_wait` cycles
//! the cache is deadlocked.

use crate::{
    cache::mshr::MshrTable,
    common::{Addr, Cycle},
    config::WatchdogParams,
};

/// A stalled transaction found by the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stall {
    /// Line address.
    pub addr: Addr,
    /// Cycles outstanding.
    pub waited: Cycle,
}

/// Watchdog state of one controller.
#[derive(Debug, Clone)]
pub struct Watchdog {
    params: WatchdogParams,
    next_check: Cycle,
}

impl Watchdog {
    /// Creates a watchdog; the first check happens one interval after cycle 0.
    pub const fn new(params: WatchdogParams) -> Self {
        Self {
            params,
            next_check: params.check_interval,
        }
    }

    /// Bound and interval.
    pub const fn params(&self) -> WatchdogParams {
        self.params
    }

    /// Cycle of the next check.
    pub const fn next_check(&self) -> Cycle {
        self.next_check
    }

    /// Runs a check if one is due at `now`, then re-arms.
    ///
    /// # Returns
    ///
    /// The stalled transaction, if the oldest one exceeds the bound.
    pub fn check(&mut self, now: Cycle, mshr: &MshrTable) -> Option<Stall> {
        if !self.params.enabled() || now < self.next_check {
            return None;
        }
        self.next_check = now + self.params.check_interval;
        let (addr, since) = mshr.oldest()?;
        let waited = now.saturating_sub(since);
        (waited > self.params.max_wait).then_some(Stall { addr, waited })
    }
}
