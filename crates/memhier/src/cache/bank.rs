//! Bank arbitration.
//!
//! A banked cache can start one access per bank per cycle. The arbiter grants the
//! first request for each bank in a cycle and parks the losers in that bank's
//! conflict buffer; the controller drains the buffers back into its retry queue at
//! the end of the cycle. With zero banks every request is granted.

use std::collections::VecDeque;

/// Outcome of a bank reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The bank was free and is now busy for the rest of the cycle.
    Granted,
    /// The bank is already busy this cycle.
    Conflict,
}

/// Per-cycle bank port arbiter.
#[derive(Debug, Clone)]
pub struct BankArbiter<T> {
    busy: Vec<bool>,
    conflicts: Vec<VecDeque<T>>,
}

impl<T> BankArbiter<T> {
    /// Creates an arbiter for `banks` banks; 0 disables arbitration.
    pub fn new(banks: usize) -> Self {
        Self {
            busy: vec![false; banks],
            conflicts: (0..banks).map(|_| VecDeque::new()).collect(),
        }
    }

    /// Number of banks.
    pub fn banks(&self) -> usize {
        self.busy.len()
    }

    /// Frees every bank for a new cycle.
    pub fn reset(&mut self) {
        self.busy.fill(false);
    }

    /// Attempts to claim `bank` for this cycle.
    pub fn reserve(&mut self, bank: usize) -> Reservation {
        match self.busy.get_mut(bank) {
            None => Reservation::Granted,
            Some(busy) if *busy => Reservation::Conflict,
            Some(busy) => {
                *busy = true;
                Reservation::Granted
            }
        }
    }

    /// Returns a grant that will not be used this cycle.
    pub fn release(&mut self, bank: usize) {
        if let Some(busy) = self.busy.get_mut(bank) {
            *busy = false;
        }
    }

    /// Returns true if `bank` has been granted this cycle.
    pub fn is_busy(&self, bank: usize) -> bool {
        self.busy.get(bank).copied().unwrap_or(false)
    }

    /// Parks a request that lost arbitration for `bank`.
    pub fn defer(&mut self, bank: usize, item: T) {
        if let Some(queue) = self.conflicts.get_mut(bank) {
            queue.push_back(item);
        }
    }

    /// Number of parked requests across all banks.
    pub fn deferred_len(&self) -> usize {
        self.conflicts.iter().map(VecDeque::len).sum()
    }

    /// Drains every conflict buffer, bank by bank, each in arrival order.
    pub fn take_deferred(&mut self) -> Vec<T> {
        self.conflicts.iter_mut().flat_map(|q| q.drain(..)).collect()
    }
}
