//! Miss Status Holding Registers (MSHR).
//!
//! The MSHR tracks in-flight line-level transactions. Each entry is keyed by a line
//! address and holds the FIFO of operations waiting on that line; the head of the
//! queue is the operation being serviced.
//!
//! The table is the deadlock-avoidance authority for the cache:
//! - Requests from above may only open a new entry while at least one entry stays
//!   free. The last entry is reserved for requests forwarded from below, which must
//!   always make progress for the caches above to drain.
//! - Joining an existing entry never allocates and always succeeds.
//! - Occupancy never exceeds capacity.

use std::collections::{BTreeMap, VecDeque};

use crate::common::{Addr, ConfigError, Cycle, LogContext, MemEvent};

/// Largest access latency the lookup-latency derivation covers.
pub const MAX_DERIVED_LATENCY_INPUT: u64 = 200;

/// Access-latency ranges (inclusive) and the MSHR lookup latency derived for them.
const LATENCY_TABLE: [(u64, u64, u64); 7] = [
    (1, 1, 1),
    (2, 11, 2),
    (12, 15, 3),
    (16, 25, 5),
    (26, 45, 19),
    (46, 67, 26),
    (68, MAX_DERIVED_LATENCY_INPUT, 32),
];

/// Derives the MSHR lookup latency from the cache access latency.
///
/// First-level caches always use 1. Other levels use a fixed table interpolated from
/// published cache timings.
///
/// # Arguments
///
/// * `access_latency` - Data access latency in cycles.
/// * `l1` - The cache is a first-level cache.
///
/// # Returns
///
/// The lookup latency, or `ConfigError::MshrLatencyRange` when `access_latency` is
/// outside the table.
pub fn mshr_lookup_latency(access_latency: u64, l1: bool) -> Result<u64, ConfigError> {
    if l1 {
        return Ok(1);
    }
    LATENCY_TABLE
        .iter()
        .find(|&&(lo, hi, _)| (lo..=hi).contains(&access_latency))
        .map(|&(_, _, latency)| latency)
        .ok_or(ConfigError::MshrLatencyRange {
            latency: access_latency,
            max: MAX_DERIVED_LATENCY_INPUT,
        })
}

/// Outcome of an admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new entry was opened; the operation is at its head.
    NewEntry,
    /// The operation joined an existing entry and waits behind `ahead` operations.
    Joined {
        /// Operations queued ahead of this one.
        ahead: usize,
    },
    /// No entry could be opened; the caller must retry later.
    Rejected,
}

/// One tracked line.
#[derive(Debug, Clone)]
pub struct MshrEntry {
    ops: VecDeque<MemEvent>,
    allocated_at: Cycle,
    head_since: Cycle,
}

impl MshrEntry {
    /// Cycle the entry was opened.
    pub const fn allocated_at(&self) -> Cycle {
        self.allocated_at
    }

    /// Cycle the current head operation reached the head of the queue.
    pub const fn head_since(&self) -> Cycle {
        self.head_since
    }

    /// The queued operations, head first.
    pub const fn ops(&self) -> &VecDeque<MemEvent> {
        &self.ops
    }
}

/// The table of in-flight transactions.
#[derive(Debug, Clone)]
pub struct MshrTable {
    entries: BTreeMap<Addr, MshrEntry>,
    capacity: usize,
    latency: u64,
    prefetches: usize,
    log: LogContext,
}

impl MshrTable {
    /// Creates an empty table.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of entries; at least 2.
    /// * `latency` - Lookup latency in cycles, reported to the protocol.
    /// * `log` - Logging context of the owning cache.
    pub fn new(capacity: usize, latency: u64, log: LogContext) -> Result<Self, ConfigError> {
        if capacity < 2 {
            return Err(ConfigError::MshrSize(capacity as i64));
        }
        Ok(Self {
            entries: BTreeMap::new(),
            capacity,
            latency,
            prefetches: 0,
            log,
        })
    }

    /// Admits an operation arriving from above.
    ///
    /// Joins an existing entry for `addr` if there is one. Otherwise a new entry is
    /// opened only while occupancy is below `capacity - 1`.
    pub fn admit(&mut self, addr: Addr, op: MemEvent, now: Cycle) -> Admission {
        self.insert(addr, op, now, self.capacity - 1)
    }

    /// Admits an operation forwarded from below.
    ///
    /// Like `admit`, but may take the reserved last entry.
    pub fn admit_forward(&mut self, addr: Addr, op: MemEvent, now: Cycle) -> Admission {
        self.insert(addr, op, now, self.capacity)
    }

    fn insert(&mut self, addr: Addr, op: MemEvent, now: Cycle, limit: usize) -> Admission {
        let prefetch = op.prefetch;
        if let Some(entry) = self.entries.get_mut(&addr) {
            let ahead = entry.ops.len();
            entry.ops.push_back(op);
            if prefetch {
                self.prefetches += 1;
            }
            if self.log.tracks(addr) {
                tracing::debug!(
                    cache = %self.log.component(),
                    addr = format_args!("{addr:#x}"),
                    ahead,
                    "joined MSHR entry"
                );
            }
            return Admission::Joined { ahead };
        }
        if self.entries.len() >= limit {
            return Admission::Rejected;
        }
        let _ = self.entries.insert(
            addr,
            MshrEntry {
                ops: VecDeque::from([op]),
                allocated_at: now,
                head_since: now,
            },
        );
        if prefetch {
            self.prefetches += 1;
        }
        Admission::NewEntry
    }

    /// Completes the head operation of `addr`.
    ///
    /// The entry is removed once its queue is empty; otherwise the next operation
    /// becomes the head as of `now`.
    ///
    /// # Returns
    ///
    /// The completed operation, or `None` if `addr` is not tracked.
    pub fn complete(&mut self, addr: Addr, now: Cycle) -> Option<MemEvent> {
        let entry = self.entries.get_mut(&addr)?;
        let done = entry.ops.pop_front()?;
        if entry.ops.is_empty() {
            let _ = self.entries.remove(&addr);
        } else {
            entry.head_since = now;
        }
        if done.prefetch {
            self.prefetches = self.prefetches.saturating_sub(1);
        }
        Some(done)
    }

    /// The operation at the head of `addr`'s queue.
    pub fn head(&self, addr: Addr) -> Option<&MemEvent> {
        self.entries.get(&addr).and_then(|entry| entry.ops.front())
    }

    /// The entry for `addr`.
    pub fn entry(&self, addr: Addr) -> Option<&MshrEntry> {
        self.entries.get(&addr)
    }

    /// Returns true if `addr` has an entry.
    pub fn contains(&self, addr: Addr) -> bool {
        self.entries.contains_key(&addr)
    }

    /// Number of queued operations for `addr`.
    pub fn pending(&self, addr: Addr) -> usize {
        self.entries.get(&addr).map_or(0, |entry| entry.ops.len())
    }

    /// Number of open entries.
    pub fn occupancy(&self) -> usize {
        self.entries.len()
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lookup latency in cycles.
    pub const fn latency(&self) -> u64 {
        self.latency
    }

    /// Returns true if no entries are open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of prefetch operations currently queued in any entry.
    pub const fn outstanding_prefetches(&self) -> usize {
        self.prefetches
    }

    /// The entry that has been open longest, as `(addr, allocated_at)`.
    ///
    /// Completing a head operation does not reset the age of its entry.
    pub fn oldest(&self) -> Option<(Addr, Cycle)> {
        self.entries
            .iter()
            .map(|(&addr, entry)| (addr, entry.allocated_at))
            .min_by_key(|&(addr, since)| (since, addr))
    }

    /// Iterates over open entries in address order.
    pub fn iter(&self) -> impl Iterator<Item = (Addr, &MshrEntry)> {
        self.entries.iter().map(|(&addr, entry)| (addr, entry))
    }
}
