//! Cache statistics collection and reporting.
//!
//! This module tracks the counters a cache level produces. It provides:
//! 1. **Traffic:** Events received per command, noncacheable events and replays.
//! 2. **Hit/miss:** Demand hits and misses per command, split by whether the access
//!    was resolved on arrival or after being blocked (queued behind an MSHR entry,
//!    deferred by a bank conflict or refused admission).
//! 3. **Resources:** MSHR occupancy samples, bank conflicts and admission deferrals.
//! 4. **Prefetch:** Prefetches issued and dropped.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::common::Command;

/// Running summary of a sampled quantity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Accumulator {
    /// Number of samples.
    pub samples: u64,
    /// Sum of all samples.
    pub sum: u64,
    /// Smallest sample.
    pub min: u64,
    /// Largest sample.
    pub max: u64,
}

impl Accumulator {
    /// Records one sample.
    pub fn add(&mut self, value: u64) {
        if self.samples == 0 || value < self.min {
            self.min = value;
        }
        self.max = self.max.max(value);
        self.samples += 1;
        self.sum += value;
    }

    /// Mean of the samples, or 0 with no samples.
    pub fn mean(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.sum as f64 / self.samples as f64
        }
    }
}

/// Demand access counts per command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DemandCounts {
    /// Shared reads.
    pub get_s: u64,
    /// Exclusive reads.
    pub get_x: u64,
    /// Read-modify-writes.
    pub get_sx: u64,
}

impl DemandCounts {
    /// Increments the counter of `cmd`, ignoring non-demand commands.
    pub const fn record(&mut self, cmd: Command) {
        match cmd {
            Command::GetS => self.get_s += 1,
            Command::GetX => self.get_x += 1,
            Command::GetSX => self.get_sx += 1,
            _ => {}
        }
    }

    /// Sum over all commands.
    pub const fn total(&self) -> u64 {
        self.get_s + self.get_x + self.get_sx
    }
}

/// Counts split by when the access was resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ArrivalSplit {
    /// Resolved the first time it was handled.
    pub arrival: DemandCounts,
    /// Resolved after waiting.
    pub blocked: DemandCounts,
}

impl ArrivalSplit {
    /// Records one access.
    pub const fn record(&mut self, cmd: Command, blocked: bool) {
        if blocked {
            self.blocked.record(cmd);
        } else {
            self.arrival.record(cmd);
        }
    }

    /// Sum over both halves.
    pub const fn total(&self) -> u64 {
        self.arrival.total() + self.blocked.total()
    }
}

/// Statistics of one cache controller.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Controller cycles elapsed.
    pub cycles: u64,
    /// Events received, per command.
    pub events_received: BTreeMap<Command, u64>,
    /// Total events received.
    pub total_events_received: u64,
    /// Operations replayed from an MSHR queue.
    pub total_events_replayed: u64,
    /// Noncacheable events forwarded without a lookup.
    pub noncacheable_events: u64,
    /// Demand hits.
    pub hits: ArrivalSplit,
    /// Demand misses.
    pub misses: ArrivalSplit,
    /// MSHR occupancy, sampled once per cycle.
    pub mshr_occupancy: Accumulator,
    /// Requests that lost bank arbitration.
    pub bank_conflicts: u64,
    /// Requests refused MSHR admission and retried.
    pub mshr_deferrals: u64,
    /// Prefetches injected.
    pub prefetch_requests: u64,
    /// Prefetches dropped by the MSHR thresholds.
    pub prefetch_drops: u64,
}

impl CacheStats {
    /// Records a received event.
    pub fn record_receive(&mut self, cmd: Command) {
        *self.events_received.entry(cmd).or_insert(0) += 1;
        self.total_events_received += 1;
    }

    /// Number of events received with `cmd`.
    pub fn received(&self, cmd: Command) -> u64 {
        self.events_received.get(&cmd).copied().unwrap_or(0)
    }

    /// Total demand hits.
    pub const fn cache_hits(&self) -> u64 {
        self.hits.total()
    }

    /// Total demand misses.
    pub const fn cache_misses(&self) -> u64 {
        self.misses.total()
    }

    /// Demand hit rate in percent, or 0 with no accesses.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits() + self.cache_misses();
        if total == 0 {
            0.0
        } else {
            self.cache_hits() as f64 / total as f64 * 100.0
        }
    }

    /// Prints a human-readable report to stdout.
    ///
    /// # Arguments
    ///
    /// * `name` - Cache name printed in the header.
    pub fn print(&self, name: &str) {
        println!("\n==========================================================");
        println!("CACHE STATISTICS: {name}");
        println!("==========================================================");
        println!("cycles                   {}", self.cycles);
        println!("events.received          {}", self.total_events_received);
        for (cmd, count) in &self.events_received {
            println!("  recv.{:<18} {count}", cmd.name());
        }
        println!("events.replayed          {}", self.total_events_replayed);
        println!("events.noncacheable      {}", self.noncacheable_events);
        println!("----------------------------------------------------------");
        println!("DEMAND ACCESSES");
        println!("  hits                   {}", self.cache_hits());
        println!("  misses                 {}", self.cache_misses());
        println!("  hit_rate               {:.2}%", self.hit_rate());
        for (label, split) in [("hit", &self.hits), ("miss", &self.misses)] {
            for (cmd, arrival, blocked) in [
                ("GetS", split.arrival.get_s, split.blocked.get_s),
                ("GetX", split.arrival.get_x, split.blocked.get_x),
                ("GetSX", split.arrival.get_sx, split.blocked.get_sx),
            ] {
                println!("  {cmd}_{label:<4} arrival {arrival:<8} blocked {blocked}");
            }
        }
        println!("----------------------------------------------------------");
        println!("RESOURCES");
        println!(
            "  mshr.occupancy         mean {:.2} max {}",
            self.mshr_occupancy.mean(),
            self.mshr_occupancy.max
        );
        println!("  mshr.deferrals         {}", self.mshr_deferrals);
        println!("  bank.conflicts         {}", self.bank_conflicts);
        println!("  prefetch.requests      {}", self.prefetch_requests);
        println!("  prefetch.drops         {}", self.prefetch_drops);
        println!("==========================================================");
    }
}
