//! Next-Line Prefetcher.
//!
//! A simple spatial prefetcher that requests the next sequential cache line after
//! every demand miss. This exploits the spatial locality common in instruction
//! streams and sequential data arrays.

use super::{AccessNotice, CacheListener, PrefetchRequest};
use crate::common::Command;

/// Next-Line Prefetcher state.
#[derive(Debug, Clone)]
pub struct NextLinePrefetcher {
    /// Size of a cache line in bytes.
    line_bytes: u64,
    /// Also prefetch on hits, not only on misses.
    on_hit: bool,
}

impl NextLinePrefetcher {
    /// Creates a new Next-Line prefetcher that triggers on misses.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes.
    pub const fn new(line_bytes: u64) -> Self {
        Self {
            line_bytes,
            on_hit: false,
        }
    }

    /// Makes the prefetcher trigger on hits as well.
    #[must_use]
    pub const fn on_hits(mut self) -> Self {
        self.on_hit = true;
        self
    }
}

impl CacheListener for NextLinePrefetcher {
    /// Observes a demand access and requests the following line.
    ///
    /// Prefetch-initiated accesses are ignored so prefetches do not cascade.
    fn notify(&mut self, notice: &AccessNotice) -> Option<PrefetchRequest> {
        if notice.prefetch || !notice.cmd.is_data_request() || (notice.hit && !self.on_hit) {
            return None;
        }
        let target = (notice.addr & !(self.line_bytes - 1)).checked_add(self.line_bytes)?;
        Some(PrefetchRequest {
            addr: target,
            cmd: Command::GetS,
        })
    }
}
