//! Cache listeners and prefetchers.
//!
//! Listeners observe every demand access the controller resolves. A listener may
//! answer with one follow-up request, which the controller feeds into its delayed
//! prefetch path where it is subject to the MSHR-based drop rules.

/// Next-line prefetcher (prefetches the sequential cache line).
pub mod next_line;

pub use self::next_line::NextLinePrefetcher;

use crate::common::{Addr, Command, Cycle};

/// What a listener is told about an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessNotice {
    /// Requested byte address.
    pub addr: Addr,
    /// Line base address.
    pub base_addr: Addr,
    /// Command of the access.
    pub cmd: Command,
    /// The access hit.
    pub hit: bool,
    /// The access was itself a prefetch.
    pub prefetch: bool,
    /// Cycle the access was resolved.
    pub cycle: Cycle,
}

/// A request a listener asks the cache to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchRequest {
    /// Address to fetch.
    pub addr: Addr,
    /// Command to issue.
    pub cmd: Command,
}

/// An observer of cache accesses.
///
/// # Returns
///
/// `notify` returns an optional follow-up request.
pub trait CacheListener {
    /// Observes one resolved access.
    fn notify(&mut self, notice: &AccessNotice) -> Option<PrefetchRequest>;
}

impl std::fmt::Debug for dyn CacheListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CacheListener")
    }
}
