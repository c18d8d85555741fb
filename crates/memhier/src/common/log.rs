//! Per-controller logging context.
//!
//! Each controller carries a `LogContext` instead of relying on a global logger
//! singleton. It names the component in every record and restricts per-address
//! debug output to the configured address set.

use std::collections::BTreeSet;

use super::addr::Addr;

/// Logging configuration handed explicitly to a cache controller and its parts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogContext {
    component: String,
    debug_addrs: BTreeSet<Addr>,
    verbose: u8,
}

impl LogContext {
    /// Creates a context for the named component with no address filter.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            debug_addrs: BTreeSet::new(),
            verbose: 1,
        }
    }

    /// Restricts per-address debug output to the given line addresses.
    #[must_use]
    pub fn with_debug_addrs(mut self, addrs: impl IntoIterator<Item = Addr>) -> Self {
        self.debug_addrs.extend(addrs);
        self
    }

    /// Sets the verbosity used for informational notices.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Component name used to prefix every record.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Configured verbosity level.
    pub const fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Returns true if per-address debug output is enabled for `addr`.
    ///
    /// An empty filter traces every address.
    pub fn tracks(&self, addr: Addr) -> bool {
        self.debug_addrs.is_empty() || self.debug_addrs.contains(&addr)
    }
}
