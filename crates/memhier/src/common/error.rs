//! Configuration and simulation error definitions.
//!
//! Errors fall into two classes:
//! 1. **Configuration errors:** Detected eagerly while a controller is being built.
//!    Every variant names the offending parameter and the value that was rejected.
//! 2. **Simulation errors:** The deadlock watchdog is the only runtime failure; once
//!    it has fired the controller refuses to advance.
//!
//! Resource pressure (a full MSHR, a bank conflict) is never an error. It is retried
//! inside the controller and only shows up in the statistics.

use thiserror::Error;

use super::addr::{Addr, Cycle};

/// A malformed or contradictory cache parameter.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required parameter was not supplied.
    #[error("{component}, param not specified: {param} - {what}")]
    MissingParam {
        /// Name of the cache being configured.
        component: String,
        /// Parameter name.
        param: &'static str,
        /// What the parameter describes.
        what: &'static str,
    },

    /// A parameter holds a value outside its legal range or vocabulary.
    #[error("{component}, invalid param: {param} - {reason}. You specified '{value}'")]
    InvalidParam {
        /// Name of the cache being configured.
        component: String,
        /// Parameter name.
        param: &'static str,
        /// The rejected value, as written.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Two individually valid parameters cannot be combined.
    #[error("{component}, invalid param combo: {params} - {reason}")]
    InvalidCombo {
        /// Name of the cache being configured.
        component: String,
        /// The parameters involved.
        params: &'static str,
        /// Why the combination is rejected.
        reason: String,
    },

    /// Associativity is zero or larger than the number of lines in the array.
    #[error(
        "invalid param: {param} - must be at least 1 (direct mapped) and at most the number of entries ({entries}). You specified '{associativity}'"
    )]
    Associativity {
        /// `associativity` or `noninclusive_directory_associativity`.
        param: &'static str,
        /// The requested associativity.
        associativity: u64,
        /// Number of entries in the array.
        entries: u64,
    },

    /// The MSHR must hold at least two entries to avoid deadlock.
    #[error(
        "invalid param: mshr_num_entries - MSHR requires at least 2 entries to avoid deadlock. You specified {0}"
    )]
    MshrSize(i64),

    /// The MSHR lookup latency cannot be derived from this access latency.
    #[error(
        "cannot derive MSHR latency if cache latency > {max}. Set 'mshr_latency_cycles' or reduce cache latency. Cache latency: {latency}"
    )]
    MshrLatencyRange {
        /// The configured access latency.
        latency: u64,
        /// Upper bound of the derivation table.
        max: u64,
    },

    /// Unknown replacement policy name.
    #[error(
        "invalid param: {param} - supported policies are 'lru', 'lfu', 'random', 'mru', and 'nmru'. You specified '{name}'"
    )]
    ReplacementPolicy {
        /// `replacement_policy` or `noninclusive_directory_repl`.
        param: &'static str,
        /// The unrecognized name.
        name: String,
    },

    /// A byte-size parameter carried no byte units or a malformed number.
    #[error(
        "invalid byte size '{value}' - must be specified in bytes with units (SI units OK), for example '1KiB'"
    )]
    ByteUnits {
        /// The rejected value.
        value: String,
    },

    /// The configuration document could not be parsed.
    #[error("failed to parse cache configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("failed to read cache configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// A fatal condition raised while the simulation is running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// An MSHR entry stayed outstanding longer than the configured bound.
    #[error(
        "{component}, deadlock: request for address {addr:#x} outstanding for {waited} cycles (max {max_wait})"
    )]
    Deadlock {
        /// Name of the cache that detected the stall.
        component: String,
        /// Line address of the stalled transaction.
        addr: Addr,
        /// Cycles the transaction has been outstanding.
        waited: Cycle,
        /// The configured bound.
        max_wait: Cycle,
    },

    /// The controller already reported a fatal error and no longer advances.
    #[error("{0}, controller halted after a fatal error")]
    Halted(String),
}
