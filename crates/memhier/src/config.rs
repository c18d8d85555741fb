//! Configuration system for a single cache level.
//!
//! This module turns a flat parameter document into the validated, derived values a
//! controller is built from. It provides:
//! 1. **Defaults:** Baseline values for every optional parameter.
//! 2. **Raw parameters:** `CacheConfig`, deserialized from JSON with the usual parameter
//!    names. Selector strings (`coherence_protocol`, `cache_type`, policies) are matched
//!    case-insensitively.
//! 3. **Validation:** `CacheConfig::validate` applies every range and combination check and
//!    derives the MSHR latency, prefetch thresholds, slice region, watchdog interval and
//!    coherence protocol selection, producing `CacheParams`.
//!
//! Byte-size parameters accept either an integer number of bytes or a string with byte
//! units (`"32KiB"`, `"1MB"`, `"64B"`).

use std::{collections::BTreeMap, fmt, fs, path::Path, str::FromStr};

use serde::{
    Deserialize, Deserializer,
    de::{self, Visitor},
};

use crate::{
    cache::{mshr::mshr_lookup_latency, region::AddressRegion},
    common::{ConfigError, LogContext},
    protocol::{ProtocolKind, select_protocol},
};

/// Default configuration constants for a cache level.
mod defaults {
    /// Component name used when none is configured.
    pub const NAME: &str = "cache";

    /// Default coherence protocol.
    pub const COHERENCE_PROTOCOL: &str = "mesi";

    /// Default inclusion policy.
    pub const CACHE_TYPE: &str = "inclusive";

    /// Default cache line size in bytes.
    pub const LINE_SIZE: u64 = 64;

    /// Default replacement policy for both arrays.
    pub const REPLACEMENT: &str = "lru";

    /// Default directory associativity (direct-mapped).
    pub const DIRECTORY_ASSOCIATIVITY: u64 = 1;

    /// MSHR size used when `mshr_num_entries` is absent or -1.
    ///
    /// Large enough that the table is never the bottleneck.
    pub const HUGE_MSHR: usize = 100_000;

    /// Default delay between a prefetch being issued and it entering the inbound queue.
    pub const PREFETCH_DELAY: u64 = 1;

    /// Default per-cycle request limit (unlimited).
    pub const MAX_REQUESTS_PER_CYCLE: i64 = -1;

    /// Default minimum packet size in bytes.
    pub const MIN_PACKET_SIZE: u64 = 8;

    /// Default number of slices sharing this cache level.
    pub const SLICE_COUNT: u64 = 1;

    /// Default slice allocation policy (round robin).
    pub const SLICE_POLICY: &str = "rr";

    /// Default output verbosity.
    pub const VERBOSE: u8 = 1;
}

/// Parameters that were removed and are ignored with a warning.
const DEPRECATED_PARAMS: &[&str] = &[
    "network_address",
    "network_bw",
    "network_input_buffer_size",
    "network_output_buffer_size",
    "directory_at_next_level",
    "bottom_network",
    "top_network",
    "prefetch_cache_size",
];

/// A size in bytes, written either as a bare integer or as a number with byte units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ByteSize(pub u64);

impl ByteSize {
    /// Returns the size in bytes.
    #[inline]
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = ConfigError;

    /// Parses `<number><unit>` where unit is one of `B`, `KB`, `KiB`, `MB`, `MiB`,
    /// `GB`, `GiB`, `TB`, `TiB`. A string without byte units is rejected; bare byte
    /// counts are written as JSON integers instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::ByteUnits {
            value: s.to_string(),
        };
        let text = s.trim();
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (digits, unit) = text.split_at(split);
        let value: u64 = digits.parse().map_err(|_| err())?;
        let multiplier: u64 = match unit.trim() {
            "B" => 1,
            "KB" | "kB" => 1000,
            "KiB" => 1 << 10,
            "MB" => 1000 * 1000,
            "MiB" => 1 << 20,
            "GB" => 1000 * 1000 * 1000,
            "GiB" => 1 << 30,
            "TB" => 1000 * 1000 * 1000 * 1000,
            "TiB" => 1 << 40,
            _ => return Err(err()),
        };
        value.checked_mul(multiplier).map(Self).ok_or_else(err)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ByteSizeVisitor;

        impl Visitor<'_> for ByteSizeVisitor {
            type Value = ByteSize;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte count or a string with byte units such as \"32KiB\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ByteSize, E> {
                Ok(ByteSize(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ByteSize, E> {
                u64::try_from(v)
                    .map(ByteSize)
                    .map_err(|_| E::custom(format!("negative byte size {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ByteSize, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ByteSizeVisitor)
    }
}

/// Coherence protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoherenceProtocol {
    /// Modified/Exclusive/Shared/Invalid.
    #[default]
    Mesi,
    /// Modified/Shared/Invalid.
    Msi,
    /// No coherence.
    None,
}

/// Inclusion policy of this cache relative to the caches above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheType {
    /// Every line held above is also held here.
    #[default]
    Inclusive,
    /// Lines held above may be absent here.
    Noninclusive,
    /// Non-inclusive data array backed by a separate coherence directory.
    NoninclusiveWithDirectory,
}

/// Replacement policy used by a tag array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacementPolicy {
    /// Least Recently Used.
    #[default]
    Lru,
    /// Least Frequently Used, ties broken by recency.
    Lfu,
    /// Uniformly random.
    Random,
    /// Most Recently Used.
    Mru,
    /// Anything but the most recently used way.
    Nmru,
}

impl ReplacementPolicy {
    /// Parses a policy name for the given parameter.
    ///
    /// # Arguments
    ///
    /// * `param` - Parameter the name was read from (for error reporting).
    /// * `name` - Policy name, matched case-insensitively.
    pub fn from_name(param: &'static str, name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            "random" => Ok(Self::Random),
            "mru" => Ok(Self::Mru),
            "nmru" => Ok(Self::Nmru),
            _ => Err(ConfigError::ReplacementPolicy {
                param,
                name: name.to_string(),
            }),
        }
    }
}

/// Set-index hash function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashFunction {
    /// The line address itself.
    #[default]
    Identity,
    /// `1103515245 * x + 12345`.
    Linear,
    /// Bytes 1..7 XOR-folded into byte 0.
    Xor,
}

impl HashFunction {
    /// Maps the numeric `hash_function` parameter: 1 is linear, 2 is XOR and
    /// anything else is the identity.
    pub const fn from_id(id: i64) -> Self {
        match id {
            1 => Self::Linear,
            2 => Self::Xor,
            _ => Self::Identity,
        }
    }
}

/// Raw cache parameters as supplied by the user.
///
/// Field names match the parameter names of the configuration document. Required
/// parameters are `Option`s so that their absence is reported by `validate` with a
/// descriptive error rather than a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Component name used in log records and errors.
    #[serde(default = "CacheConfig::default_name")]
    pub name: String,

    /// This cache is the first level (closest to the processor).
    #[serde(default, alias = "L1")]
    pub l1: bool,

    /// `mesi`, `msi` or `none`.
    #[serde(default = "CacheConfig::default_protocol")]
    pub coherence_protocol: String,

    /// `inclusive`, `noninclusive` or `noninclusive_with_directory`.
    #[serde(default = "CacheConfig::default_cache_type")]
    pub cache_type: String,

    /// Total data capacity (required).
    #[serde(default)]
    pub cache_size: Option<ByteSize>,

    /// Line size in bytes; a power of two no larger than the cache.
    #[serde(default = "CacheConfig::default_line_size")]
    pub cache_line_size: u64,

    /// Ways per set (required).
    #[serde(default)]
    pub associativity: Option<u64>,

    /// Data access latency in cycles (required, at least 1).
    #[serde(default)]
    pub access_latency_cycles: Option<u64>,

    /// Tag lookup latency in cycles; defaults to the access latency.
    #[serde(default)]
    pub tag_access_latency_cycles: Option<u64>,

    /// Data array replacement policy.
    #[serde(default = "CacheConfig::default_replacement")]
    pub replacement_policy: String,

    /// Directory entries (directory mode only).
    #[serde(default)]
    pub noninclusive_directory_entries: u64,

    /// Directory associativity (directory mode only).
    #[serde(default = "CacheConfig::default_directory_associativity")]
    pub noninclusive_directory_associativity: u64,

    /// Directory replacement policy (directory mode only).
    #[serde(default = "CacheConfig::default_replacement")]
    pub noninclusive_directory_repl: String,

    /// 0 identity, 1 linear, 2 XOR.
    #[serde(default)]
    pub hash_function: i64,

    /// Number of independently accessible banks; 0 disables banking.
    #[serde(default)]
    pub banks: u64,

    /// MSHR capacity; absent or -1 means effectively unbounded.
    #[serde(default)]
    pub mshr_num_entries: Option<i64>,

    /// MSHR lookup latency; 0 or absent derives it from the access latency.
    #[serde(default)]
    pub mshr_latency_cycles: Option<u64>,

    /// Maximum prefetches outstanding in the MSHR; defaults to half its capacity.
    #[serde(default)]
    pub max_outstanding_prefetch: Option<u64>,

    /// MSHR occupancy at which prefetches are dropped.
    #[serde(default)]
    pub drop_prefetch_mshr_level: Option<u64>,

    /// Cycles between a prefetch being issued and it being handled.
    #[serde(default = "CacheConfig::default_prefetch_delay")]
    pub prefetch_delay_cycles: u64,

    /// Events handled per cycle; 0 or negative means unlimited.
    #[serde(default = "CacheConfig::default_max_requests")]
    pub max_requests_per_cycle: i64,

    /// Treat every request as noncacheable.
    #[serde(default)]
    pub force_noncacheable_reqs: bool,

    /// Smallest packet the protocol sends (control messages).
    #[serde(default = "CacheConfig::default_min_packet_size")]
    pub min_packet_size: ByteSize,

    /// Number of slices sharing this cache level.
    #[serde(default = "CacheConfig::default_slice_count")]
    pub num_cache_slices: u64,

    /// This slice's index.
    #[serde(default)]
    pub slice_id: u64,

    /// Slice allocation policy; only `rr` is supported.
    #[serde(default = "CacheConfig::default_slice_policy")]
    pub slice_allocation_policy: String,

    /// Explicit region start (overrides the slice-derived region).
    #[serde(default)]
    pub addr_range_start: Option<u64>,

    /// Explicit region end, inclusive.
    #[serde(default)]
    pub addr_range_end: Option<u64>,

    /// Explicit interleave chunk size.
    #[serde(default)]
    pub interleave_size: Option<ByteSize>,

    /// Explicit interleave step.
    #[serde(default)]
    pub interleave_step: Option<ByteSize>,

    /// Watchdog bound in cycles; 0 disables the watchdog.
    #[serde(default)]
    pub max_request_delay: u64,

    /// Addresses for which per-address debug records are emitted; empty traces all.
    #[serde(default)]
    pub debug_addr: Vec<u64>,

    /// Verbosity of informational notices.
    #[serde(default = "CacheConfig::default_verbose")]
    pub verbose: u8,

    /// Parameters not recognized above.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl CacheConfig {
    /// Returns the default component name.
    fn default_name() -> String {
        defaults::NAME.to_string()
    }

    /// Returns the default coherence protocol name.
    fn default_protocol() -> String {
        defaults::COHERENCE_PROTOCOL.to_string()
    }

    /// Returns the default cache type name.
    fn default_cache_type() -> String {
        defaults::CACHE_TYPE.to_string()
    }

    /// Returns the default line size in bytes.
    const fn default_line_size() -> u64 {
        defaults::LINE_SIZE
    }

    /// Returns the default replacement policy name.
    fn default_replacement() -> String {
        defaults::REPLACEMENT.to_string()
    }

    /// Returns the default directory associativity.
    const fn default_directory_associativity() -> u64 {
        defaults::DIRECTORY_ASSOCIATIVITY
    }

    /// Returns the default prefetch delay in cycles.
    const fn default_prefetch_delay() -> u64 {
        defaults::PREFETCH_DELAY
    }

    /// Returns the default per-cycle request limit.
    const fn default_max_requests() -> i64 {
        defaults::MAX_REQUESTS_PER_CYCLE
    }

    /// Returns the default minimum packet size.
    const fn default_min_packet_size() -> ByteSize {
        ByteSize(defaults::MIN_PACKET_SIZE)
    }

    /// Returns the default slice count.
    const fn default_slice_count() -> u64 {
        defaults::SLICE_COUNT
    }

    /// Returns the default slice allocation policy.
    fn default_slice_policy() -> String {
        defaults::SLICE_POLICY.to_string()
    }

    /// Returns the default verbosity.
    const fn default_verbose() -> u8 {
        defaults::VERBOSE
    }

    /// Parses a configuration from a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl Default for CacheConfig {
    /// Creates a configuration with every optional parameter at its default and the
    /// required parameters (`cache_size`, `associativity`, `access_latency_cycles`)
    /// unset.
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            l1: false,
            coherence_protocol: Self::default_protocol(),
            cache_type: Self::default_cache_type(),
            cache_size: None,
            cache_line_size: defaults::LINE_SIZE,
            associativity: None,
            access_latency_cycles: None,
            tag_access_latency_cycles: None,
            replacement_policy: Self::default_replacement(),
            noninclusive_directory_entries: 0,
            noninclusive_directory_associativity: defaults::DIRECTORY_ASSOCIATIVITY,
            noninclusive_directory_repl: Self::default_replacement(),
            hash_function: 0,
            banks: 0,
            mshr_num_entries: None,
            mshr_latency_cycles: None,
            max_outstanding_prefetch: None,
            drop_prefetch_mshr_level: None,
            prefetch_delay_cycles: defaults::PREFETCH_DELAY,
            max_requests_per_cycle: defaults::MAX_REQUESTS_PER_CYCLE,
            force_noncacheable_reqs: false,
            min_packet_size: ByteSize(defaults::MIN_PACKET_SIZE),
            num_cache_slices: defaults::SLICE_COUNT,
            slice_id: 0,
            slice_allocation_policy: Self::default_slice_policy(),
            addr_range_start: None,
            addr_range_end: None,
            interleave_size: None,
            interleave_step: None,
            max_request_delay: 0,
            debug_addr: Vec::new(),
            verbose: defaults::VERBOSE,
            other: BTreeMap::new(),
        }
    }
}

/// Geometry and policy of the coherence directory array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryParams {
    /// Number of directory entries.
    pub entries: u64,
    /// Directory associativity.
    pub associativity: u64,
    /// Directory replacement policy.
    pub replacement: ReplacementPolicy,
}

/// Prefetch admission thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchParams {
    /// Maximum prefetches outstanding in the MSHR.
    pub max_outstanding: usize,
    /// MSHR occupancy at or above which prefetches are dropped.
    pub drop_level: usize,
    /// Cycles between issue and handling.
    pub delay: u64,
}

/// Slice membership of this cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceParams {
    /// Total number of slices.
    pub count: u64,
    /// This slice's index (always 0 when `count` is 1).
    pub id: u64,
}

/// Watchdog bound and check interval, both in cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchdogParams {
    /// Longest an MSHR transaction may stay outstanding; 0 disables the watchdog.
    pub max_wait: u64,
    /// Cycles between checks.
    pub check_interval: u64,
}

impl WatchdogParams {
    /// Derives the check interval: a quarter of the bound, or the bound itself when
    /// that rounds to zero.
    pub const fn new(max_wait: u64) -> Self {
        let quarter = max_wait / 4;
        Self {
            max_wait,
            check_interval: if quarter == 0 { max_wait } else { quarter },
        }
    }

    /// Returns true if the watchdog is armed.
    #[inline]
    pub const fn enabled(&self) -> bool {
        self.max_wait > 0
    }
}

/// Validated and derived cache parameters.
#[derive(Debug, Clone)]
pub struct CacheParams {
    /// Logging context (component name, debug address filter, verbosity).
    pub log: LogContext,
    /// First-level cache.
    pub l1: bool,
    /// Coherence protocol family.
    pub protocol: CoherenceProtocol,
    /// Inclusion policy.
    pub cache_type: CacheType,
    /// Coherence protocol implementation to instantiate.
    pub protocol_kind: ProtocolKind,
    /// Total data capacity in bytes.
    pub cache_size: u64,
    /// Line size in bytes.
    pub line_size: u64,
    /// Number of data lines.
    pub lines: u64,
    /// Data array associativity.
    pub associativity: u64,
    /// Data array replacement policy.
    pub replacement: ReplacementPolicy,
    /// Directory array, present only for `noninclusive_with_directory`.
    pub directory: Option<DirectoryParams>,
    /// Set-index hash.
    pub hash: HashFunction,
    /// Data access latency in cycles.
    pub access_latency: u64,
    /// Tag lookup latency in cycles.
    pub tag_latency: u64,
    /// Bank count; 0 disables bank arbitration.
    pub banks: u64,
    /// MSHR capacity.
    pub mshr_size: usize,
    /// MSHR lookup latency in cycles.
    pub mshr_latency: u64,
    /// Prefetch thresholds and delay.
    pub prefetch: PrefetchParams,
    /// Per-cycle event limit; `None` is unlimited.
    pub max_requests_per_cycle: Option<usize>,
    /// Every request bypasses the cache.
    pub force_noncacheable: bool,
    /// Smallest packet size in bytes.
    pub min_packet_size: u64,
    /// Slice membership.
    pub slices: SliceParams,
    /// Address region, when configured or derived from slicing. `None` means the
    /// region is taken from the memory-side link.
    pub region: Option<AddressRegion>,
    /// Deadlock watchdog.
    pub watchdog: WatchdogParams,
}

impl CacheConfig {
    /// Validates every parameter and derives the values a controller needs.
    ///
    /// Deprecated parameters produce a warning and are otherwise ignored.
    ///
    /// # Returns
    ///
    /// The derived `CacheParams`, or the first `ConfigError` encountered.
    pub fn validate(&self) -> Result<CacheParams, ConfigError> {
        let name = self.name.clone();
        let invalid = |param: &'static str, value: String, reason: &str| {
            ConfigError::InvalidParam {
                component: name.clone(),
                param,
                value,
                reason: reason.to_string(),
            }
        };
        let combo = |params: &'static str, reason: &str| ConfigError::InvalidCombo {
            component: name.clone(),
            params,
            reason: reason.to_string(),
        };
        let missing = |param: &'static str, what: &'static str| ConfigError::MissingParam {
            component: name.clone(),
            param,
            what,
        };

        for key in self.other.keys() {
            if DEPRECATED_PARAMS.contains(&key.as_str()) {
                tracing::warn!(
                    cache = %self.name,
                    param = %key,
                    "parameter is deprecated and will be ignored"
                );
            } else {
                tracing::warn!(cache = %self.name, param = %key, "unrecognized parameter");
            }
        }

        let protocol = match self.coherence_protocol.trim().to_ascii_lowercase().as_str() {
            "mesi" => CoherenceProtocol::Mesi,
            "msi" => CoherenceProtocol::Msi,
            "none" => CoherenceProtocol::None,
            _ => {
                return Err(invalid(
                    "coherence_protocol",
                    self.coherence_protocol.clone(),
                    "valid options are 'mesi', 'msi' or 'none'",
                ));
            }
        };

        let cache_type = match self.cache_type.trim().to_ascii_lowercase().as_str() {
            "inclusive" => CacheType::Inclusive,
            "noninclusive" => CacheType::Noninclusive,
            "noninclusive_with_directory" => CacheType::NoninclusiveWithDirectory,
            _ => {
                return Err(invalid(
                    "cache_type",
                    self.cache_type.clone(),
                    "valid options are 'inclusive', 'noninclusive' or 'noninclusive_with_directory'",
                ));
            }
        };

        let access_latency = self
            .access_latency_cycles
            .ok_or_else(|| missing("access_latency_cycles", "access time for cache"))?;
        if access_latency < 1 {
            return Err(invalid(
                "access_latency_cycles",
                access_latency.to_string(),
                "value must be at least 1",
            ));
        }
        let tag_latency = self.tag_access_latency_cycles.unwrap_or(access_latency);

        if self.l1 && cache_type != CacheType::Inclusive {
            return Err(combo(
                "L1, cache_type",
                "an L1 must be inclusive; set 'cache_type' to 'inclusive'",
            ));
        }
        if !self.l1 && protocol == CoherenceProtocol::None && cache_type != CacheType::Noninclusive
        {
            return Err(combo(
                "coherence_protocol, cache_type",
                "an incoherent non-L1 cache must be noninclusive; set 'cache_type' to 'noninclusive'",
            ));
        }

        let cache_size = self
            .cache_size
            .ok_or_else(|| missing("cache_size", "cache size with units, e.g. '32KiB'"))?
            .bytes();
        let associativity = self
            .associativity
            .ok_or_else(|| missing("associativity", "cache associativity"))?;
        let line_size = self.cache_line_size;
        if !line_size.is_power_of_two() {
            return Err(invalid(
                "cache_line_size",
                line_size.to_string(),
                "must be a power of 2",
            ));
        }
        if line_size > cache_size {
            return Err(combo(
                "cache_line_size, cache_size",
                "'cache_line_size' must be less than or equal to 'cache_size'",
            ));
        }
        let lines = cache_size / line_size;
        if associativity < 1 || associativity > lines {
            return Err(ConfigError::Associativity {
                param: "associativity",
                associativity,
                entries: lines,
            });
        }

        let replacement = ReplacementPolicy::from_name("replacement_policy", &self.replacement_policy)?;

        let directory = if cache_type == CacheType::NoninclusiveWithDirectory {
            let entries = self.noninclusive_directory_entries;
            let dir_assoc = self.noninclusive_directory_associativity;
            if dir_assoc < 1 || dir_assoc > entries {
                return Err(ConfigError::Associativity {
                    param: "noninclusive_directory_associativity",
                    associativity: dir_assoc,
                    entries,
                });
            }
            Some(DirectoryParams {
                entries,
                associativity: dir_assoc,
                replacement: ReplacementPolicy::from_name(
                    "noninclusive_directory_repl",
                    &self.noninclusive_directory_repl,
                )?,
            })
        } else {
            None
        };

        let hash = HashFunction::from_id(self.hash_function);

        let mshr_size = match self.mshr_num_entries {
            None | Some(-1) => defaults::HUGE_MSHR,
            Some(n) if n < 2 => return Err(ConfigError::MshrSize(n)),
            Some(n) => n as usize,
        };

        let mshr_latency = match self.mshr_latency_cycles {
            Some(latency) if latency > 0 => latency,
            _ => {
                let derived = mshr_lookup_latency(access_latency, self.l1)?;
                if derived != 1 && self.verbose > 0 {
                    tracing::info!(
                        cache = %self.name,
                        mshr_latency = derived,
                        "no MSHR lookup latency provided; derived from cache access latency"
                    );
                }
                derived
            }
        };

        let prefetch = PrefetchParams {
            max_outstanding: self
                .max_outstanding_prefetch
                .map_or(mshr_size / 2, |n| n as usize),
            drop_level: match self.drop_prefetch_mshr_level.map(|n| n as usize) {
                None if mshr_size == 2 => mshr_size - 1,
                None => mshr_size - 2,
                Some(level) if level >= mshr_size => mshr_size - 1,
                Some(level) => level,
            },
            delay: self.prefetch_delay_cycles,
        };

        let max_requests_per_cycle = usize::try_from(self.max_requests_per_cycle)
            .ok()
            .filter(|&n| n > 0);

        let min_packet_size = self.min_packet_size.bytes();

        let slice_count = self.num_cache_slices;
        let slice_id = match slice_count {
            0 => {
                return Err(invalid(
                    "num_cache_slices",
                    slice_count.to_string(),
                    "must be at least 1",
                ));
            }
            1 => 0,
            _ => {
                if self.slice_id >= slice_count {
                    return Err(invalid(
                        "slice_id",
                        self.slice_id.to_string(),
                        "must be less than 'num_cache_slices'",
                    ));
                }
                if !self.slice_allocation_policy.trim().eq_ignore_ascii_case("rr") {
                    return Err(invalid(
                        "slice_allocation_policy",
                        self.slice_allocation_policy.clone(),
                        "the only supported policy is 'rr' (round robin)",
                    ));
                }
                self.slice_id
            }
        };
        let slices = SliceParams {
            count: slice_count,
            id: slice_id,
        };

        let explicit = self.addr_range_start.is_some()
            || self.addr_range_end.is_some()
            || self.interleave_size.is_some()
            || self.interleave_step.is_some();
        let region = if explicit {
            let defaulted = AddressRegion::default();
            let region = AddressRegion {
                start: self.addr_range_start.unwrap_or(defaulted.start),
                end: self.addr_range_end.unwrap_or(defaulted.end),
                interleave_size: self.interleave_size.map_or(0, ByteSize::bytes),
                interleave_step: self.interleave_step.map_or(0, ByteSize::bytes),
            };
            if region.end < region.start {
                return Err(combo(
                    "addr_range_start, addr_range_end",
                    "region end must not precede its start",
                ));
            }
            if region.interleave_size > 0 && region.interleave_step < region.interleave_size {
                return Err(combo(
                    "interleave_size, interleave_step",
                    "'interleave_step' must be at least 'interleave_size'",
                ));
            }
            Some(region)
        } else if slice_count > 1 {
            Some(AddressRegion::round_robin_slice(slice_id, slice_count, line_size))
        } else {
            None
        };

        let log = LogContext::new(self.name.clone())
            .with_debug_addrs(self.debug_addr.iter().copied())
            .with_verbose(self.verbose);

        Ok(CacheParams {
            log,
            l1: self.l1,
            protocol,
            cache_type,
            protocol_kind: select_protocol(self.l1, protocol, cache_type),
            cache_size,
            line_size,
            lines,
            associativity,
            replacement,
            directory,
            hash,
            access_latency,
            tag_latency,
            banks: self.banks,
            mshr_size,
            mshr_latency,
            prefetch,
            max_requests_per_cycle,
            force_noncacheable: self.force_noncacheable_reqs,
            min_packet_size,
            slices,
            region,
            watchdog: WatchdogParams::new(self.max_request_delay),
        })
    }
}
