//! Set-associative tag arrays.
//!
//! This module provides the fixed-capacity line storage of a cache level. It provides:
//! 1. **Line entries:** A tag (the line base address), an opaque coherence-state handle
//!    owned by the protocol, and a validity bit.
//! 2. **`TagArray`:** Sets of `ways` entries. Lookup hashes the region-relative line
//!    address to a set and scans it; allocation fills a free way or evicts the victim
//!    chosen by the array's replacement policy.
//! 3. **`CacheArray`:** Either a single data array or a data array paired with an
//!    independently sized coherence directory, each with its own policy.
//!
//! The controller is the only writer; the protocol reads the array through a shared
//! reference and requests changes as actions.

use crate::{
    cache::{
        hash::{SetHash, SetIndexHash},
        policies::{Replacement, ReplacementPolicy},
        region::AddressRegion,
    },
    common::{Addr, ConfigError, line_base},
    config::{CacheParams, HashFunction, ReplacementPolicy as PolicyType},
};

/// Opaque coherence state attached to a line; meaningful only to the protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StateHandle(pub u32);

impl StateHandle {
    /// The state of an empty way.
    pub const INVALID: Self = Self(0);
}

/// One way of an associative set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// Line base address (the tag).
    pub addr: Addr,
    /// Coherence state handle.
    pub state: StateHandle,
    /// The way holds a line.
    pub valid: bool,
}

/// Result of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// Set the address maps to.
    pub set: usize,
    /// Way holding the line, if present.
    pub way: Option<usize>,
}

impl Lookup {
    /// Returns true if the line is present.
    #[inline]
    pub const fn is_hit(&self) -> bool {
        self.way.is_some()
    }
}

/// Result of installing a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Set the line was installed in.
    pub set: usize,
    /// Way the line was installed in.
    pub way: usize,
    /// The valid line displaced to make room, if any.
    pub evicted: Option<CacheLine>,
}

/// A set-associative array of line tags.
#[derive(Debug, Clone)]
pub struct TagArray {
    lines: Vec<CacheLine>,
    sets: usize,
    ways: usize,
    line_size: u64,
    line_shift: u32,
    policy: Replacement,
    hash: SetHash,
    region: AddressRegion,
    banks: u64,
}

impl TagArray {
    /// Creates an empty array.
    ///
    /// # Arguments
    ///
    /// * `param` - Name of the associativity parameter, used in errors.
    /// * `entries` - Total number of lines.
    /// * `ways` - Associativity.
    /// * `line_size` - Line size in bytes (a power of two).
    /// * `policy` - Replacement policy.
    /// * `hash` - Set-index hash.
    ///
    /// # Returns
    ///
    /// The array, or `ConfigError::Associativity` if `ways` is 0 or exceeds `entries`.
    pub fn new(
        param: &'static str,
        entries: u64,
        ways: u64,
        line_size: u64,
        policy: PolicyType,
        hash: HashFunction,
    ) -> Result<Self, ConfigError> {
        if ways < 1 || ways > entries {
            return Err(ConfigError::Associativity {
                param,
                associativity: ways,
                entries,
            });
        }
        let sets = (entries / ways) as usize;
        let ways = ways as usize;
        Ok(Self {
            lines: vec![CacheLine::default(); sets * ways],
            sets,
            ways,
            line_size,
            line_shift: line_size.trailing_zeros(),
            policy: Replacement::new(policy, sets, ways),
            hash: SetHash::new(hash),
            region: AddressRegion::default(),
            banks: 0,
        })
    }

    /// Makes set indexing relative to `region`, so an interleaved slice uses all of
    /// its sets.
    pub const fn set_slice_aware(&mut self, region: AddressRegion) {
        self.region = region;
    }

    /// Sets the number of banks lines are distributed over.
    pub const fn set_banked(&mut self, banks: u64) {
        self.banks = banks;
    }

    /// Number of sets.
    pub const fn sets(&self) -> usize {
        self.sets
    }

    /// Associativity.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Line size in bytes.
    pub const fn line_size(&self) -> u64 {
        self.line_size
    }

    /// Total number of lines.
    pub const fn capacity(&self) -> usize {
        self.lines.len()
    }

    /// The replacement policy in use.
    pub const fn policy(&self) -> &Replacement {
        &self.policy
    }

    /// Line base address of `addr`.
    #[inline]
    pub const fn base_addr(&self, addr: Addr) -> Addr {
        line_base(addr, self.line_size)
    }

    /// Region-relative line number of `addr`.
    #[inline]
    fn local_line(&self, addr: Addr) -> u64 {
        self.region.to_local(addr) >> self.line_shift
    }

    /// Set index of `addr`.
    pub fn set_index(&self, addr: Addr) -> usize {
        (self.hash.hash(self.local_line(addr)) % self.sets as u64) as usize
    }

    /// Bank of `addr`; always 0 when the array is not banked.
    pub fn bank(&self, addr: Addr) -> usize {
        if self.banks == 0 {
            0
        } else {
            (self.local_line(addr) % self.banks) as usize
        }
    }

    /// Finds the set of `addr` and the way holding it, if any.
    pub fn lookup(&self, addr: Addr) -> Lookup {
        let tag = self.base_addr(addr);
        let set = self.set_index(addr);
        let base = set * self.ways;
        let way = self.lines[base..base + self.ways]
            .iter()
            .position(|line| line.valid && line.addr == tag);
        Lookup { set, way }
    }

    /// Returns the line holding `addr`, if present.
    pub fn line(&self, addr: Addr) -> Option<&CacheLine> {
        let found = self.lookup(addr);
        found.way.map(|way| self.entry(found.set, way))
    }

    /// Returns the entry at `set`/`way`.
    ///
    /// # Panics
    ///
    /// Panics if `set` or `way` is out of range.
    pub fn entry(&self, set: usize, way: usize) -> &CacheLine {
        &self.lines[set * self.ways + way]
    }

    /// Iterates over the entries of one set.
    pub fn set_entries(&self, set: usize) -> &[CacheLine] {
        let base = set * self.ways;
        &self.lines[base..base + self.ways]
    }

    /// Number of valid lines.
    pub fn valid_lines(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }

    /// Records an access to `addr` with the replacement policy.
    ///
    /// # Returns
    ///
    /// The way touched, or `None` if the line is absent.
    pub fn touch(&mut self, addr: Addr) -> Option<usize> {
        let found = self.lookup(addr);
        let way = found.way?;
        self.policy.touch(found.set, way);
        Some(way)
    }

    /// Installs the line holding `addr` with the given state.
    ///
    /// A line already present keeps its way and only takes the new state. Otherwise a
    /// free way is used if one exists; if not, the policy's victim is evicted.
    pub fn allocate(&mut self, addr: Addr, state: StateHandle) -> Allocation {
        let tag = self.base_addr(addr);
        let found = self.lookup(addr);
        let set = found.set;
        if let Some(way) = found.way {
            self.lines[set * self.ways + way].state = state;
            self.policy.touch(set, way);
            return Allocation {
                set,
                way,
                evicted: None,
            };
        }

        let base = set * self.ways;
        let (way, evicted) = match self.lines[base..base + self.ways]
            .iter()
            .position(|line| !line.valid)
        {
            Some(free) => (free, None),
            None => {
                let victim = self.policy.select_victim(set);
                (victim, Some(self.lines[base + victim]))
            }
        };

        self.lines[base + way] = CacheLine {
            addr: tag,
            state,
            valid: true,
        };
        self.policy.reset_way(set, way);
        self.policy.touch(set, way);
        Allocation { set, way, evicted }
    }

    /// Changes the state of a resident line.
    ///
    /// # Returns
    ///
    /// `false` if the line is absent.
    pub fn set_state(&mut self, addr: Addr, state: StateHandle) -> bool {
        let found = self.lookup(addr);
        found.way.is_some_and(|way| {
            self.lines[found.set * self.ways + way].state = state;
            true
        })
    }

    /// Removes the line holding `addr`, freeing its way.
    ///
    /// # Returns
    ///
    /// The removed line, or `None` if it was absent.
    pub fn invalidate(&mut self, addr: Addr) -> Option<CacheLine> {
        let found = self.lookup(addr);
        let way = found.way?;
        let slot = &mut self.lines[found.set * self.ways + way];
        let removed = *slot;
        *slot = CacheLine::default();
        Some(removed)
    }
}

/// Which array of a `CacheArray` an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayTarget {
    /// The data array.
    Data,
    /// The coherence directory (directory mode only).
    Directory,
}

/// The tag storage of one cache level.
#[derive(Debug, Clone)]
pub enum CacheArray {
    /// A single data array.
    Single(TagArray),
    /// A data array plus a separately sized coherence directory.
    Dual {
        /// Data array.
        data: TagArray,
        /// Directory array.
        directory: TagArray,
    },
}

impl CacheArray {
    /// Builds the array(s) described by validated parameters.
    pub fn from_params(params: &CacheParams) -> Result<Self, ConfigError> {
        let data = TagArray::new(
            "associativity",
            params.lines,
            params.associativity,
            params.line_size,
            params.replacement,
            params.hash,
        )?;
        let Some(dir) = params.directory else {
            return Ok(Self::Single(data));
        };
        let directory = TagArray::new(
            "noninclusive_directory_associativity",
            dir.entries,
            dir.associativity,
            params.line_size,
            dir.replacement,
            params.hash,
        )?;
        Ok(Self::Dual { data, directory })
    }

    /// The data array.
    pub const fn data(&self) -> &TagArray {
        match self {
            Self::Single(data) | Self::Dual { data, .. } => data,
        }
    }

    /// The data array, mutably.
    pub const fn data_mut(&mut self) -> &mut TagArray {
        match self {
            Self::Single(data) | Self::Dual { data, .. } => data,
        }
    }

    /// The directory array, if this is a dual array.
    pub const fn directory(&self) -> Option<&TagArray> {
        match self {
            Self::Single(_) => None,
            Self::Dual { directory, .. } => Some(directory),
        }
    }

    /// The array addressed by `target`.
    pub const fn get(&self, target: ArrayTarget) -> Option<&TagArray> {
        match target {
            ArrayTarget::Data => Some(self.data()),
            ArrayTarget::Directory => self.directory(),
        }
    }

    /// The array addressed by `target`, mutably.
    pub const fn get_mut(&mut self, target: ArrayTarget) -> Option<&mut TagArray> {
        match (self, target) {
            (Self::Single(data) | Self::Dual { data, .. }, ArrayTarget::Data) => Some(data),
            (Self::Dual { directory, .. }, ArrayTarget::Directory) => Some(directory),
            (Self::Single(_), ArrayTarget::Directory) => None,
        }
    }

    /// Looks `addr` up in the data array.
    pub fn lookup(&self, addr: Addr) -> Lookup {
        self.data().lookup(addr)
    }

    /// Bank of `addr`.
    pub fn bank(&self, addr: Addr) -> usize {
        self.data().bank(addr)
    }

    /// Makes both arrays index sets relative to `region`.
    pub const fn set_slice_aware(&mut self, region: AddressRegion) {
        match self {
            Self::Single(data) => data.set_slice_aware(region),
            Self::Dual { data, directory } => {
                data.set_slice_aware(region);
                directory.set_slice_aware(region);
            }
        }
    }

    /// Distributes data lines over `banks` banks.
    pub const fn set_banked(&mut self, banks: u64) {
        self.data_mut().set_banked(banks);
    }
}
