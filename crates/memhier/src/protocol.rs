//! Coherence protocol delegate contract.
//!
//! The controller never interprets coherence states itself. For every event that
//! clears arbitration and admission it calls a `CoherenceProtocol`, handing it a
//! read-only view of the array and MSHR. The protocol answers with a
//! `ProtocolOutcome`:
//! 1. **Status:** `Hit`/`Handled` finish the operation this cycle; `Miss` leaves it
//!    open in the MSHR until the protocol completes it later.
//! 2. **Array actions:** Allocations, state changes, invalidations and touches, which
//!    the controller applies in order. Evictions caused by an allocation are handed
//!    back to the protocol through `handle_eviction`.
//! 3. **MSHR completions:** Line addresses whose head operation is finished.
//! 4. **Sends:** Events to put on the CPU-side or memory-side link after a delay.
//!
//! Which protocol implementation a cache needs is decided from its configuration by
//! `select_protocol`; the implementation itself is supplied by the caller.

use crate::{
    cache::{
        array::{ArrayTarget, CacheArray, CacheLine, StateHandle},
        mshr::MshrTable,
        region::AddressRegion,
    },
    common::{Addr, Cycle, MemEvent, Side},
    config::{CacheParams, CacheType, CoherenceProtocol as ProtocolFamily},
};

/// The protocol implementation a cache level requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    /// MESI, inclusive lower level.
    MesiInclusive,
    /// MESI, non-inclusive private lower level.
    MesiPrivateNoninclusive,
    /// MESI, non-inclusive shared lower level with a directory.
    MesiSharedNoninclusive,
    /// MESI first-level cache.
    MesiL1,
    /// Incoherent lower level.
    Incoherent,
    /// Incoherent first-level cache.
    IncoherentL1,
}

impl ProtocolKind {
    /// Short name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::MesiInclusive => "mesi_inclusive",
            Self::MesiPrivateNoninclusive => "mesi_private_noninclusive",
            Self::MesiSharedNoninclusive => "mesi_shared_noninclusive",
            Self::MesiL1 => "mesi_l1",
            Self::Incoherent => "incoherent",
            Self::IncoherentL1 => "incoherent_l1",
        }
    }
}

/// Chooses the protocol implementation for a cache level.
///
/// # Arguments
///
/// * `l1` - The cache is a first-level cache.
/// * `family` - Configured coherence protocol family.
/// * `cache_type` - Configured inclusion policy.
pub const fn select_protocol(l1: bool, family: ProtocolFamily, cache_type: CacheType) -> ProtocolKind {
    let coherent = !matches!(family, ProtocolFamily::None);
    match (l1, coherent) {
        (true, true) => ProtocolKind::MesiL1,
        (true, false) => ProtocolKind::IncoherentL1,
        (false, false) => ProtocolKind::Incoherent,
        (false, true) => match cache_type {
            CacheType::Inclusive => ProtocolKind::MesiInclusive,
            CacheType::Noninclusive => ProtocolKind::MesiPrivateNoninclusive,
            CacheType::NoninclusiveWithDirectory => ProtocolKind::MesiSharedNoninclusive,
        },
    }
}

/// Parameters handed to the protocol factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolParams {
    /// Implementation to build.
    pub kind: ProtocolKind,
    /// Data access latency in cycles.
    pub access_latency: u64,
    /// Tag lookup latency in cycles.
    pub tag_latency: u64,
    /// MSHR lookup latency in cycles.
    pub mshr_latency: u64,
    /// Line size in bytes.
    pub line_size: u64,
    /// MESI (true) or MSI/incoherent (false).
    pub mesi: bool,
    /// The cache is inclusive.
    pub inclusive: bool,
    /// A prefetcher is attached.
    pub prefetch: bool,
    /// Smallest packet size in bytes.
    pub min_packet_size: u64,
}

impl ProtocolParams {
    /// Extracts the protocol parameters from validated cache parameters.
    pub fn from_cache(params: &CacheParams, prefetch: bool) -> Self {
        Self {
            kind: params.protocol_kind,
            access_latency: params.access_latency,
            tag_latency: params.tag_latency,
            mshr_latency: params.mshr_latency,
            line_size: params.line_size,
            mesi: params.protocol == ProtocolFamily::Mesi,
            inclusive: params.cache_type == CacheType::Inclusive,
            prefetch,
            min_packet_size: params.min_packet_size,
        }
    }
}

/// What the protocol is told when it is attached to a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Name of the CPU-side link.
    pub up: String,
    /// Name of the memory-side link.
    pub down: String,
    /// Sets in the data array.
    pub sets: usize,
    /// Ways in the data array.
    pub ways: usize,
    /// MSHR capacity.
    pub mshr_capacity: usize,
    /// Region owned by the cache.
    pub region: AddressRegion,
}

/// Read-only state the protocol consults while deciding.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolView<'a> {
    /// Current cycle.
    pub cycle: Cycle,
    /// Tag storage.
    pub array: &'a CacheArray,
    /// Miss tracking.
    pub mshr: &'a MshrTable,
}

/// How an event was resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    /// Served from this cache.
    Hit,
    /// Needs data or permission from elsewhere; stays open in the MSHR.
    Miss,
    /// Fully handled without a hit/miss classification.
    #[default]
    Handled,
}

/// An array mutation requested by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayAction {
    /// Install a line with the given state, evicting if needed.
    Allocate {
        /// Array to install into.
        target: ArrayTarget,
        /// Any address in the line.
        addr: Addr,
        /// Initial state.
        state: StateHandle,
    },
    /// Change a resident line's state.
    SetState {
        /// Array holding the line.
        target: ArrayTarget,
        /// Any address in the line.
        addr: Addr,
        /// New state.
        state: StateHandle,
    },
    /// Remove a line.
    Invalidate {
        /// Array holding the line.
        target: ArrayTarget,
        /// Any address in the line.
        addr: Addr,
    },
    /// Record an access for replacement purposes.
    Touch {
        /// Array holding the line.
        target: ArrayTarget,
        /// Any address in the line.
        addr: Addr,
    },
}

impl ArrayAction {
    /// The array the action applies to.
    pub const fn target(&self) -> ArrayTarget {
        match *self {
            Self::Allocate { target, .. }
            | Self::SetState { target, .. }
            | Self::Invalidate { target, .. }
            | Self::Touch { target, .. } => target,
        }
    }
}

/// An event to send on a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// Link to send on.
    pub side: Side,
    /// The event.
    pub event: MemEvent,
    /// Cycles after the current one at which it is delivered.
    pub delay: Cycle,
}

/// The protocol's decision for one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolOutcome {
    /// Resolution of the event.
    pub status: Status,
    /// Array mutations, applied in order.
    pub actions: Vec<ArrayAction>,
    /// Line addresses whose MSHR head operation completed.
    pub completions: Vec<Addr>,
    /// Events to send.
    pub sends: Vec<Outgoing>,
}

impl ProtocolOutcome {
    /// An outcome with the given status and no side effects.
    pub const fn new(status: Status) -> Self {
        Self {
            status,
            actions: Vec::new(),
            completions: Vec::new(),
            sends: Vec::new(),
        }
    }

    /// A hit.
    pub const fn hit() -> Self {
        Self::new(Status::Hit)
    }

    /// A miss.
    pub const fn miss() -> Self {
        Self::new(Status::Miss)
    }

    /// A handled event.
    pub const fn handled() -> Self {
        Self::new(Status::Handled)
    }

    /// Adds a data-array allocation.
    #[must_use]
    pub fn allocate(self, addr: Addr, state: StateHandle) -> Self {
        self.action(ArrayAction::Allocate {
            target: ArrayTarget::Data,
            addr,
            state,
        })
    }

    /// Adds a data-array state change.
    #[must_use]
    pub fn set_state(self, addr: Addr, state: StateHandle) -> Self {
        self.action(ArrayAction::SetState {
            target: ArrayTarget::Data,
            addr,
            state,
        })
    }

    /// Adds a data-array invalidation.
    #[must_use]
    pub fn invalidate(self, addr: Addr) -> Self {
        self.action(ArrayAction::Invalidate {
            target: ArrayTarget::Data,
            addr,
        })
    }

    /// Adds a data-array touch.
    #[must_use]
    pub fn touch(self, addr: Addr) -> Self {
        self.action(ArrayAction::Touch {
            target: ArrayTarget::Data,
            addr,
        })
    }

    /// Adds an arbitrary array action.
    #[must_use]
    pub fn action(mut self, action: ArrayAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Completes the head MSHR operation of `addr`.
    #[must_use]
    pub fn complete(mut self, addr: Addr) -> Self {
        self.completions.push(addr);
        self
    }

    /// Sends `event` on `side` after `delay` cycles.
    #[must_use]
    pub fn send(mut self, side: Side, event: MemEvent, delay: Cycle) -> Self {
        self.sends.push(Outgoing { side, event, delay });
        self
    }
}

/// A coherence protocol implementation driven by a cache controller.
pub trait CoherenceProtocol {
    /// Called once when the controller is built.
    fn attach(&mut self, _attachment: &Attachment) {}

    /// Decides how to handle an event that cleared arbitration and admission.
    ///
    /// # Arguments
    ///
    /// * `event` - The event, with its line base address resolved.
    /// * `view` - Read-only array and MSHR state.
    fn handle_event(&mut self, event: &MemEvent, view: &ProtocolView<'_>) -> ProtocolOutcome;

    /// Reacts to a valid line being displaced by an allocation.
    fn handle_eviction(
        &mut self,
        _line: &CacheLine,
        _target: ArrayTarget,
        _view: &ProtocolView<'_>,
    ) -> ProtocolOutcome {
        ProtocolOutcome::handled()
    }
}

impl std::fmt::Debug for dyn CoherenceProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CoherenceProtocol")
    }
}
