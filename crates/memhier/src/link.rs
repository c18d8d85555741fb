//! Memory links.
//!
//! A link connects the controller to its neighbours: one toward the processor and
//! one toward memory. The controller pushes events onto links; delivery of incoming
//! events is the owner's job (it calls `CacheController::receive`). Links also carry
//! the address region of the caches behind them.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::{
    cache::region::AddressRegion,
    common::{Cycle, MemEvent},
};

/// A port the controller sends events through.
pub trait MemLink {
    /// Name of the link, for logs.
    fn name(&self) -> &str;

    /// Queues `event` for delivery at cycle `at`.
    fn send(&mut self, event: MemEvent, at: Cycle);

    /// Returns true if the link needs to be clocked by the controller.
    fn is_clocked(&self) -> bool {
        false
    }

    /// Advances a clocked link to `cycle`.
    fn clock(&mut self, _cycle: Cycle) {}

    /// Address region advertised by the other end of the link.
    fn region(&self) -> AddressRegion {
        AddressRegion::default()
    }

    /// Advertises this cache's region to the other end of the link.
    fn set_region(&mut self, region: AddressRegion);
}

impl std::fmt::Debug for dyn MemLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemLink({})", self.name())
    }
}

/// Events sent on a `BufferedLink`, shared with whoever drains them.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: Rc<RefCell<VecDeque<(Cycle, MemEvent)>>>,
}

impl Outbox {
    /// Removes and returns every event due at or before `now`, in send order.
    pub fn drain_ready(&self, now: Cycle) -> Vec<MemEvent> {
        let mut queue = self.queue.borrow_mut();
        let mut ready = Vec::new();
        let mut pending = VecDeque::with_capacity(queue.len());
        while let Some((at, event)) = queue.pop_front() {
            if at <= now {
                ready.push(event);
            } else {
                pending.push_back((at, event));
            }
        }
        *queue = pending;
        ready
    }

    /// Removes and returns every queued event regardless of delivery time.
    pub fn drain_all(&self) -> Vec<(Cycle, MemEvent)> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

/// An in-memory link that records sent events in an `Outbox`.
#[derive(Debug)]
pub struct BufferedLink {
    name: String,
    outbox: Outbox,
    peer_region: AddressRegion,
    advertised: Option<AddressRegion>,
    clocked: bool,
    last_clock: Cycle,
}

impl BufferedLink {
    /// Creates an unclocked link advertising the whole address space.
    ///
    /// # Returns
    ///
    /// The link and a handle to its outbox.
    pub fn new(name: impl Into<String>) -> (Self, Outbox) {
        let outbox = Outbox::default();
        let link = Self {
            name: name.into(),
            outbox: outbox.clone(),
            peer_region: AddressRegion::default(),
            advertised: None,
            clocked: false,
            last_clock: 0,
        };
        (link, outbox)
    }

    /// Sets the region advertised by the peer.
    #[must_use]
    pub const fn with_peer_region(mut self, region: AddressRegion) -> Self {
        self.peer_region = region;
        self
    }

    /// Makes the link request a clock from the controller.
    #[must_use]
    pub const fn clocked(mut self) -> Self {
        self.clocked = true;
        self
    }

    /// Region this cache advertised on the link.
    pub const fn advertised(&self) -> Option<AddressRegion> {
        self.advertised
    }

    /// Last cycle the link was clocked at.
    pub const fn last_clock(&self) -> Cycle {
        self.last_clock
    }
}

impl MemLink for BufferedLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, event: MemEvent, at: Cycle) {
        self.outbox.queue.borrow_mut().push_back((at, event));
    }

    fn is_clocked(&self) -> bool {
        self.clocked
    }

    fn clock(&mut self, cycle: Cycle) {
        self.last_clock = cycle;
    }

    fn region(&self) -> AddressRegion {
        self.peer_region
    }

    fn set_region(&mut self, region: AddressRegion) {
        self.advertised = Some(region);
    }
}
