//! Cache controller.
//!
//! The controller owns one cache level's resources and advances them one clock
//! cycle at a time. Each `tick`:
//! 1. **Clock:** Advances the cycle counter, clocks clocked links, frees every bank
//!    and samples MSHR occupancy.
//! 2. **Prefetch injection:** Prefetches whose delay elapsed are dropped or queued
//!    as new arrivals according to the MSHR thresholds.
//! 3. **Drain:** Retries (bank losers, refused admissions, MSHR replays) and then new
//!    arrivals are handled in receive order, up to the per-cycle limit.
//! 4. **Per event:** Noncacheable events are forwarded to the opposite link. Others
//!    reserve their bank, are admitted to the MSHR (or join the entry for their line
//!    and wait), and are handed to the coherence protocol, whose outcome is applied.
//! 5. **Watchdog:** A transaction outstanding longer than the bound is a deadlock.
//!
//! Resource pressure never fails a tick; it only delays events. A deadlock is
//! reported once and halts the controller.

/// Delayed prefetch injection.
pub mod prefetch;

/// Deadlock watchdog.
pub mod watchdog;

use std::collections::VecDeque;

use self::{prefetch::PrefetchPath, watchdog::Watchdog};
use crate::{
    cache::{
        array::{ArrayTarget, CacheArray, CacheLine},
        bank::{BankArbiter, Reservation},
        mshr::{Admission, MshrTable},
        region::{AddressRegion, SliceMapper},
    },
    common::{
        Addr, CommandClass, ConfigError, Cycle, EventId, LogContext, MemEvent, Side, SimError,
        line_base,
    },
    config::{CacheConfig, CacheParams},
    link::MemLink,
    prefetch::{AccessNotice, CacheListener},
    protocol::{
        ArrayAction, Attachment, CoherenceProtocol, Outgoing, ProtocolOutcome, ProtocolParams,
        ProtocolView, Status,
    },
    stats::CacheStats,
};

/// First identifier used for controller-generated prefetch events.
const PREFETCH_ID_BASE: EventId = 1 << 63;

/// An event waiting to be handled.
#[derive(Debug, Clone)]
struct Pending {
    event: MemEvent,
    /// Already the head of its MSHR entry.
    replay: bool,
    /// Waited at least once before being handled.
    blocked: bool,
}

impl Pending {
    const fn arrival(event: MemEvent) -> Self {
        Self {
            event,
            replay: false,
            blocked: false,
        }
    }
}

/// One level of the cache hierarchy.
#[derive(Debug)]
pub struct CacheController {
    params: CacheParams,
    log: LogContext,
    cycle: Cycle,
    array: CacheArray,
    mshr: MshrTable,
    banks: BankArbiter<Pending>,
    slices: SliceMapper,
    protocol: Box<dyn CoherenceProtocol>,
    up: Box<dyn MemLink>,
    down: Box<dyn MemLink>,
    listeners: Vec<Box<dyn CacheListener>>,
    inbound: VecDeque<Pending>,
    retry: VecDeque<Pending>,
    prefetch: PrefetchPath,
    watchdog: Watchdog,
    stats: CacheStats,
    next_seq: u64,
    next_prefetch_id: EventId,
    halted: bool,
}

impl CacheController {
    /// Builds a controller from validated parameters.
    ///
    /// The address region is the configured or slice-derived one, pushed to both
    /// links; without one, it is read from the memory-side link and pushed to the
    /// CPU-side link.
    ///
    /// # Arguments
    ///
    /// * `params` - Validated parameters.
    /// * `build_protocol` - Factory for the coherence protocol selected by `params`.
    /// * `up` - CPU-side link.
    /// * `down` - Memory-side link.
    /// * `listeners` - Access listeners (prefetchers).
    pub fn new<F>(
        params: CacheParams,
        build_protocol: F,
        mut up: Box<dyn MemLink>,
        mut down: Box<dyn MemLink>,
        listeners: Vec<Box<dyn CacheListener>>,
    ) -> Result<Self, ConfigError>
    where
        F: FnOnce(&ProtocolParams) -> Box<dyn CoherenceProtocol>,
    {
        let log = params.log.clone();
        let mut array = CacheArray::from_params(&params)?;
        let mshr = MshrTable::new(params.mshr_size, params.mshr_latency, log.clone())?;

        let region = if let Some(region) = params.region {
            up.set_region(region);
            down.set_region(region);
            region
        } else {
            let region = down.region();
            up.set_region(region);
            region
        };
        array.set_slice_aware(region);
        array.set_banked(params.banks);

        let protocol_params = ProtocolParams::from_cache(&params, !listeners.is_empty());
        let mut protocol = build_protocol(&protocol_params);
        protocol.attach(&Attachment {
            up: up.name().to_string(),
            down: down.name().to_string(),
            sets: array.data().sets(),
            ways: array.data().ways(),
            mshr_capacity: mshr.capacity(),
            region,
        });

        tracing::debug!(
            cache = %log.component(),
            protocol = params.protocol_kind.name(),
            sets = array.data().sets(),
            ways = array.data().ways(),
            mshr = mshr.capacity(),
            mshr_latency = mshr.latency(),
            banks = params.banks,
            "cache controller configured"
        );

        Ok(Self {
            banks: BankArbiter::new(params.banks as usize),
            slices: SliceMapper::new(region),
            prefetch: PrefetchPath::new(params.prefetch),
            watchdog: Watchdog::new(params.watchdog),
            params,
            log,
            cycle: 0,
            array,
            mshr,
            protocol,
            up,
            down,
            listeners,
            inbound: VecDeque::new(),
            retry: VecDeque::new(),
            stats: CacheStats::default(),
            next_seq: 0,
            next_prefetch_id: PREFETCH_ID_BASE,
            halted: false,
        })
    }

    /// Validates `config` and builds a controller from it.
    pub fn from_config<F>(
        config: &CacheConfig,
        build_protocol: F,
        up: Box<dyn MemLink>,
        down: Box<dyn MemLink>,
        listeners: Vec<Box<dyn CacheListener>>,
    ) -> Result<Self, ConfigError>
    where
        F: FnOnce(&ProtocolParams) -> Box<dyn CoherenceProtocol>,
    {
        Self::new(config.validate()?, build_protocol, up, down, listeners)
    }

    /// Accepts an event from a link. It is handled on the next `tick`.
    pub fn receive(&mut self, mut event: MemEvent) {
        event.align(self.params.line_size);
        event.arrival = self.cycle;
        event.seq = self.next_seq;
        self.next_seq += 1;
        if self.params.force_noncacheable {
            event.noncacheable = true;
        }
        self.stats.record_receive(event.cmd);

        if event.src == Side::Up
            && !event.noncacheable
            && !self.slices.owns_address(event.base_addr)
        {
            tracing::warn!(
                cache = %self.log.component(),
                addr = format_args!("{:#x}", event.addr),
                "received a request for an address outside this cache's region"
            );
        }
        if self.log.tracks(event.base_addr) {
            tracing::debug!(
                cache = %self.log.component(),
                cycle = self.cycle,
                event = %event,
                "received"
            );
        }
        self.inbound.push_back(Pending::arrival(event));
    }

    /// Advances the controller by one cycle.
    ///
    /// # Returns
    ///
    /// `SimError::Deadlock` the cycle the watchdog fires, and `SimError::Halted` on
    /// every call after that.
    pub fn tick(&mut self) -> Result<(), SimError> {
        if self.halted {
            return Err(SimError::Halted(self.log.component().to_string()));
        }
        self.cycle += 1;
        let now = self.cycle;
        self.stats.cycles = now;

        if self.up.is_clocked() {
            self.up.clock(now);
        }
        if self.down.is_clocked() {
            self.down.clock(now);
        }
        self.banks.reset();
        self.stats.mshr_occupancy.add(self.mshr.occupancy() as u64);

        self.inject_prefetches(now);

        let limit = self.params.max_requests_per_cycle.unwrap_or(usize::MAX);
        let mut retry = std::mem::take(&mut self.retry);
        let mut handled = 0;
        while handled < limit {
            let Some(pending) = retry.pop_front().or_else(|| self.inbound.pop_front()) else {
                break;
            };
            handled += 1;
            self.process(pending, now);
        }

        // Unhandled retries keep their place; everything deferred this cycle joins
        // them and the queue is restored to receive order.
        retry.extend(std::mem::take(&mut self.retry));
        retry.extend(self.banks.take_deferred());
        retry.make_contiguous().sort_by_key(|p| p.event.seq);
        self.retry = retry;

        if let Some(stall) = self.watchdog.check(now, &self.mshr) {
            self.halted = true;
            let max_wait = self.watchdog.params().max_wait;
            tracing::error!(
                cache = %self.log.component(),
                addr = format_args!("{:#x}", stall.addr),
                waited = stall.waited,
                max_wait,
                cycle = now,
                "deadlock: MSHR transaction exceeded the maximum request delay"
            );
            return Err(SimError::Deadlock {
                component: self.log.component().to_string(),
                addr: stall.addr,
                waited: stall.waited,
                max_wait,
            });
        }
        Ok(())
    }

    /// Statistics collected so far.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// The address region this cache owns.
    pub const fn region(&self) -> &AddressRegion {
        self.slices.region()
    }

    /// Returns true if this cache owns `addr`.
    pub const fn owns_address(&self, addr: Addr) -> bool {
        self.slices.owns_address(addr)
    }

    /// The MSHR.
    pub const fn mshr(&self) -> &MshrTable {
        &self.mshr
    }

    /// The tag storage.
    pub const fn array(&self) -> &CacheArray {
        &self.array
    }

    /// Current cycle.
    pub const fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Validated parameters.
    pub const fn params(&self) -> &CacheParams {
        &self.params
    }

    /// Returns true once the watchdog has fired.
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Number of events received or deferred but not yet handled, including
    /// prefetches waiting for injection.
    pub fn pending_events(&self) -> usize {
        self.inbound.len() + self.retry.len() + self.banks.deferred_len() + self.prefetch.len()
    }

    /// Returns true if nothing is queued and no transaction is open.
    pub fn is_idle(&self) -> bool {
        self.pending_events() == 0 && self.mshr.is_empty()
    }

    fn inject_prefetches(&mut self, now: Cycle) {
        for event in self.prefetch.due(now) {
            let queued = self
                .inbound
                .iter()
                .chain(self.retry.iter())
                .filter(|p| p.event.prefetch && !p.replay)
                .count();
            let line = line_base(event.addr, self.params.line_size);
            if self.prefetch.admits(&self.mshr, queued) && !self.mshr.contains(line) {
                self.stats.prefetch_requests += 1;
                self.receive(event);
            } else {
                self.stats.prefetch_drops += 1;
                if self.log.tracks(line) {
                    tracing::debug!(
                        cache = %self.log.component(),
                        addr = format_args!("{line:#x}"),
                        occupancy = self.mshr.occupancy(),
                        outstanding = self.mshr.outstanding_prefetches() + queued,
                        "dropped prefetch"
                    );
                }
            }
        }
    }

    fn process(&mut self, mut pending: Pending, now: Cycle) {
        if pending.event.noncacheable {
            self.forward_noncacheable(pending.event, now);
            return;
        }

        let addr = pending.event.base_addr;
        let bank = self.array.bank(addr);
        if self.banks.reserve(bank) == Reservation::Conflict {
            self.stats.bank_conflicts += 1;
            tracing::trace!(
                cache = %self.log.component(),
                bank,
                addr = format_args!("{addr:#x}"),
                "bank conflict"
            );
            pending.blocked = true;
            self.banks.defer(bank, pending);
            return;
        }

        if !pending.replay {
            let event = &pending.event;
            let admission = match (event.class(), event.src) {
                (CommandClass::Response, _) => None,
                (CommandClass::ForwardRequest, _) | (_, Side::Down) => {
                    Some(self.mshr.admit_forward(addr, event.clone(), now))
                }
                (CommandClass::Request, Side::Up) => {
                    Some(self.mshr.admit(addr, event.clone(), now))
                }
            };
            match admission {
                Some(Admission::Rejected) => {
                    self.banks.release(bank);
                    self.stats.mshr_deferrals += 1;
                    if self.log.tracks(addr) {
                        tracing::debug!(
                            cache = %self.log.component(),
                            addr = format_args!("{addr:#x}"),
                            occupancy = self.mshr.occupancy(),
                            "MSHR full, deferring request"
                        );
                    }
                    pending.blocked = true;
                    self.retry.push_back(pending);
                    return;
                }
                Some(Admission::Joined { .. }) => return,
                Some(Admission::NewEntry) | None => {}
            }
        }

        self.dispatch(pending, now);
    }

    fn dispatch(&mut self, pending: Pending, now: Cycle) {
        let Pending {
            event,
            replay,
            blocked,
        } = pending;
        if replay {
            self.stats.total_events_replayed += 1;
        }

        let outcome = {
            let view = ProtocolView {
                cycle: now,
                array: &self.array,
                mshr: &self.mshr,
            };
            self.protocol.handle_event(&event, &view)
        };
        let status = outcome.status;

        if self.log.tracks(event.base_addr) {
            tracing::debug!(
                cache = %self.log.component(),
                cycle = now,
                event = %event,
                status = ?status,
                "handled"
            );
        }

        if event.cmd.is_data_request() {
            let waited = blocked || replay;
            match status {
                Status::Hit => self.stats.hits.record(event.cmd, waited),
                Status::Miss => self.stats.misses.record(event.cmd, waited),
                Status::Handled => {}
            }
        }

        self.apply(outcome, now);

        if status != Status::Miss
            && event.class() != CommandClass::Response
            && self
                .mshr
                .head(event.base_addr)
                .is_some_and(|head| head.seq == event.seq)
        {
            self.complete(event.base_addr, now);
        }

        if event.cmd.is_data_request() && status != Status::Handled {
            self.notify_listeners(&event, status == Status::Hit, now);
        }
    }

    fn apply(&mut self, outcome: ProtocolOutcome, now: Cycle) {
        let mut work = VecDeque::from([outcome]);
        while let Some(outcome) = work.pop_front() {
            for action in outcome.actions {
                if let Some((line, target)) = self.apply_action(action) {
                    let view = ProtocolView {
                        cycle: now,
                        array: &self.array,
                        mshr: &self.mshr,
                    };
                    work.push_back(self.protocol.handle_eviction(&line, target, &view));
                }
            }
            for addr in outcome.completions {
                self.complete(addr, now);
            }
            for Outgoing { side, event, delay } in outcome.sends {
                self.send(side, event, now + delay);
            }
        }
    }

    /// Applies one array action, returning the valid line it evicted, if any.
    fn apply_action(&mut self, action: ArrayAction) -> Option<(CacheLine, ArrayTarget)> {
        let target = action.target();
        let Some(array) = self.array.get_mut(target) else {
            tracing::warn!(
                cache = %self.log.component(),
                ?action,
                "array action targets a directory this cache does not have"
            );
            return None;
        };
        match action {
            ArrayAction::Allocate { addr, state, .. } => array
                .allocate(addr, state)
                .evicted
                .filter(|line| line.valid)
                .map(|line| (line, target)),
            ArrayAction::SetState { addr, state, .. } => {
                if !array.set_state(addr, state) {
                    tracing::warn!(
                        cache = %self.log.component(),
                        addr = format_args!("{addr:#x}"),
                        "state change for a line that is not resident"
                    );
                }
                None
            }
            ArrayAction::Invalidate { addr, .. } => {
                let _ = array.invalidate(addr);
                None
            }
            ArrayAction::Touch { addr, .. } => {
                let _ = array.touch(addr);
                None
            }
        }
    }

    /// Completes the head operation of `addr` and schedules the next one for replay
    /// on the following cycle.
    fn complete(&mut self, addr: Addr, now: Cycle) {
        let addr = line_base(addr, self.params.line_size);
        if self.mshr.complete(addr, now).is_none() {
            tracing::warn!(
                cache = %self.log.component(),
                addr = format_args!("{addr:#x}"),
                "completion for a line with no MSHR entry"
            );
            return;
        }
        if let Some(next) = self.mshr.head(addr) {
            self.retry.push_back(Pending {
                event: next.clone(),
                replay: true,
                blocked: true,
            });
        }
    }

    fn send(&mut self, side: Side, event: MemEvent, at: Cycle) {
        match side {
            Side::Up => self.up.send(event, at),
            Side::Down => self.down.send(event, at),
        }
    }

    fn forward_noncacheable(&mut self, event: MemEvent, now: Cycle) {
        self.stats.noncacheable_events += 1;
        let side = event.src.opposite();
        self.send(side, event, now);
    }

    fn notify_listeners(&mut self, event: &MemEvent, hit: bool, now: Cycle) {
        let notice = AccessNotice {
            addr: event.addr,
            base_addr: event.base_addr,
            cmd: event.cmd,
            hit,
            prefetch: event.prefetch,
            cycle: now,
        };
        for listener in &mut self.listeners {
            if let Some(request) = listener.notify(&notice) {
                let id = self.next_prefetch_id;
                self.next_prefetch_id += 1;
                self.prefetch
                    .schedule(MemEvent::new(id, request.cmd, request.addr).prefetch(), now);
            }
        }
    }
}
