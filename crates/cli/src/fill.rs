//! Reference fill model.
//!
//! A minimal write-back protocol and a fixed-latency memory, enough to drive a cache
//! level from a trace without a full coherence implementation:
//! - Demand requests hit if the line is resident; otherwise they miss and the request
//!   is forwarded to memory.
//! - A memory response installs the line (dirty for writes), answers the request at
//!   the head of the MSHR entry and completes it.
//! - Writebacks from above mark the line dirty; invalidations drop it.
//! - Evicting a dirty line writes it back to memory.

use std::collections::VecDeque;

use memhier_core::{
    cache::{
        StateHandle,
        array::{ArrayTarget, CacheLine},
    },
    common::{Command, CommandClass, Cycle, MemEvent, Side},
    protocol::{CoherenceProtocol, ProtocolOutcome, ProtocolParams, ProtocolView},
};

/// Line is clean.
const CLEAN: StateHandle = StateHandle(1);
/// Line is dirty.
const DIRTY: StateHandle = StateHandle(2);

/// Write-back fill protocol.
#[derive(Debug, Clone)]
pub struct FillProtocol {
    access_latency: Cycle,
    tag_latency: Cycle,
    writebacks: u64,
}

impl FillProtocol {
    /// Creates the protocol with the cache's latencies.
    pub const fn new(params: &ProtocolParams) -> Self {
        Self {
            access_latency: params.access_latency,
            tag_latency: params.tag_latency,
            writebacks: 0,
        }
    }

    const fn fill_state(cmd: Command) -> StateHandle {
        match cmd {
            Command::GetX | Command::GetSX | Command::Put => DIRTY,
            _ => CLEAN,
        }
    }
}

impl CoherenceProtocol for FillProtocol {
    fn handle_event(&mut self, event: &MemEvent, view: &ProtocolView<'_>) -> ProtocolOutcome {
        let addr = event.base_addr;
        let resident = view.array.data().line(addr).is_some();
        match event.cmd {
            Command::GetS | Command::GetX | Command::GetSX | Command::Get | Command::Put => {
                let reply = event
                    .cmd
                    .response()
                    .map(|cmd| event.make_response(cmd));
                if resident {
                    let mut outcome = ProtocolOutcome::hit().touch(addr);
                    if Self::fill_state(event.cmd) == DIRTY {
                        outcome = outcome.set_state(addr, DIRTY);
                    }
                    match reply {
                        Some(reply) => outcome.send(Side::Up, reply, self.access_latency),
                        None => outcome,
                    }
                } else {
                    ProtocolOutcome::miss().send(Side::Down, event.clone(), self.tag_latency)
                }
            }
            Command::GetSResp | Command::GetXResp => {
                let Some(request) = view.mshr.head(addr) else {
                    tracing::warn!(addr = format_args!("{addr:#x}"), "response with no request");
                    return ProtocolOutcome::handled();
                };
                let mut outcome = ProtocolOutcome::handled()
                    .allocate(addr, Self::fill_state(request.cmd))
                    .complete(addr);
                if let Some(cmd) = request.cmd.response() {
                    if !request.prefetch {
                        outcome = outcome.send(
                            Side::Up,
                            request.make_response(cmd),
                            self.access_latency,
                        );
                    }
                }
                outcome
            }
            Command::PutS | Command::PutE | Command::PutM => {
                let mut outcome = ProtocolOutcome::handled();
                if event.cmd == Command::PutM && resident {
                    outcome = outcome.set_state(addr, DIRTY);
                }
                outcome.send(
                    Side::Up,
                    event.make_response(Command::AckPut),
                    self.access_latency,
                )
            }
            Command::Inv | Command::ForceInv | Command::FetchInv | Command::FlushLineInv => {
                let outcome = if resident {
                    ProtocolOutcome::handled().invalidate(addr)
                } else {
                    ProtocolOutcome::handled()
                };
                match event.cmd.response() {
                    Some(cmd) => outcome.send(
                        event.src,
                        event.make_response(cmd),
                        self.tag_latency,
                    ),
                    None => outcome,
                }
            }
            cmd if cmd.class() != CommandClass::Response => match cmd.response() {
                Some(resp) => ProtocolOutcome::handled().send(
                    event.src,
                    event.make_response(resp),
                    self.tag_latency,
                ),
                None => ProtocolOutcome::handled(),
            },
            _ => ProtocolOutcome::handled(),
        }
    }

    fn handle_eviction(
        &mut self,
        line: &CacheLine,
        _target: ArrayTarget,
        _view: &ProtocolView<'_>,
    ) -> ProtocolOutcome {
        if line.state != DIRTY {
            return ProtocolOutcome::handled();
        }
        self.writebacks += 1;
        let writeback = MemEvent::new(u64::MAX - self.writebacks, Command::PutM, line.addr);
        ProtocolOutcome::handled().send(Side::Down, writeback, self.access_latency)
    }
}

/// A memory that answers every request after a fixed latency.
#[derive(Debug, Clone)]
pub struct FixedLatencyMemory {
    latency: Cycle,
    in_flight: VecDeque<(Cycle, MemEvent)>,
    reads: u64,
    writes: u64,
}

impl FixedLatencyMemory {
    /// Creates an idle memory.
    pub const fn new(latency: Cycle) -> Self {
        Self {
            latency,
            in_flight: VecDeque::new(),
            reads: 0,
            writes: 0,
        }
    }

    /// Accepts an event sent by the cache at cycle `now`.
    pub fn accept(&mut self, event: &MemEvent, now: Cycle) {
        match event.cmd {
            Command::PutM | Command::PutS | Command::PutE => self.writes += 1,
            cmd if cmd.class() == CommandClass::Request => {
                self.reads += 1;
                if let Some(resp) = cmd.response() {
                    let response = event.make_response(resp);
                    self.in_flight.push_back((now + self.latency, response));
                }
            }
            _ => {}
        }
    }

    /// Removes the responses due at or before `cycle`.
    pub fn due(&mut self, cycle: Cycle) -> Vec<MemEvent> {
        let mut ready = Vec::new();
        while self.in_flight.front().is_some_and(|(at, _)| *at <= cycle) {
            if let Some((_, event)) = self.in_flight.pop_front() {
                ready.push(event);
            }
        }
        ready
    }

    /// Returns true if no response is outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Read requests served.
    pub const fn reads(&self) -> u64 {
        self.reads
    }

    /// Writebacks absorbed.
    pub const fn writes(&self) -> u64 {
        self.writes
    }
}
