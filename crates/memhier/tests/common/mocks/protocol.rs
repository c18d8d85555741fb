use std::{cell::RefCell, rc::Rc};

use memhier_core::{
    cache::{
        StateHandle,
        array::{ArrayTarget, CacheLine},
    },
    common::{Addr, Command, Cycle, MemEvent, Side},
    protocol::{Attachment, CoherenceProtocol, ProtocolOutcome, ProtocolView},
};

/// State installed by a fill.
pub const FILLED: StateHandle = StateHandle(1);

/// One call to `handle_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled {
    pub cmd: Command,
    pub addr: Addr,
    pub cycle: Cycle,
    pub prefetch: bool,
}

/// Everything the protocol saw, shared with the test.
#[derive(Debug, Default)]
pub struct ProtocolLog {
    pub attachment: Option<Attachment>,
    pub handled: Vec<Handled>,
    pub evictions: Vec<CacheLine>,
}

impl ProtocolLog {
    /// Commands and line addresses handled, in order.
    pub fn calls(&self) -> Vec<(Command, Addr)> {
        self.handled.iter().map(|h| (h.cmd, h.addr)).collect()
    }
}

/// A minimal fill protocol that records every call.
///
/// Demand requests hit when the line is resident and otherwise miss and are sent
/// down. Data responses install the line, answer the head request and complete it.
/// Forwarded invalidations drop the line and are acknowledged.
#[derive(Debug)]
pub struct RecordingProtocol {
    log: Rc<RefCell<ProtocolLog>>,
    latency: Cycle,
}

impl RecordingProtocol {
    pub fn new(latency: Cycle) -> (Self, Rc<RefCell<ProtocolLog>>) {
        let log = Rc::new(RefCell::new(ProtocolLog::default()));
        let protocol = Self {
            log: Rc::clone(&log),
            latency,
        };
        (protocol, log)
    }
}

impl CoherenceProtocol for RecordingProtocol {
    fn attach(&mut self, attachment: &Attachment) {
        self.log.borrow_mut().attachment = Some(attachment.clone());
    }

    fn handle_event(&mut self, event: &MemEvent, view: &ProtocolView<'_>) -> ProtocolOutcome {
        let addr = event.base_addr;
        self.log.borrow_mut().handled.push(Handled {
            cmd: event.cmd,
            addr,
            cycle: view.cycle,
            prefetch: event.prefetch,
        });

        match event.cmd {
            Command::GetS | Command::GetX | Command::GetSX => {
                if view.array.data().line(addr).is_some() {
                    let mut outcome = ProtocolOutcome::hit().touch(addr);
                    if let Some(resp) = event.cmd.response() {
                        outcome = outcome.send(Side::Up, event.make_response(resp), self.latency);
                    }
                    outcome
                } else {
                    ProtocolOutcome::miss().send(Side::Down, event.clone(), 0)
                }
            }
            Command::GetSResp | Command::GetXResp => {
                let mut outcome = ProtocolOutcome::handled().allocate(addr, FILLED).complete(addr);
                if let Some(head) = view.mshr.head(addr) {
                    if let (Some(resp), false) = (head.cmd.response(), head.prefetch) {
                        outcome = outcome.send(Side::Up, head.make_response(resp), self.latency);
                    }
                }
                outcome
            }
            Command::Inv => {
                let outcome = if view.array.data().line(addr).is_some() {
                    ProtocolOutcome::handled().invalidate(addr)
                } else {
                    ProtocolOutcome::handled()
                };
                outcome.send(Side::Down, event.make_response(Command::AckInv), 0)
            }
            _ => ProtocolOutcome::handled(),
        }
    }

    fn handle_eviction(
        &mut self,
        line: &CacheLine,
        _target: ArrayTarget,
        _view: &ProtocolView<'_>,
    ) -> ProtocolOutcome {
        self.log.borrow_mut().evictions.push(*line);
        ProtocolOutcome::handled()
    }
}
