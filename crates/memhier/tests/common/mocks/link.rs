use std::{cell::RefCell, rc::Rc};

use memhier_core::{
    cache::AddressRegion,
    common::{Cycle, MemEvent},
    link::MemLink,
};

/// What a `RecordingLink` observed, shared with the test.
#[derive(Debug, Default)]
pub struct LinkRecord {
    pub advertised: Option<AddressRegion>,
    pub sent: Vec<(Cycle, MemEvent)>,
    pub clocks: Vec<Cycle>,
}

/// A link whose peer advertises a fixed region and which records everything the
/// controller does with it.
#[derive(Debug)]
pub struct RecordingLink {
    name: &'static str,
    peer: AddressRegion,
    clocked: bool,
    record: Rc<RefCell<LinkRecord>>,
}

impl RecordingLink {
    pub fn new(name: &'static str, peer: AddressRegion) -> (Self, Rc<RefCell<LinkRecord>>) {
        let record = Rc::new(RefCell::new(LinkRecord::default()));
        let link = Self {
            name,
            peer,
            clocked: false,
            record: Rc::clone(&record),
        };
        (link, record)
    }

    #[must_use]
    pub const fn clocked(mut self) -> Self {
        self.clocked = true;
        self
    }
}

impl MemLink for RecordingLink {
    fn name(&self) -> &str {
        self.name
    }

    fn send(&mut self, event: MemEvent, at: Cycle) {
        self.record.borrow_mut().sent.push((at, event));
    }

    fn is_clocked(&self) -> bool {
        self.clocked
    }

    fn clock(&mut self, cycle: Cycle) {
        self.record.borrow_mut().clocks.push(cycle);
    }

    fn region(&self) -> AddressRegion {
        self.peer
    }

    fn set_region(&mut self, region: AddressRegion) {
        self.record.borrow_mut().advertised = Some(region);
    }
}
