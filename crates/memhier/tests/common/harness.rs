use std::{cell::RefCell, rc::Rc};

use memhier_core::{
    CacheConfig, CacheController, SimError,
    common::{Addr, Command, EventId, MemEvent},
    config::ByteSize,
    link::{BufferedLink, Outbox},
    prefetch::CacheListener,
    protocol::CoherenceProtocol,
};

use crate::common::mocks::protocol::{ProtocolLog, RecordingProtocol};

/// Cycles the recording protocol waits before answering upward.
pub const RESPONSE_LATENCY: u64 = 1;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A small valid configuration: `size` bytes, `ways`-way, 64-byte lines, access
/// latency 2.
pub fn config(size: u64, ways: u64) -> CacheConfig {
    CacheConfig {
        name: "l2".to_string(),
        cache_size: Some(ByteSize(size)),
        associativity: Some(ways),
        access_latency_cycles: Some(2),
        ..CacheConfig::default()
    }
}

/// A controller wired to buffered links and a recording protocol. The test plays
/// the memory below the cache.
pub struct TestCache {
    pub ctrl: CacheController,
    pub up: Outbox,
    pub down: Outbox,
    pub log: Rc<RefCell<ProtocolLog>>,
    next_id: EventId,
}

impl TestCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_listeners(config, Vec::new())
    }

    pub fn with_listeners(config: &CacheConfig, listeners: Vec<Box<dyn CacheListener>>) -> Self {
        init_tracing();
        let (protocol, log) = RecordingProtocol::new(RESPONSE_LATENCY);
        let (up_link, up) = BufferedLink::new("cpu");
        let (down_link, down) = BufferedLink::new("mem");
        let ctrl = CacheController::from_config(
            config,
            move |_| -> Box<dyn CoherenceProtocol> { Box::new(protocol) },
            Box::new(up_link),
            Box::new(down_link),
            listeners,
        )
        .expect("valid test configuration");
        Self {
            ctrl,
            up,
            down,
            log,
            next_id: 1,
        }
    }

    /// Delivers a demand request from above and returns its id.
    pub fn request(&mut self, cmd: Command, addr: Addr) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        self.ctrl.receive(MemEvent::new(id, cmd, addr));
        id
    }

    /// Delivers an arbitrary event.
    pub fn deliver(&mut self, event: MemEvent) {
        self.ctrl.receive(event);
    }

    pub fn tick(&mut self) -> Result<(), SimError> {
        self.ctrl.tick()
    }

    /// Ticks `n` times, failing the test on any error.
    pub fn run(&mut self, n: usize) {
        for _ in 0..n {
            self.ctrl.tick().expect("tick");
        }
    }

    /// Answers every request the cache has sent down so far, as memory would.
    ///
    /// # Returns
    ///
    /// The requests that were answered.
    pub fn respond(&mut self) -> Vec<MemEvent> {
        let sent = self.down.drain_ready(self.ctrl.cycle());
        for request in &sent {
            if let Some(resp) = request.cmd.response() {
                self.ctrl.receive(request.make_response(resp));
            }
        }
        sent
    }

    /// Drains the events sent up that are due by now.
    pub fn responses(&self) -> Vec<MemEvent> {
        self.up.drain_ready(self.ctrl.cycle())
    }

    /// Runs a single access to completion: request, tick, fill if needed, tick.
    pub fn access(&mut self, cmd: Command, addr: Addr) {
        let _ = self.request(cmd, addr);
        self.run(1);
        if !self.respond().is_empty() {
            self.run(1);
        }
        let _ = self.responses();
    }

    /// Commands and line addresses the protocol handled, in order.
    pub fn handled(&self) -> Vec<(Command, Addr)> {
        self.log.borrow().calls()
    }
}
