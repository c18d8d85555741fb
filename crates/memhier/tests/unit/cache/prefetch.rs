//! Prefetch Path Tests.
//!
//! Verifies delayed injection and the MSHR-based drop rules, both on the path
//! itself and end to end through a controller with listeners attached.

use memhier_core::{
    cache::{MshrTable, controller::prefetch::PrefetchPath},
    common::{Command, LogContext, MemEvent},
    config::PrefetchParams,
    prefetch::{AccessNotice, CacheListener, NextLinePrefetcher, PrefetchRequest},
};
use pretty_assertions::assert_eq;

use crate::common::{
    harness::{TestCache, config},
    mocks::listener::MockListener,
};

const PARAMS: PrefetchParams = PrefetchParams {
    max_outstanding: 2,
    drop_level: 3,
    delay: 4,
};

// ══════════════════════════════════════════════════════════
// 1. Path
// ══════════════════════════════════════════════════════════

#[test]
fn prefetch_released_after_delay_in_issue_order() {
    let mut path = PrefetchPath::new(PARAMS);
    path.schedule(MemEvent::new(1, Command::GetS, 0x40), 10);
    path.schedule(MemEvent::new(2, Command::GetS, 0x80), 11);
    assert_eq!(path.len(), 2);

    assert!(path.due(13).is_empty());
    let first: Vec<u64> = path.due(14).iter().map(|e| e.id).collect();
    assert_eq!(first, vec![1]);
    let second: Vec<u64> = path.due(20).iter().map(|e| e.id).collect();
    assert_eq!(second, vec![2]);
    assert!(path.is_empty());
}

#[test]
fn admission_thresholds() {
    let path = PrefetchPath::new(PARAMS);
    let mut mshr = MshrTable::new(8, 1, LogContext::new("l2")).unwrap();
    assert!(path.admits(&mshr, 0));
    assert!(path.admits(&mshr, 1));
    assert!(!path.admits(&mshr, 2), "queued prefetches count as outstanding");

    let _ = mshr.admit(0x0, MemEvent::new(1, Command::GetS, 0x0).prefetch(), 0);
    assert!(path.admits(&mshr, 0));
    assert!(!path.admits(&mshr, 1));

    let _ = mshr.admit(0x40, MemEvent::new(2, Command::GetS, 0x40), 0);
    let _ = mshr.admit(0x80, MemEvent::new(3, Command::GetS, 0x80), 0);
    assert_eq!(mshr.occupancy(), 3);
    assert!(!path.admits(&mshr, 0), "occupancy at the drop level");
}

// ══════════════════════════════════════════════════════════
// 2. Through the controller
// ══════════════════════════════════════════════════════════

/// A miss notifies the listener; its request is injected after the delay and sent
/// down as a prefetch.
#[test]
fn next_line_prefetch_issued_after_delay() {
    let mut cfg = config(4096, 4);
    cfg.prefetch_delay_cycles = 2;
    cfg.mshr_num_entries = Some(16);
    let listeners: Vec<Box<dyn CacheListener>> = vec![Box::new(NextLinePrefetcher::new(64))];
    let mut cache = TestCache::with_listeners(&cfg, listeners);

    let _ = cache.request(Command::GetS, 0x1000);
    cache.run(1);
    assert_eq!(cache.ctrl.pending_events(), 1);
    let demand = cache.respond();
    assert_eq!(demand.len(), 1);
    assert!(!demand[0].prefetch);

    cache.run(2);
    let sent = cache.respond();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].addr, 0x1040);
    assert!(sent[0].prefetch);
    assert_eq!(cache.ctrl.stats().prefetch_requests, 1);
    assert_eq!(cache.ctrl.stats().prefetch_drops, 0);

    cache.run(1);
    assert!(cache.ctrl.array().data().line(0x1040).is_some());
    assert!(
        cache.responses().iter().all(|e| e.addr != 0x1040),
        "prefetch fills are not answered upward"
    );
}

/// With the drop level at one entry, the open demand miss blocks the prefetch.
#[test]
fn prefetch_dropped_at_drop_level() {
    let mut cfg = config(4096, 4);
    cfg.mshr_num_entries = Some(4);
    cfg.drop_prefetch_mshr_level = Some(1);
    let listeners: Vec<Box<dyn CacheListener>> = vec![Box::new(NextLinePrefetcher::new(64))];
    let mut cache = TestCache::with_listeners(&cfg, listeners);

    let _ = cache.request(Command::GetS, 0x1000);
    cache.run(3);
    assert_eq!(cache.ctrl.stats().prefetch_drops, 1);
    assert_eq!(cache.ctrl.stats().prefetch_requests, 0);
    assert_eq!(cache.respond().len(), 1);
}

/// A prefetch for a line that already has an MSHR entry is dropped.
#[test]
fn prefetch_for_tracked_line_dropped() {
    let mut cfg = config(4096, 4);
    cfg.mshr_num_entries = Some(16);
    let mut listener = MockListener::new();
    let _ = listener
        .expect_notify()
        .withf(|notice: &AccessNotice| notice.addr == 0x2000)
        .times(1)
        .returning(|_| {
            Some(PrefetchRequest {
                addr: 0x2000,
                cmd: Command::GetS,
            })
        });
    let listeners: Vec<Box<dyn CacheListener>> = vec![Box::new(listener)];
    let mut cache = TestCache::with_listeners(&cfg, listeners);

    let _ = cache.request(Command::GetS, 0x2000);
    cache.run(2);
    assert_eq!(cache.ctrl.stats().prefetch_drops, 1);
    assert_eq!(cache.respond().len(), 1);
}

/// Listeners hear about demand hits and misses, not about other traffic.
#[test]
fn listener_notified_of_demand_accesses() {
    let mut listener = MockListener::new();
    let _ = listener
        .expect_notify()
        .withf(|n: &AccessNotice| n.cmd == Command::GetX && !n.hit && n.base_addr == 0x3000)
        .times(1)
        .returning(|_| None);
    let _ = listener
        .expect_notify()
        .withf(|n: &AccessNotice| n.cmd == Command::GetS && n.hit && n.addr == 0x3008)
        .times(1)
        .returning(|_| None);

    let listeners: Vec<Box<dyn CacheListener>> = vec![Box::new(listener)];
    let mut cache = TestCache::with_listeners(&config(4096, 4), listeners);
    cache.access(Command::GetX, 0x3000);
    cache.access(Command::GetS, 0x3008);
    cache.deliver(MemEvent::new(99, Command::PutS, 0x3000));
    cache.run(1);
    assert_eq!(cache.ctrl.stats().prefetch_requests, 0);
}
