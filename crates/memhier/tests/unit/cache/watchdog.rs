//! Deadlock Watchdog Tests.
//!
//! Verifies the check interval derivation, that a stall is only reported once the
//! bound is exceeded, and that the controller reports a deadlock exactly once and
//! then refuses to advance.

use memhier_core::{
    SimError,
    cache::{MshrTable, controller::watchdog::Watchdog},
    common::{Command, LogContext, MemEvent},
    config::WatchdogParams,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{TestCache, config};

#[rstest]
#[case(0, 0)]
#[case(3, 3)]
#[case(4, 1)]
#[case(10, 2)]
#[case(1000, 250)]
fn check_interval_is_a_quarter_of_the_bound(#[case] max: u64, #[case] interval: u64) {
    let params = WatchdogParams::new(max);
    assert_eq!(params.check_interval, interval);
    assert_eq!(params.enabled(), max > 0);
}

#[test]
fn disabled_watchdog_never_fires() {
    let mut mshr = MshrTable::new(4, 1, LogContext::new("l2")).unwrap();
    let _ = mshr.admit(0x0, MemEvent::new(1, Command::GetS, 0x0), 0);
    let mut watchdog = Watchdog::new(WatchdogParams::new(0));
    for now in 0..10_000 {
        assert_eq!(watchdog.check(now, &mshr), None);
    }
}

#[test]
fn stall_reported_only_past_the_bound() {
    let mut mshr = MshrTable::new(4, 1, LogContext::new("l2")).unwrap();
    let _ = mshr.admit(0x40, MemEvent::new(1, Command::GetS, 0x40), 0);
    let mut watchdog = Watchdog::new(WatchdogParams::new(8));
    assert_eq!(watchdog.next_check(), 2);

    assert_eq!(watchdog.check(1, &mshr), None);
    assert_eq!(watchdog.check(8, &mshr), None);
    assert_eq!(watchdog.next_check(), 10);
    let stall = watchdog.check(10, &mshr).unwrap();
    assert_eq!((stall.addr, stall.waited), (0x40, 10));
}

/// Completing the head of a line does not restart its entry's clock while later
/// operations are still queued.
#[test]
fn queue_progress_does_not_reset_the_age() {
    let mut mshr = MshrTable::new(4, 1, LogContext::new("l2")).unwrap();
    let _ = mshr.admit(0x40, MemEvent::new(1, Command::GetS, 0x40), 0);
    let _ = mshr.admit(0x40, MemEvent::new(2, Command::GetX, 0x40), 0);
    let _ = mshr.complete(0x40, 9);
    let mut watchdog = Watchdog::new(WatchdogParams::new(10));

    let fired = (1..=20).find_map(|now| watchdog.check(now, &mshr).map(|stall| (now, stall)));
    let (now, stall) = fired.unwrap();
    assert_eq!(now, 12);
    assert_eq!((stall.addr, stall.waited), (0x40, 12));
}

#[test]
fn empty_mshr_is_never_a_stall() {
    let mshr = MshrTable::new(4, 1, LogContext::new("l2")).unwrap();
    let mut watchdog = Watchdog::new(WatchdogParams::new(1));
    for now in 0..100 {
        assert_eq!(watchdog.check(now, &mshr), None);
    }
}

/// A miss that memory never answers deadlocks the cache once; after that every
/// tick reports the halt.
#[test]
fn controller_reports_deadlock_once_then_halts() {
    let mut cfg = config(4096, 4);
    cfg.max_request_delay = 10;
    let mut cache = TestCache::new(&cfg);
    let _ = cache.request(Command::GetS, 0x1000);

    let mut deadlocks = Vec::new();
    for _ in 0..100 {
        match cache.tick() {
            Ok(()) => {}
            Err(err @ SimError::Deadlock { .. }) => deadlocks.push((cache.ctrl.cycle(), err)),
            Err(SimError::Halted(_)) => break,
        }
    }

    assert_eq!(deadlocks.len(), 1);
    let (cycle, err) = &deadlocks[0];
    assert_eq!(*cycle, 12);
    assert_eq!(
        *err,
        SimError::Deadlock {
            component: "l2".to_string(),
            addr: 0x1000,
            waited: 11,
            max_wait: 10,
        }
    );
    assert!(cache.ctrl.is_halted());
    assert_eq!(cache.tick(), Err(SimError::Halted("l2".to_string())));
}

#[test]
fn resolved_transactions_do_not_fire() {
    let mut cfg = config(4096, 4);
    cfg.max_request_delay = 10;
    let mut cache = TestCache::new(&cfg);

    for i in 0..20 {
        let _ = cache.request(Command::GetS, 0x1000 + i * 0x40);
        cache.run(5);
        let _ = cache.respond();
        cache.run(1);
    }
    assert!(!cache.ctrl.is_halted());
    assert!(cache.ctrl.mshr().is_empty());
}

/// With a bound of 4 the watchdog checks every cycle. The miss is admitted at
/// cycle 1 and the fill is handled `fill_age` cycles later. The check runs after
/// the cycle's events, so an entry closed at any age up to the bound never fires
/// and one still open at age 5 fires exactly once.
#[rstest]
#[case::closed_below_the_bound(3, None)]
#[case::closed_at_the_bound(4, None)]
#[case::open_past_the_bound(6, Some((6, 5)))]
fn deadlock_fires_only_for_entries_open_past_the_bound(
    #[case] fill_age: u64,
    #[case] expected: Option<(u64, u64)>,
) {
    let mut cfg = config(4096, 4);
    cfg.max_request_delay = 4;
    let mut cache = TestCache::new(&cfg);
    let _ = cache.request(Command::GetS, 0x1000);

    let mut deadlocks = Vec::new();
    for _ in 0..fill_age + 4 {
        if cache.ctrl.cycle() == fill_age {
            let _ = cache.respond();
        }
        match cache.tick() {
            Ok(()) | Err(SimError::Halted(_)) => {}
            Err(SimError::Deadlock { addr, waited, max_wait, .. }) => {
                assert_eq!((addr, max_wait), (0x1000, 4));
                deadlocks.push((cache.ctrl.cycle(), waited));
            }
        }
    }

    assert_eq!(deadlocks, expected.into_iter().collect::<Vec<_>>());
    assert_eq!(cache.ctrl.is_halted(), expected.is_some());
    if expected.is_none() {
        assert!(cache.ctrl.mshr().is_empty());
    }
}
