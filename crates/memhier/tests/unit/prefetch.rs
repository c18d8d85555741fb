//! Next-Line Prefetcher Tests.

use memhier_core::{
    common::Command,
    prefetch::{AccessNotice, CacheListener, NextLinePrefetcher, PrefetchRequest},
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn notice(cmd: Command, addr: u64, hit: bool) -> AccessNotice {
    AccessNotice {
        addr,
        base_addr: addr & !63,
        cmd,
        hit,
        prefetch: false,
        cycle: 1,
    }
}

#[rstest]
#[case(Command::GetS, 0x1000, 0x1040)]
#[case(Command::GetX, 0x1008, 0x1040)]
#[case(Command::GetSX, 0x107f, 0x1080)]
fn miss_requests_following_line(#[case] cmd: Command, #[case] addr: u64, #[case] next: u64) {
    let mut prefetcher = NextLinePrefetcher::new(64);
    assert_eq!(
        prefetcher.notify(&notice(cmd, addr, false)),
        Some(PrefetchRequest {
            addr: next,
            cmd: Command::GetS,
        })
    );
}

#[test]
fn hits_only_trigger_when_enabled() {
    let mut quiet = NextLinePrefetcher::new(64);
    assert_eq!(quiet.notify(&notice(Command::GetS, 0x2000, true)), None);

    let mut eager = NextLinePrefetcher::new(64).on_hits();
    assert_eq!(
        eager.notify(&notice(Command::GetS, 0x2000, true)).map(|r| r.addr),
        Some(0x2040)
    );
}

#[test]
fn prefetches_and_non_demand_traffic_ignored() {
    let mut prefetcher = NextLinePrefetcher::new(64).on_hits();
    let mut from_prefetch = notice(Command::GetS, 0x3000, false);
    from_prefetch.prefetch = true;
    assert_eq!(prefetcher.notify(&from_prefetch), None);
    assert_eq!(prefetcher.notify(&notice(Command::PutM, 0x3000, false)), None);
    assert_eq!(prefetcher.notify(&notice(Command::GetSResp, 0x3000, true)), None);
}

#[test]
fn last_line_has_no_successor() {
    let mut prefetcher = NextLinePrefetcher::new(64);
    assert_eq!(prefetcher.notify(&notice(Command::GetS, u64::MAX - 10, false)), None);
}

#[test]
fn respects_line_size() {
    let mut prefetcher = NextLinePrefetcher::new(128);
    assert_eq!(
        prefetcher.notify(&notice(Command::GetS, 0x1040, false)).map(|r| r.addr),
        Some(0x1080)
    );
}
