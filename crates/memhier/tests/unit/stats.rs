//! Statistics Tests.

use memhier_core::{
    common::Command,
    stats::{Accumulator, ArrivalSplit, CacheStats},
};
use pretty_assertions::assert_eq;

#[test]
fn accumulator_tracks_min_max_and_mean() {
    let mut acc = Accumulator::default();
    assert!(acc.mean().abs() < f64::EPSILON);

    for value in [4, 1, 7] {
        acc.add(value);
    }
    assert_eq!((acc.samples, acc.sum, acc.min, acc.max), (3, 12, 1, 7));
    assert!((acc.mean() - 4.0).abs() < f64::EPSILON);
}

#[test]
fn first_sample_sets_minimum() {
    let mut acc = Accumulator::default();
    acc.add(5);
    assert_eq!((acc.min, acc.max), (5, 5));
    acc.add(0);
    assert_eq!(acc.min, 0);
}

#[test]
fn receive_counts_per_command() {
    let mut stats = CacheStats::default();
    stats.record_receive(Command::GetS);
    stats.record_receive(Command::GetS);
    stats.record_receive(Command::Inv);

    assert_eq!(stats.received(Command::GetS), 2);
    assert_eq!(stats.received(Command::Inv), 1);
    assert_eq!(stats.received(Command::PutM), 0);
    assert_eq!(stats.total_events_received, 3);
}

#[test]
fn split_by_arrival() {
    let mut split = ArrivalSplit::default();
    split.record(Command::GetS, false);
    split.record(Command::GetX, true);
    split.record(Command::GetSX, true);
    split.record(Command::PutS, false);

    assert_eq!(split.arrival.get_s, 1);
    assert_eq!((split.blocked.get_x, split.blocked.get_sx), (1, 1));
    assert_eq!(split.total(), 3);
}

#[test]
fn hit_rate_in_percent() {
    let mut stats = CacheStats::default();
    assert!(stats.hit_rate().abs() < f64::EPSILON);

    stats.hits.record(Command::GetS, false);
    stats.hits.record(Command::GetS, true);
    stats.hits.record(Command::GetX, false);
    stats.misses.record(Command::GetS, false);
    assert_eq!((stats.cache_hits(), stats.cache_misses()), (3, 1));
    assert!((stats.hit_rate() - 75.0).abs() < 1e-9);
}

#[test]
fn report_serializes_counters() {
    let mut stats = CacheStats::default();
    stats.record_receive(Command::GetX);
    stats.bank_conflicts = 2;
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["events_received"]["GetX"], 1);
    assert_eq!(json["bank_conflicts"], 2);
    assert_eq!(json["hits"]["arrival"]["get_s"], 0);
}
