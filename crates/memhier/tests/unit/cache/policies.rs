//! Cache Replacement Policy Tests.
//!
//! Verifies victim selection for the LRU, LFU, Random, MRU and NMRU policies.
//! Each policy implements `ReplacementPolicy` with `touch(set, way)`,
//! `select_victim(set)` and `reset_way(set, way)`; tests exercise them in isolation.

use memhier_core::{
    cache::policies::{
        LfuPolicy, LruPolicy, MruPolicy, NmruPolicy, RandomPolicy, Replacement, ReplacementPolicy,
    },
    config::ReplacementPolicy as PolicyType,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

// ══════════════════════════════════════════════════════════
// 1. LRU Policy
// ══════════════════════════════════════════════════════════

/// With no accesses the stack is [0, 1, 2, 3]; way 3 is at the bottom.
#[test]
fn lru_initial_victim_is_last_way() {
    let mut policy = LruPolicy::new(1, 4);
    assert_eq!(policy.select_victim(0), 3);
}

#[test]
fn lru_evicts_least_recent_after_reaccess() {
    let mut policy = LruPolicy::new(1, 4);
    for way in 0..4 {
        policy.touch(0, way);
    }
    assert_eq!(policy.select_victim(0), 0);

    policy.touch(0, 0);
    assert_eq!(policy.select_victim(0), 1);
    policy.touch(0, 1);
    assert_eq!(policy.select_victim(0), 2);
}

/// Sets keep independent stacks.
#[test]
fn lru_sets_are_independent() {
    let mut policy = LruPolicy::new(2, 2);
    policy.touch(0, 0);
    policy.touch(0, 1);
    policy.touch(1, 1);
    policy.touch(1, 0);
    assert_eq!(policy.select_victim(0), 0);
    assert_eq!(policy.select_victim(1), 1);
}

// ══════════════════════════════════════════════════════════
// 2. LFU Policy
// ══════════════════════════════════════════════════════════

#[test]
fn lfu_evicts_least_frequent() {
    let mut policy = LfuPolicy::new(1, 3);
    for _ in 0..3 {
        policy.touch(0, 0);
    }
    policy.touch(0, 1);
    policy.touch(0, 1);
    policy.touch(0, 2);
    assert_eq!(policy.select_victim(0), 2);
    assert_eq!(policy.count(0, 0), 3);
}

/// Equal counts fall back to recency: the way touched longest ago goes.
#[test]
fn lfu_ties_broken_by_recency() {
    let mut policy = LfuPolicy::new(1, 4);
    policy.touch(0, 3);
    policy.touch(0, 1);
    policy.touch(0, 0);
    policy.touch(0, 2);
    assert_eq!(policy.select_victim(0), 3);
}

/// A freshly installed line starts with no usage history.
#[test]
fn lfu_reset_way_forgets_history() {
    let mut policy = LfuPolicy::new(1, 2);
    for _ in 0..5 {
        policy.touch(0, 0);
    }
    policy.touch(0, 1);
    assert_eq!(policy.select_victim(0), 1);

    policy.reset_way(0, 0);
    assert_eq!(policy.count(0, 0), 0);
    assert_eq!(policy.select_victim(0), 0);
}

// ══════════════════════════════════════════════════════════
// 3. MRU Policy
// ══════════════════════════════════════════════════════════

#[test]
fn mru_evicts_most_recent() {
    let mut policy = MruPolicy::new(1, 4);
    assert_eq!(policy.select_victim(0), 0);
    policy.touch(0, 2);
    assert_eq!(policy.select_victim(0), 2);
    policy.touch(0, 1);
    assert_eq!(policy.select_victim(0), 1);
}

// ══════════════════════════════════════════════════════════
// 4. NMRU Policy
// ══════════════════════════════════════════════════════════

#[test]
fn nmru_never_evicts_the_mru_way() {
    let mut policy = NmruPolicy::new(1, 4);
    policy.touch(0, 0);
    let victims: Vec<usize> = (0..4).map(|_| policy.select_victim(0)).collect();
    assert_eq!(victims, vec![1, 2, 3, 1]);
}

#[test]
fn nmru_follows_the_latest_touch() {
    let mut policy = NmruPolicy::new(1, 2);
    policy.touch(0, 0);
    assert_eq!(policy.select_victim(0), 1);
    policy.touch(0, 1);
    assert_eq!(policy.select_victim(0), 0);
}

#[test]
fn nmru_direct_mapped_always_way_zero() {
    let mut policy = NmruPolicy::new(4, 1);
    policy.touch(2, 0);
    assert_eq!(policy.select_victim(2), 0);
}

// ══════════════════════════════════════════════════════════
// 5. Random Policy
// ══════════════════════════════════════════════════════════

#[test]
fn random_victims_in_range() {
    let mut policy = RandomPolicy::new(1, 8);
    for _ in 0..1000 {
        assert!(policy.select_victim(0) < 8);
    }
}

/// The generator is seeded, so two instances agree.
#[test]
fn random_is_reproducible() {
    let mut a = RandomPolicy::new(1, 16);
    let mut b = RandomPolicy::new(1, 16);
    let seq_a: Vec<usize> = (0..32).map(|_| a.select_victim(0)).collect();
    let seq_b: Vec<usize> = (0..32).map(|_| b.select_victim(0)).collect();
    assert_eq!(seq_a, seq_b);
}

// ══════════════════════════════════════════════════════════
// 6. Dispatch
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(PolicyType::Lru)]
#[case(PolicyType::Lfu)]
#[case(PolicyType::Random)]
#[case(PolicyType::Mru)]
#[case(PolicyType::Nmru)]
fn replacement_builds_requested_policy(#[case] kind: PolicyType) {
    let mut policy = Replacement::new(kind, 4, 4);
    assert_eq!(policy.kind(), kind);
    policy.touch(3, 1);
    assert!(policy.select_victim(3) < 4);
}
