//! Set-Index Hash Tests.
//!
//! Verifies the identity, linear and XOR hash functions and their effect on set
//! selection in a tag array.

use memhier_core::{
    cache::{
        TagArray,
        hash::{IdentityHash, LinearHash, SetHash, SetIndexHash, XorHash},
    },
    config::{HashFunction, ReplacementPolicy},
};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn identity_returns_input() {
    assert_eq!(IdentityHash.hash(0), 0);
    assert_eq!(IdentityHash.hash(0xdead_beef), 0xdead_beef);
}

#[test]
fn linear_is_affine_and_wrapping() {
    assert_eq!(LinearHash.hash(0), 12345);
    assert_eq!(LinearHash.hash(1), 1_103_515_245 + 12345);
    let big = u64::MAX;
    assert_eq!(
        LinearHash.hash(big),
        big.wrapping_mul(1_103_515_245).wrapping_add(12345)
    );
}

/// Bytes 1..7 are folded into byte 0; the upper bytes are untouched.
#[test]
fn xor_folds_into_low_byte() {
    assert_eq!(XorHash.hash(0x0102), 0x0103);
    assert_eq!(XorHash.hash(0xff), 0xff);
    assert_eq!(XorHash.hash(0x0100_0000_0000_0000), 0x0100_0000_0000_0001);
}

#[rstest]
#[case(0, HashFunction::Identity)]
#[case(1, HashFunction::Linear)]
#[case(2, HashFunction::Xor)]
#[case(7, HashFunction::Identity)]
#[case(-1, HashFunction::Identity)]
fn hash_function_from_id(#[case] id: i64, #[case] expected: HashFunction) {
    assert_eq!(HashFunction::from_id(id), expected);
}

#[test]
fn set_hash_dispatches() {
    assert_eq!(SetHash::new(HashFunction::Identity).hash(42), 42);
    assert_eq!(SetHash::new(HashFunction::Linear).hash(0), 12345);
    assert_eq!(SetHash::new(HashFunction::Xor).hash(0x0102), 0x0103);
    assert_eq!(SetHash::default(), SetHash::new(HashFunction::Identity));
}

/// With the identity hash lines a set-count apart collide; the XOR hash moves the
/// line at `sets * 256` into a different set.
#[test]
fn hash_changes_set_selection() {
    let line = 64;
    let sets = 16_u64;
    let plain = TagArray::new(
        "associativity",
        sets,
        1,
        line,
        ReplacementPolicy::Lru,
        HashFunction::Identity,
    )
    .unwrap();
    let xor = TagArray::new(
        "associativity",
        sets,
        1,
        line,
        ReplacementPolicy::Lru,
        HashFunction::Xor,
    )
    .unwrap();

    let a = 0;
    let b = 256 * line;
    assert_eq!(plain.set_index(a), plain.set_index(b));
    assert_eq!(xor.set_index(a), 0);
    assert_eq!(xor.set_index(b), 1);
}
