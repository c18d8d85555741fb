//! Set-index hash functions.
//!
//! A hash function maps a region-relative line address to a value whose remainder
//! modulo the set count selects the set. Hashing spreads strided access patterns
//! across sets that would otherwise collide.

use crate::config::HashFunction;

/// A set-index hash over line addresses.
pub trait SetIndexHash {
    /// Hashes a line address.
    fn hash(&self, line: u64) -> u64;
}

/// Returns the line address unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityHash;

impl SetIndexHash for IdentityHash {
    #[inline]
    fn hash(&self, line: u64) -> u64 {
        line
    }
}

/// Linear congruential hash, `1103515245 * x + 12345` (wrapping).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearHash;

impl LinearHash {
    const MULTIPLIER: u64 = 1_103_515_245;
    const INCREMENT: u64 = 12_345;
}

impl SetIndexHash for LinearHash {
    #[inline]
    fn hash(&self, line: u64) -> u64 {
        line.wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }
}

/// XOR-folds bytes 1 through 7 into byte 0, leaving the upper bytes intact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XorHash;

impl SetIndexHash for XorHash {
    fn hash(&self, line: u64) -> u64 {
        let bytes = line.to_le_bytes();
        let folded = bytes[1..].iter().fold(bytes[0], |acc, b| acc ^ b);
        (line & !0xff) | u64::from(folded)
    }
}

/// A hash function selected at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetHash {
    /// Identity.
    Identity(IdentityHash),
    /// Linear congruential.
    Linear(LinearHash),
    /// Byte XOR fold.
    Xor(XorHash),
}

impl SetHash {
    /// Builds the hash named by `kind`.
    pub const fn new(kind: HashFunction) -> Self {
        match kind {
            HashFunction::Identity => Self::Identity(IdentityHash),
            HashFunction::Linear => Self::Linear(LinearHash),
            HashFunction::Xor => Self::Xor(XorHash),
        }
    }
}

impl Default for SetHash {
    fn default() -> Self {
        Self::Identity(IdentityHash)
    }
}

impl SetIndexHash for SetHash {
    #[inline]
    fn hash(&self, line: u64) -> u64 {
        match self {
            Self::Identity(h) => h.hash(line),
            Self::Linear(h) => h.hash(line),
            Self::Xor(h) => h.hash(line),
        }
    }
}
