//! Zobrist-style tour hashing and the open-addressed table of visited tours.
//!
//! `Hash = XOR over tour edges (u,v) of Rand[u] * Rand[v]` (wrapping
//! multiplication over `u64`), so adding and then removing the same edge
//! leaves the hash unchanged and a single `flip_at` only touches the O(1)
//! edges it actually changed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Scalar;

/// Per-node random words used to build the Zobrist hash. Drawn once per run
/// from `Seed` and held for the run's lifetime.
#[derive(Debug)]
pub struct ZobristTable {
    rand: Vec<u64>,
}

impl ZobristTable {
    pub fn new(n: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rand = (0..n).map(|_| rng.gen::<u64>()).collect();
        Self { rand }
    }

    pub fn edge_word(&self, u: usize, v: usize) -> u64 {
        self.rand[u].wrapping_mul(self.rand[v])
    }

    /// Hashes a whole tour from its successor function.
    pub fn hash_tour(&self, n: usize, successor: impl Fn(usize) -> usize) -> u64 {
        (0..n).fold(0u64, |acc, id| acc ^ self.edge_word(id, successor(id)))
    }
}

/// One entry in the visited-tours table: the tour's Zobrist hash and its cost.
#[derive(Debug, Clone, Copy)]
struct Entry {
    hash: u64,
    cost: Scalar,
}

/// Fixed-size, linear-probed hash table mapping tour hash -> tour cost, used
/// to skip tours already explored this run (or a prior run with the same seed).
///
/// Eviction policy is "don't insert when full" - a miss under a full table
/// just costs re-exploring a tour, it is never incorrect.
#[derive(Debug)]
pub struct HashTable {
    slots: Vec<Option<Entry>>,
    precision: Scalar,
    len: usize,
}

impl HashTable {
    pub fn new(capacity: usize, precision: Scalar) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            precision,
            len: 0,
        }
    }

    fn slot_for(&self, hash: u64) -> usize {
        (hash as usize) % self.slots.len()
    }

    /// `true` iff some entry has this exact hash and a cost within `Precision`.
    pub fn search(&self, hash: u64, cost: Scalar) -> bool {
        let start = self.slot_for(hash);
        let cap = self.slots.len();
        for step in 0..cap {
            let i = (start + step) % cap;
            match self.slots[i] {
                None => return false,
                Some(e) if e.hash == hash && (e.cost - cost).abs() <= self.precision => {
                    return true
                }
                Some(_) => continue,
            }
        }
        false
    }

    /// Inserts `(hash, cost)` at the first empty slot on the probe sequence.
    /// Silently does nothing if the table is full.
    pub fn insert(&mut self, hash: u64, cost: Scalar) {
        if self.len >= self.slots.len() {
            return;
        }
        let start = self.slot_for(hash);
        let cap = self.slots.len();
        for step in 0..cap {
            let i = (start + step) % cap;
            if self.slots[i].is_none() {
                self.slots[i] = Some(Entry { hash, cost });
                self.len += 1;
                return;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
