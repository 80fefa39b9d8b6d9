//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through the two SimRng streams stored on the
//! GameState, each derived from the single master seed.
//!
//! Each stream is seeded from (master_seed XOR slot_index * golden), so:
//!   - Consuming the event stream never moves the weather stream.
//!   - Each stream is fully reproducible in isolation.
//!
//! The persisted form of a stream is its derived seed plus the number of
//! draws taken. Restoring re-seeds the generator and jumps ahead, so a
//! resumed game continues on exactly the same sequence.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

/// Persisted position of a stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RngState {
    pub seed:  u64,
    pub draws: u64,
}

/// A named, deterministic RNG stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RngState", into = "RngState")]
pub struct SimRng {
    seed:  u64,
    draws: u64,
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Create a stream from the master seed and a stable slot.
    /// The slot index must never change once assigned.
    pub fn new(master_seed: u64, slot: RngSlot) -> Self {
        let derived_seed = master_seed ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self::from_state(RngState { seed: derived_seed, draws: 0 })
    }

    pub fn from_state(state: RngState) -> Self {
        let mut inner = Pcg64Mcg::seed_from_u64(state.seed);
        inner.advance(u128::from(state.draws));
        Self {
            seed: state.seed,
            draws: state.draws,
            inner,
        }
    }

    pub fn state(&self) -> RngState {
        RngState { seed: self.seed, draws: self.draws }
    }

    pub fn set_state(&mut self, state: RngState) {
        *self = Self::from_state(state);
    }

    fn next_raw(&mut self) -> u64 {
        self.draws += 1;
        self.inner.next_u64()
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.next_raw();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll an integer in [min, max], inclusive on both ends.
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "next_int: min {min} > max {max}");
        let span = (max - min) as u64 + 1;
        min + (self.next_raw() % span) as i64
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

impl From<RngState> for SimRng {
    fn from(state: RngState) -> Self {
        Self::from_state(state)
    }
}

impl From<SimRng> for RngState {
    fn from(rng: SimRng) -> Self {
        rng.state()
    }
}

impl PartialEq for SimRng {
    fn eq(&self, other: &Self) -> bool {
        self.state() == other.state()
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries; only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    Weather = 0,
    Event   = 1,
}
