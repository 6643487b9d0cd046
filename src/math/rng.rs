//! Standard-normal draw sources for the simulation workers.
//!
//! Each simulation worker owns one generator; there is no shared RNG state
//! and no synchronisation inside the generation loop. Streams derive from a
//! caller-supplied base seed for reproducible runs, or from OS entropy when
//! no seed is configured.

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rand_pcg::Pcg64Mcg;

/// Capability producing independent draws from N(0, 1).
///
/// One logical instance per worker; implementations own their generator
/// state outright.
pub trait NormalSource: Send {
    /// Next independent standard-normal draw.
    fn next_normal(&mut self) -> f64;
}

/// PCG64-backed normal source (the `pcg64_fast` output family), sampled
/// through the ziggurat in [`rand_distr::StandardNormal`].
#[derive(Debug, Clone)]
pub struct PcgNormal {
    rng: Pcg64Mcg,
}

impl PcgNormal {
    /// Deterministic construction from a 64-bit seed.
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Seeds from OS entropy.
    pub fn from_entropy() -> Self {
        Self::seed_from_u64(rand::rng().random::<u64>())
    }
}

impl NormalSource for PcgNormal {
    #[inline]
    fn next_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.rng)
    }
}

/// Derives a per-stream seed from a base seed and a stream index.
///
/// Weyl-sequence increment keeps neighbouring streams far apart in state
/// space.
#[inline]
pub fn stream_seed(base_seed: u64, stream_index: usize) -> u64 {
    base_seed.wrapping_add((stream_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Resolves the seed for one worker stream: deterministic sub-seeding when a
/// base seed is configured, OS entropy otherwise.
#[inline]
pub fn resolve_stream_seed(base_seed: Option<u64>, stream_index: usize) -> u64 {
    match base_seed {
        Some(seed) => stream_seed(seed, stream_index),
        None => rand::rng().random::<u64>(),
    }
}
