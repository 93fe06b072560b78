// ============================================================
// Layer 6 - Seeding Service
// ============================================================
// Called exactly once per run, after the result directory is
// set up and before any data is read or any model is built.
//
// Two kinds of randomness are seeded:
//   - the toolkit's own sources (tensor backend RNG, which
//     drives weight initialisation and dropout)
//   - a root StdRng from which every general-purpose stream
//     (e.g. evidence sampling in a data processor) is forked
//
// Forking consumes the root in call order, so the same seed
// and the same sequence of pipeline builds always hand out the
// same streams.

use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::domain::traits::Toolkit;

pub struct RunRng {
    root: StdRng,
}

impl RunRng {
    pub fn new(seed: u64) -> Self {
        Self { root: StdRng::seed_from_u64(seed) }
    }

    /// Independent stream for one downstream consumer.
    pub fn fork(&mut self) -> StdRng {
        StdRng::seed_from_u64(self.root.next_u64())
    }
}

/// Seed the toolkit and return the root of the general-purpose streams.
pub fn set_seed<K: Toolkit>(seed: u64, toolkit: &mut K) -> RunRng {
    toolkit.reseed(seed);
    tracing::info!("Random sources seeded with {}", seed);
    RunRng::new(seed)
}
