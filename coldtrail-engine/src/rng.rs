//! Deterministic random stream backing the Monte Carlo sampler.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Seeded uniform stream threaded through one evaluation.
///
/// ChaCha20 produces the same sequence for the same seed on every platform,
/// which is what makes evaluation results reproducible bit for bit. The
/// stream counts its draws so tests can pin the exact consumption order
/// across the three simulated actions.
#[derive(Debug, Clone)]
pub struct SampleStream {
    rng: ChaCha20Rng,
    draws: u64,
}

impl SampleStream {
    /// Construct a stream from a user-visible seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RngCore for SampleStream {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}
