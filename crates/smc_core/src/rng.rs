// crates/smc_core/src/rng.rs
//
// Seeded RNG (ChaCha20, no OS entropy). Drives ranking generation and the
// solver harness's temp-file suffixes; a fixed seed reproduces both.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Newtype over ChaCha20Rng.
pub struct SeededRng(ChaCha20Rng);

/// Create an RNG from an integer seed.
pub fn rng_from_seed(seed: u64) -> SeededRng {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    SeededRng(ChaCha20Rng::from_seed(bytes))
}

impl SeededRng {
    /// Uniform draw in `0..n` using rejection sampling to avoid modulo bias.
    /// `n` must be nonzero.
    pub fn below(&mut self, n: u64) -> u64 {
        debug_assert!(n > 0);
        let zone = u64::MAX - (u64::MAX % n);
        loop {
            let x = self.0.next_u64();
            if x < zone {
                return x % n;
            }
        }
    }

    /// Uniform draw in `[0, 1)` with 53 bits of precision.
    pub fn unit(&mut self) -> f64 {
        (self.0.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Fair coin.
    pub fn flip(&mut self) -> bool {
        self.0.next_u64() & 1 == 1
    }

    /// Gaussian draw via Box–Muller.
    pub fn gaussian(&mut self, mean: f64, sd: f64) -> f64 {
        // unit() can return exactly 0; nudge into (0, 1] for the log.
        let u1 = 1.0 - self.unit();
        let u2 = self.unit();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + sd * z
    }
}
